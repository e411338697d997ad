//! Process-wide registry of camera object types.
//!
//! Evaluator types are registered lazily the first time the builder constructs one, and record
//! the size and alignment needed to place them in an arena page. Camera node types are registered
//! explicitly under a stable name, so that rig assets can refer to them by name.

use std::{
    alloc::Layout,
    any::{TypeId, type_name},
    sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use bevy::{log::trace, platform::collections::HashMap};
use ron::value::RawValue;
use serde::de::DeserializeOwned;

use crate::{
    camera_node::{CameraNode, CameraNodeRef},
    errors::{CameraRigError, CameraRigResult},
    evaluator::CameraNodeEvaluator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraObjectTypeId(u32);

impl CameraObjectTypeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Metadata needed to place and destroy an evaluator of a given type.
#[derive(Debug, Clone)]
pub struct CameraObjectTypeInfo {
    pub type_name: &'static str,
    pub sizeof: usize,
    pub alignof: usize,
}

pub type CameraNodeDeserializeFn =
    fn(&RawValue) -> Result<CameraNodeRef, ron::error::SpannedError>;

#[derive(Default)]
pub struct CameraObjectTypeRegistry {
    types: Vec<CameraObjectTypeInfo>,
    ids_by_rust_type: HashMap<TypeId, CameraObjectTypeId>,
    node_deserializers: HashMap<String, CameraNodeDeserializeFn>,
}

static REGISTRY: LazyLock<RwLock<CameraObjectTypeRegistry>> = LazyLock::new(Default::default);

impl CameraObjectTypeRegistry {
    pub fn read() -> RwLockReadGuard<'static, Self> {
        REGISTRY.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write() -> RwLockWriteGuard<'static, Self> {
        REGISTRY.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the type ID of evaluator type `T`, registering it if needed.
    pub fn register_evaluator<T: CameraNodeEvaluator>() -> CameraObjectTypeId {
        if let Some(id) = Self::read().type_id_of::<T>() {
            return id;
        }

        let mut registry = Self::write();
        // Someone may have registered it between the two locks.
        if let Some(id) = registry.type_id_of::<T>() {
            return id;
        }

        let layout = Layout::new::<T>();
        let id = CameraObjectTypeId(registry.types.len() as u32);
        registry.types.push(CameraObjectTypeInfo {
            type_name: type_name::<T>(),
            sizeof: layout.size(),
            alignof: layout.align(),
        });
        registry.ids_by_rust_type.insert(TypeId::of::<T>(), id);
        trace!(
            "Registered camera evaluator type {} ({} bytes, align {})",
            type_name::<T>(),
            layout.size(),
            layout.align()
        );
        id
    }

    pub fn type_id_of<T: 'static>(&self) -> Option<CameraObjectTypeId> {
        self.ids_by_rust_type.get(&TypeId::of::<T>()).copied()
    }

    pub fn type_info(&self, id: CameraObjectTypeId) -> Option<&CameraObjectTypeInfo> {
        self.types.get(id.index())
    }

    pub fn try_type_info(&self, id: CameraObjectTypeId) -> CameraRigResult<&CameraObjectTypeInfo> {
        self.type_info(id).ok_or(CameraRigError::MissingTypeInfo(id))
    }

    /// Makes camera node type `T` loadable from rig assets under `name`.
    pub fn register_camera_node<T>(&mut self, name: impl Into<String>)
    where
        T: CameraNode + DeserializeOwned,
    {
        self.node_deserializers
            .insert(name.into(), deserialize_camera_node::<T>);
    }

    pub fn node_deserializer(&self, name: &str) -> CameraRigResult<CameraNodeDeserializeFn> {
        self.node_deserializers
            .get(name)
            .copied()
            .ok_or_else(|| CameraRigError::UnknownNodeType(name.to_string()))
    }
}

fn deserialize_camera_node<T>(raw: &RawValue) -> Result<CameraNodeRef, ron::error::SpannedError>
where
    T: CameraNode + DeserializeOwned,
{
    raw.into_rust::<T>().map(CameraNodeRef::new)
}
