use bevy::log::warn;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::variable_table::{CameraVariableId, CameraVariableTable, CameraVariableValue};

/// Named variables a camera rig exposes, with their default values.
///
/// Every frame, parameters missing from the evaluation context's variables are added to the
/// rig's variable table before its nodes run. A variable set on the context takes precedence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraRigParameters {
    values: IndexMap<String, CameraVariableValue>,
}

impl CameraRigParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<CameraVariableValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<CameraVariableValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<CameraVariableValue> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CameraVariableValue)> + '_ {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of these parameters with some values replaced.
    ///
    /// Overrides must name a declared parameter and keep its type, others are ignored with a
    /// warning.
    pub fn with_overrides(&self, overrides: &CameraRigParameters) -> Self {
        let mut parameters = self.clone();
        for (name, value) in overrides.iter() {
            match parameters.values.get_mut(name) {
                Some(current) if current.type_name() == value.type_name() => *current = value,
                Some(current) => warn!(
                    "Camera rig parameter {name} is a {}, ignoring {} override",
                    current.type_name(),
                    value.type_name()
                ),
                None => warn!("Camera rig has no parameter {name}, ignoring override"),
            }
        }
        parameters
    }

    /// Sets every parameter the table doesn't already have.
    pub fn apply_defaults(&self, table: &mut CameraVariableTable) {
        for (name, value) in self.iter() {
            let id = CameraVariableId::from_name(name);
            if !table.contains(id) {
                table.set(id, value);
            }
        }
    }
}
