//! Evaluation contexts provide the initial state camera rigs are evaluated from, such as the
//! transform of the target a camera follows.
//!
//! Blend stack entries refer to their context by [`CameraEvaluationContextHandle`]. Removing a
//! context invalidates every handle to it, and the entries using it get frozen.

use bevy::transform::components::Transform;

use crate::{
    errors::{CameraRigError, CameraRigResult},
    evaluation::CameraNodeEvaluationResult,
    variable_table::CameraVariableId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraEvaluationContextHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CameraEvaluationContext {
    /// Result every evaluation of a camera rig running in this context starts from
    pub initial_result: CameraNodeEvaluationResult,
}

impl CameraEvaluationContext {
    /// Exposes the target transform through [`CameraVariableId::TARGET_LOCATION`] and
    /// [`CameraVariableId::TARGET_ROTATION`].
    pub fn set_target_transform(&mut self, transform: &Transform) {
        let variables = &mut self.initial_result.variable_table;
        variables.set(
            CameraVariableId::TARGET_LOCATION,
            transform.translation.into(),
        );
        variables.set(CameraVariableId::TARGET_ROTATION, transform.rotation.into());
    }
}

#[derive(Debug, Default)]
struct ContextSlot {
    generation: u32,
    context: Option<CameraEvaluationContext>,
}

/// Generational slot map of evaluation contexts.
#[derive(Debug, Default)]
pub struct CameraEvaluationContexts {
    slots: Vec<ContextSlot>,
    free: Vec<u32>,
}

impl CameraEvaluationContexts {
    pub fn insert(&mut self, context: CameraEvaluationContext) -> CameraEvaluationContextHandle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(ContextSlot::default());
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.context = Some(context);
        CameraEvaluationContextHandle {
            index,
            generation: slot.generation,
        }
    }

    pub fn remove(
        &mut self,
        handle: CameraEvaluationContextHandle,
    ) -> Option<CameraEvaluationContext> {
        let slot = self.slot_mut(handle)?;
        let context = slot.context.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        context
    }

    pub fn get(&self, handle: CameraEvaluationContextHandle) -> Option<&CameraEvaluationContext> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.context.as_ref())
    }

    pub fn get_mut(
        &mut self,
        handle: CameraEvaluationContextHandle,
    ) -> Option<&mut CameraEvaluationContext> {
        self.slot_mut(handle)?.context.as_mut()
    }

    pub fn try_get(
        &self,
        handle: CameraEvaluationContextHandle,
    ) -> CameraRigResult<&CameraEvaluationContext> {
        self.get(handle)
            .ok_or(CameraRigError::MissingEvaluationContext(handle))
    }

    pub fn contains(&self, handle: CameraEvaluationContextHandle) -> bool {
        self.get(handle).is_some()
    }

    fn slot_mut(&mut self, handle: CameraEvaluationContextHandle) -> Option<&mut ContextSlot> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.context.is_some())
    }
}
