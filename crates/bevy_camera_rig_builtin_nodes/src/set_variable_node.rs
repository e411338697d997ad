use std::sync::Arc;

use bevy_camera_rig_core::{
    camera_node::CameraNode,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, EvaluatorHandle, builder::CameraNodeEvaluatorBuilder,
        tree::CameraNodeEvaluatorTree,
    },
    variable_table::{CameraVariableId, CameraVariableValue},
};
use serde::Deserialize;

/// Writes a constant into the variable table, for nodes that run after it.
#[derive(Clone, Debug, Deserialize)]
pub struct SetVariableCameraNode {
    pub variable: String,
    pub value: CameraVariableValue,
}

impl SetVariableCameraNode {
    pub fn new(variable: impl Into<String>, value: impl Into<CameraVariableValue>) -> Self {
        Self {
            variable: variable.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug)]
pub struct SetVariableCameraNodeEvaluator {
    id: CameraVariableId,
    value: CameraVariableValue,
}

impl CameraNode for SetVariableCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(SetVariableCameraNodeEvaluator {
            id: CameraVariableId::from_name(&self.variable),
            value: self.value,
        })
    }

    fn display_name(&self) -> String {
        format!("✎ Set {}", self.variable)
    }
}

impl CameraNodeEvaluator for SetVariableCameraNodeEvaluator {
    fn on_run(
        &mut self,
        _params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    ) {
        result.variable_table.set(self.id, self.value);
    }
}
