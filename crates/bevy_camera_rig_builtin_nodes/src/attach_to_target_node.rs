use std::sync::Arc;

use bevy::{log::error, transform::components::Transform};
use bevy_camera_rig_core::{
    camera_node::CameraNode,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, CameraNodeEvaluatorFlags, EvaluatorHandle,
        builder::CameraNodeEvaluatorBuilder, tree::CameraNodeEvaluatorTree,
    },
    variable_table::{CameraVariableId, CameraVariableTable},
};
use serde::Deserialize;

/// Moves the camera onto the target it follows, as exposed by the evaluation context through
/// [`CameraVariableId::TARGET_LOCATION`] and [`CameraVariableId::TARGET_ROTATION`].
///
/// The last known target transform is kept, and used for as long as the target is missing.
#[derive(Clone, Debug, Deserialize)]
pub struct AttachToTargetCameraNode {
    #[serde(default = "default_true")]
    pub attach_location: bool,
    #[serde(default = "default_true")]
    pub attach_rotation: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AttachToTargetCameraNode {
    fn default() -> Self {
        Self {
            attach_location: true,
            attach_rotation: true,
        }
    }
}

#[derive(Debug)]
pub struct AttachToTargetCameraNodeEvaluator {
    node: Arc<AttachToTargetCameraNode>,
    target: Option<Transform>,
    reported_missing_target: bool,
}

impl CameraNode for AttachToTargetCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(AttachToTargetCameraNodeEvaluator {
            node: self,
            target: None,
            reported_missing_target: false,
        })
    }

    fn display_name(&self) -> String {
        "⚓ Attach to target".into()
    }
}

impl AttachToTargetCameraNodeEvaluator {
    fn resolve_target(variables: &CameraVariableTable) -> Option<Transform> {
        let location = variables.get_vec3(CameraVariableId::TARGET_LOCATION).ok()?;
        let rotation = variables
            .get_quat(CameraVariableId::TARGET_ROTATION)
            .unwrap_or_default();
        Some(Transform::from_translation(location).with_rotation(rotation))
    }
}

impl CameraNodeEvaluator for AttachToTargetCameraNodeEvaluator {
    fn flags(&self) -> CameraNodeEvaluatorFlags {
        CameraNodeEvaluatorFlags::NEEDS_PARAMETER_UPDATE
    }

    fn on_update_parameters(
        &mut self,
        _params: &CameraNodeEvaluationParams,
        result: &mut CameraNodeEvaluationResult,
    ) {
        match Self::resolve_target(&result.variable_table) {
            Some(target) => {
                self.target = Some(target);
                self.reported_missing_target = false;
            }
            None if !self.reported_missing_target => {
                error!("Camera target is not set, keeping the last known target transform");
                self.reported_missing_target = true;
            }
            None => {}
        }
    }

    fn on_run(
        &mut self,
        _params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    ) {
        let Some(target) = self.target else {
            result.is_valid = false;
            return;
        };

        if self.node.attach_location {
            result.camera_pose.set_location(target.translation);
        }
        if self.node.attach_rotation {
            result.camera_pose.set_rotation(target.rotation);
        }
    }
}
