use std::sync::Arc;

use bevy::{
    math::{Dir3, Vec3},
    transform::components::Transform,
};
use bevy_camera_rig_core::{
    camera_node::CameraNode,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, EvaluatorHandle, builder::CameraNodeEvaluatorBuilder,
        tree::CameraNodeEvaluatorTree,
    },
    variable_table::CameraVariableId,
};
use serde::Deserialize;

/// Rotates the camera towards a location read from a `Vec3` variable, the followed target by
/// default. Also sets the target distance.
#[derive(Clone, Debug, Deserialize)]
pub struct LookAtCameraNode {
    #[serde(default)]
    pub target_variable: Option<String>,
    #[serde(default = "default_up")]
    pub up: Vec3,
}

fn default_up() -> Vec3 {
    Vec3::Y
}

impl Default for LookAtCameraNode {
    fn default() -> Self {
        Self {
            target_variable: None,
            up: Vec3::Y,
        }
    }
}

#[derive(Debug)]
pub struct LookAtCameraNodeEvaluator {
    target_variable: CameraVariableId,
    up: Dir3,
}

impl CameraNode for LookAtCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(LookAtCameraNodeEvaluator {
            target_variable: self
                .target_variable
                .as_deref()
                .map_or(CameraVariableId::TARGET_LOCATION, CameraVariableId::from_name),
            up: Dir3::new(self.up).unwrap_or(Dir3::Y),
        })
    }

    fn display_name(&self) -> String {
        "👁 Look at".into()
    }
}

impl CameraNodeEvaluator for LookAtCameraNodeEvaluator {
    fn on_run(
        &mut self,
        _params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    ) {
        let Ok(target) = result.variable_table.get_vec3(self.target_variable) else {
            return;
        };

        let pose = &mut result.camera_pose;
        let to_target = target - pose.location();
        let Ok(direction) = Dir3::new(to_target) else {
            return;
        };

        let rotation = Transform::IDENTITY.looking_to(direction, self.up).rotation;
        pose.set_rotation(rotation);
        pose.set_target_distance(to_target.length());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NodeHarness;

    fn look_at(location: Vec3, target: Vec3) -> CameraNodeEvaluationResult {
        let mut result = CameraNodeEvaluationResult::default();
        result.camera_pose.set_location(location);
        result
            .variable_table
            .set(CameraVariableId::TARGET_LOCATION, target.into());
        NodeHarness::build(LookAtCameraNode::default()).run(0.1, &mut result);
        result
    }

    #[test]
    fn aims_at_the_target() {
        let result = look_at(Vec3::new(0., 0., 5.), Vec3::new(4., 0., 5.));
        assert!(result.camera_pose.aim_direction().abs_diff_eq(Vec3::X, 1e-5));
        assert!((result.camera_pose.target_distance() - 4.).abs() < 1e-5);
        assert!(
            result
                .camera_pose
                .target()
                .abs_diff_eq(Vec3::new(4., 0., 5.), 1e-4)
        );
    }

    #[test]
    fn degenerate_targets_leave_the_rotation_alone() {
        let result = look_at(Vec3::ONE, Vec3::ONE);
        assert_eq!(result.camera_pose.rotation(), Default::default());
    }
}
