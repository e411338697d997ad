//! Camera nodes and blends shipped with `bevy_camera_rig`.
//!
//! Every node here can be referred to by its type name from `*.camrig.ron` files once
//! [`register_builtin_nodes`] has run.

pub mod array_node;
pub mod attach_to_target_node;
pub mod blends;
pub mod clipping_planes_node;
pub mod dampen_position_node;
pub mod field_of_view_node;
pub mod input_accumulator_node;
pub mod lens_node;
pub mod look_at_node;
pub mod offset_node;
pub mod set_variable_node;

use bevy_camera_rig_core::type_registry::CameraObjectTypeRegistry;

use array_node::ArrayCameraNode;
use attach_to_target_node::AttachToTargetCameraNode;
use blends::{
    curve_blend_node::CurveBlendCameraNode, pop_blend_node::PopBlendCameraNode,
    simple_fixed_time_blend_node::SimpleFixedTimeBlendCameraNode,
};
use clipping_planes_node::ClippingPlanesCameraNode;
use dampen_position_node::DampenPositionCameraNode;
use field_of_view_node::FieldOfViewCameraNode;
use input_accumulator_node::InputAccumulator2DCameraNode;
use lens_node::LensCameraNode;
use look_at_node::LookAtCameraNode;
use offset_node::OffsetCameraNode;
use set_variable_node::SetVariableCameraNode;

/// Makes every builtin node loadable by its type name.
pub fn register_builtin_nodes(registry: &mut CameraObjectTypeRegistry) {
    registry.register_camera_node::<ArrayCameraNode>("ArrayCameraNode");
    registry.register_camera_node::<OffsetCameraNode>("OffsetCameraNode");
    registry.register_camera_node::<FieldOfViewCameraNode>("FieldOfViewCameraNode");
    registry.register_camera_node::<ClippingPlanesCameraNode>("ClippingPlanesCameraNode");
    registry.register_camera_node::<LensCameraNode>("LensCameraNode");
    registry.register_camera_node::<AttachToTargetCameraNode>("AttachToTargetCameraNode");
    registry.register_camera_node::<LookAtCameraNode>("LookAtCameraNode");
    registry.register_camera_node::<DampenPositionCameraNode>("DampenPositionCameraNode");
    registry.register_camera_node::<SetVariableCameraNode>("SetVariableCameraNode");
    registry.register_camera_node::<InputAccumulator2DCameraNode>("InputAccumulator2DCameraNode");
    registry.register_camera_node::<PopBlendCameraNode>("PopBlendCameraNode");
    registry.register_camera_node::<SimpleFixedTimeBlendCameraNode>(
        "SimpleFixedTimeBlendCameraNode",
    );
    registry.register_camera_node::<CurveBlendCameraNode>("CurveBlendCameraNode");
}

pub mod prelude {
    pub use super::array_node::ArrayCameraNode;
    pub use super::attach_to_target_node::AttachToTargetCameraNode;
    pub use super::blends::{
        curve_blend_node::CurveBlendCameraNode, pop_blend_node::PopBlendCameraNode,
        simple_fixed_time_blend_node::SimpleFixedTimeBlendCameraNode,
    };
    pub use super::clipping_planes_node::ClippingPlanesCameraNode;
    pub use super::dampen_position_node::DampenPositionCameraNode;
    pub use super::field_of_view_node::FieldOfViewCameraNode;
    pub use super::input_accumulator_node::{InputAccumulator2DCameraNode, InputAxisRange};
    pub use super::lens_node::LensCameraNode;
    pub use super::look_at_node::LookAtCameraNode;
    pub use super::offset_node::{OffsetCameraNode, OffsetSpace};
    pub use super::register_builtin_nodes;
    pub use super::set_variable_node::SetVariableCameraNode;
}

#[cfg(test)]
pub(crate) mod testing {
    use bevy_camera_rig_core::{
        blend::BlendCameraNodeEvaluator,
        camera_node::{CameraNode, CameraNodeRef},
        evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
        evaluator::{EvaluatorHandle, tree::CameraNodeEvaluatorTree},
        storage::{CameraNodeEvaluatorStorage, CameraNodeEvaluatorTreeBuildParams},
    };

    /// A single node's evaluator tree, built into its own storage.
    pub(crate) struct NodeHarness {
        pub storage: CameraNodeEvaluatorStorage,
        pub root: Option<EvaluatorHandle>,
    }

    impl NodeHarness {
        pub fn build(node: impl CameraNode) -> Self {
            let node = CameraNodeRef::new(node);
            let mut storage = CameraNodeEvaluatorStorage::default();
            let root = storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
                root_camera_node: Some(&node),
                allocation_info: None,
            });
            Self { storage, root }
        }

        /// Updates parameters, then runs the tree.
        pub fn run(&self, delta_time: f32, result: &mut CameraNodeEvaluationResult) {
            let tree = CameraNodeEvaluatorTree::new(&self.storage);
            let params = CameraNodeEvaluationParams::new(delta_time);
            tree.update_parameters(self.root, &params, result);
            tree.run(self.root, &params, result);
        }

        pub fn blend(&mut self) -> &mut dyn BlendCameraNodeEvaluator {
            self.root
                .and_then(|root| self.storage.get_mut(root))
                .and_then(|evaluator| evaluator.as_blend_mut())
                .unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::Vec3;
    use bevy_camera_rig_core::{
        camera_node::CameraNodeRef,
        evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
        evaluator::tree::CameraNodeEvaluatorTree,
        storage::{
            CameraNodeEvaluatorAllocationInfo, CameraNodeEvaluatorStorage,
            CameraNodeEvaluatorTreeBuildParams,
        },
    };

    use super::*;

    #[test]
    fn builtin_nodes_load_from_ron() {
        register_builtin_nodes(&mut CameraObjectTypeRegistry::write());

        let root: CameraNodeRef = ron::from_str(
            r#"(
                ty: "ArrayCameraNode",
                inner: (children: [
                    (ty: "SetVariableCameraNode", inner: (variable: "height", value: F32(2.0))),
                    (ty: "OffsetCameraNode", inner: (offset: (0.0, 1.0, 4.0), space: World)),
                    (ty: "FieldOfViewCameraNode", inner: (field_of_view: 70.0)),
                    (ty: "ClippingPlanesCameraNode", inner: (near: Some(0.3))),
                ]),
            )"#,
        )
        .unwrap();
        assert_eq!(root.node_count(), 5);
        assert_eq!(root.display_name(), "☰ Array");

        let allocation_info = CameraNodeEvaluatorAllocationInfo::compute(Some(&root));
        assert!(!allocation_info.is_empty());

        let mut storage = CameraNodeEvaluatorStorage::default();
        let handle = storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
            root_camera_node: Some(&root),
            allocation_info: Some(allocation_info),
        });
        assert_eq!(storage.page_count(), 1);
        assert_eq!(storage.allocation_info(), allocation_info);

        let mut result = CameraNodeEvaluationResult::default();
        CameraNodeEvaluatorTree::new(&storage).run(
            handle,
            &CameraNodeEvaluationParams::default(),
            &mut result,
        );
        assert_eq!(result.camera_pose.location(), Vec3::new(0., 1., 4.));
        assert_eq!(result.camera_pose.field_of_view(), 70.);
        assert_eq!(result.camera_pose.near_clipping_plane(), 0.3);
    }
}
