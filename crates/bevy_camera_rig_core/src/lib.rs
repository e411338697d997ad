//! Core of `bevy_camera_rig`: camera node evaluator trees, arena storage and blend stacks.
//!
//! Camera rigs are declarative trees of [camera nodes](camera_node::CameraNode). Running a rig
//! builds one [evaluator](evaluator::CameraNodeEvaluator) per node into an
//! [arena](storage::CameraNodeEvaluatorStorage), sized up front from a dry run of the same build.
//! Rigs are layered on a [blend stack](blend_stack::CameraBlendStack), where each entry blends
//! into the entries below it until it fully replaces them.

pub mod blend;
pub mod blend_stack;
pub mod camera_node;
pub mod camera_rig;
pub mod context;
pub mod curves;
pub mod errors;
pub mod evaluation;
pub mod evaluator;
pub mod interpolation;
pub mod plugin;
pub mod pose;
pub mod settings;
pub mod storage;
pub mod type_registry;
pub mod variable_table;

pub mod prelude {
    pub use super::blend::{
        BlendCameraNodeEvaluator, CameraNodeBlendInterruptionParams, CameraNodeBlendParams,
        CameraNodeBlendResult, CameraNodePreBlendParams, CameraNodePreBlendResult,
        SimpleBlendState,
    };
    pub use super::blend_stack::{BlendStackPush, CameraBlendStack, CameraRigPushParams};
    pub use super::camera_node::{CameraNode, CameraNodeRef};
    pub use super::camera_rig::{CameraRigAsset, parameters::CameraRigParameters};
    pub use super::context::{
        CameraEvaluationContext, CameraEvaluationContextHandle, CameraEvaluationContexts,
    };
    pub use super::curves::{BlendCurve, CurveKey, KeyframeCurve};
    pub use super::errors::{CameraRigError, CameraRigResult};
    pub use super::evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult};
    pub use super::evaluator::{
        CameraNodeEvaluator, CameraNodeEvaluatorFlags, CameraNodeEvaluatorInitializeParams,
        EvaluatorHandle, builder::CameraNodeEvaluatorBuilder, tree::CameraNodeEvaluatorTree,
    };
    pub use super::interpolation::linear::InterpolateLinear;
    pub use super::plugin::CameraRigCorePlugin;
    pub use super::pose::{CameraPose, CameraPoseFlags, CameraProjectionMode};
    pub use super::settings::CameraRigSettings;
    pub use super::storage::{
        CameraNodeEvaluatorAllocationInfo, CameraNodeEvaluatorStorage,
        CameraNodeEvaluatorTreeBuildParams,
    };
    pub use super::type_registry::CameraObjectTypeRegistry;
    pub use super::variable_table::{CameraVariableId, CameraVariableTable, CameraVariableValue};
}
