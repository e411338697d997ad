use std::sync::Arc;

use bevy_camera_rig_core::{
    camera_node::{CameraNode, CameraNodeRef},
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, EvaluatorHandle, builder::CameraNodeEvaluatorBuilder,
        tree::CameraNodeEvaluatorTree,
    },
};
use serde::Deserialize;

/// Runs its children one after the other, each seeing the result of the previous ones.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ArrayCameraNode {
    #[serde(default)]
    pub children: Vec<CameraNodeRef>,
}

impl ArrayCameraNode {
    pub fn new(children: impl IntoIterator<Item = CameraNodeRef>) -> Self {
        Self {
            children: children.into_iter().collect(),
        }
    }
}

#[derive(Debug)]
pub struct ArrayCameraNodeEvaluator {
    node: Arc<ArrayCameraNode>,
    children: Vec<Option<EvaluatorHandle>>,
}

impl CameraNode for ArrayCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(ArrayCameraNodeEvaluator {
            node: self,
            children: Vec::new(),
        })
    }

    fn children(&self) -> Vec<&CameraNodeRef> {
        self.children.iter().collect()
    }

    fn display_name(&self) -> String {
        "☰ Array".into()
    }
}

impl CameraNodeEvaluator for ArrayCameraNodeEvaluator {
    fn children(&self) -> Vec<Option<EvaluatorHandle>> {
        self.children.clone()
    }

    fn on_build(&mut self, builder: &mut CameraNodeEvaluatorBuilder) {
        let node = Arc::clone(&self.node);
        self.children = node
            .children
            .iter()
            .map(|child| builder.build_evaluator(Some(child)))
            .collect();
    }

    fn on_run(
        &mut self,
        params: &CameraNodeEvaluationParams,
        tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    ) {
        for &child in &self.children {
            tree.run(child, params, result);
        }
    }
}
