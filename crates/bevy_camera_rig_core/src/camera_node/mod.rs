mod serial;

use std::{fmt::Debug, ops::Deref, sync::Arc};

use crate::evaluator::{EvaluatorHandle, builder::CameraNodeEvaluatorBuilder};

/// Immutable description of one stage of camera logic.
///
/// Camera nodes are authored as data and shared by every camera rig instance using them. The
/// per-instance state lives in the evaluator the node builds.
pub trait CameraNode: Send + Sync + Debug + 'static {
    /// Constructs this node's evaluator with [`CameraNodeEvaluatorBuilder::construct`].
    ///
    /// Children are built afterwards, from the evaluator's `on_build`.
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder)
    -> EvaluatorHandle;

    fn children(&self) -> Vec<&CameraNodeRef> {
        Vec::new()
    }

    fn display_name(&self) -> String {
        let name = std::any::type_name::<Self>();
        name.rsplit("::").next().unwrap_or(name).to_string()
    }
}

/// Shared reference to a camera node.
#[derive(Clone, Debug)]
pub struct CameraNodeRef(pub Arc<dyn CameraNode>);

impl CameraNodeRef {
    pub fn new(node: impl CameraNode) -> Self {
        Self(Arc::new(node))
    }

    /// Whether both refer to the same node instance.
    pub fn ptr_eq(&self, other: &CameraNodeRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of nodes in the hierarchy rooted at this node.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(CameraNodeRef::node_count)
            .sum::<usize>()
    }
}

impl Deref for CameraNodeRef {
    type Target = dyn CameraNode;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
