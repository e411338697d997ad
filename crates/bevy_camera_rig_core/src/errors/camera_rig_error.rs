use thiserror::Error;

use crate::{
    context::CameraEvaluationContextHandle, evaluator::EvaluatorHandle,
    type_registry::CameraObjectTypeId, variable_table::CameraVariableId,
};

/// Possible errors that can be produced while building or evaluating camera rigs
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CameraRigError {
    #[error("Evaluator handle {0:?} does not point to a live evaluator")]
    StaleEvaluatorHandle(EvaluatorHandle),
    #[error("Evaluator {0:?} is already borrowed")]
    EvaluatorAlreadyBorrowed(EvaluatorHandle),
    #[error("No type info registered for camera object type {0:?}")]
    MissingTypeInfo(CameraObjectTypeId),
    #[error("Unknown camera node type `{0}`")]
    UnknownNodeType(String),
    #[error("Evaluation context {0:?} was removed")]
    MissingEvaluationContext(CameraEvaluationContextHandle),
    #[error("Variable {0:?} is not set")]
    MissingVariable(CameraVariableId),
    #[error("Tried to read variable as incorrect type: expected {0}, got {1}")]
    MismatchedVariableType(String, String),
}

pub type CameraRigResult<T> = Result<T, CameraRigError>;
