use crate::{pose::CameraPose, variable_table::CameraVariableTable};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraNodeEvaluationParams {
    /// Seconds elapsed since the last evaluation
    pub delta_time: f32,
    /// Set on the first evaluation after a camera rig was activated
    pub is_first_frame: bool,
}

impl CameraNodeEvaluationParams {
    pub fn new(delta_time: f32) -> Self {
        Self {
            delta_time,
            is_first_frame: false,
        }
    }
}

/// Accumulator threaded through an evaluator tree. Each evaluator reads and updates it in turn.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraNodeEvaluationResult {
    pub camera_pose: CameraPose,
    pub variable_table: CameraVariableTable,
    /// The pose doesn't follow from the previous frame's and shouldn't be smoothed towards
    pub is_camera_cut: bool,
    pub is_valid: bool,
}

impl Default for CameraNodeEvaluationResult {
    fn default() -> Self {
        Self {
            camera_pose: CameraPose::default(),
            variable_table: CameraVariableTable::default(),
            is_camera_cut: false,
            is_valid: true,
        }
    }
}

impl CameraNodeEvaluationResult {
    /// Clears per-frame state: changed flags and the camera cut flag.
    pub fn reset_frame_flags(&mut self) {
        self.camera_pose.clear_changed_flags();
        self.variable_table.clear_changed_flags();
        self.is_camera_cut = false;
    }

    pub fn override_all(&mut self, other: &CameraNodeEvaluationResult) {
        self.camera_pose.override_all(&other.camera_pose);
        self.variable_table.override_all(&other.variable_table);
        self.is_camera_cut = other.is_camera_cut;
        self.is_valid = other.is_valid;
    }

    /// Blends the pose and variables towards `other`.
    pub fn lerp(&mut self, other: &CameraNodeEvaluationResult, factor: f32) {
        self.camera_pose.lerp_changed(&other.camera_pose, factor);
        self.variable_table.lerp(&other.variable_table, factor);
        self.is_valid &= other.is_valid;
    }
}
