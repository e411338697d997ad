use super::{
    CameraNodeBlendParams, CameraNodeBlendResult, CameraNodePreBlendParams,
    CameraNodePreBlendResult,
};

/// Progress of a blend that runs over normalized time, from 0 to 1.
///
/// The blend factor is always `curve(alpha)`, so running a blend backwards retraces the exact
/// same factors it went through forwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimpleBlendState {
    alpha: f32,
    blend_factor: f32,
    is_reversed: bool,
    is_finished: bool,
}

impl SimpleBlendState {
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn blend_factor(&self) -> f32 {
        self.blend_factor
    }

    pub fn is_reversed(&self) -> bool {
        self.is_reversed
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    /// The child result fully replaces what was below it.
    pub fn is_full(&self) -> bool {
        !self.is_reversed && self.alpha >= 1.
    }

    /// Moves normalized time by `delta` in the direction the blend runs.
    pub fn advance(&mut self, delta: f32, curve: impl Fn(f32) -> f32) {
        let step = if self.is_reversed { -delta } else { delta };
        self.set_alpha(self.alpha + step, curve);
    }

    pub fn set_alpha(&mut self, alpha: f32, curve: impl Fn(f32) -> f32) {
        self.alpha = alpha.clamp(0., 1.);
        self.blend_factor = curve(self.alpha).clamp(0., 1.);
        self.is_finished = if self.is_reversed {
            self.alpha <= 0.
        } else {
            self.alpha >= 1.
        };
    }

    pub fn set_reversed(&mut self, reversed: bool) {
        self.is_reversed = reversed;
        self.is_finished = false;
    }

    pub fn blend_parameters(
        &self,
        params: &CameraNodePreBlendParams,
        result: &mut CameraNodePreBlendResult,
    ) {
        result
            .variable_table
            .lerp(params.child_variable_table, self.blend_factor);
        result.is_blend_full = self.is_full();
        result.is_blend_finished = self.is_finished;
    }

    pub fn blend_results(&self, params: &CameraNodeBlendParams, result: &mut CameraNodeBlendResult) {
        let blended = &mut *result.blended_result;
        blended
            .camera_pose
            .lerp_changed(&params.child_result.camera_pose, self.blend_factor);
        blended.is_valid &= params.child_result.is_valid;
        result.is_blend_full = self.is_full();
        result.is_blend_finished = self.is_finished;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoothstep(x: f32) -> f32 {
        x * x * (3. - 2. * x)
    }

    #[test]
    fn reversing_retraces_the_forward_trajectory() {
        let mut state = SimpleBlendState::default();
        let mut forward = vec![state.blend_factor()];
        for _ in 0..4 {
            state.advance(0.125, smoothstep);
            forward.push(state.blend_factor());
        }

        state.set_reversed(true);
        let mut backward = Vec::new();
        for _ in 0..4 {
            state.advance(0.125, smoothstep);
            backward.push(state.blend_factor());
        }

        forward.pop();
        forward.reverse();
        for (a, b) in forward.iter().zip(&backward) {
            assert!((a - b).abs() < 1e-5, "{forward:?} != {backward:?}");
        }
        assert!(state.is_finished());
        assert!(!state.is_full());
    }

    #[test]
    fn finishing_forward_makes_the_blend_full() {
        let mut state = SimpleBlendState::default();
        state.advance(0.6, smoothstep);
        assert!(!state.is_finished());
        state.advance(0.6, smoothstep);
        assert!(state.is_finished());
        assert!(state.is_full());
        assert_eq!(state.blend_factor(), 1.);
    }
}
