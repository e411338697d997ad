use std::sync::Arc;

use bevy::math::Vec2;
use bevy_camera_rig_core::{
    camera_node::CameraNode,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{
        CameraNodeEvaluator, CameraNodeEvaluatorInitializeParams, EvaluatorHandle,
        builder::CameraNodeEvaluatorBuilder, tree::CameraNodeEvaluatorTree,
    },
    variable_table::CameraVariableId,
};
use serde::Deserialize;

/// Limits of one axis of an accumulated input.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub enum InputAxisRange {
    /// Values stay within `min..=max`
    Clamp(f32, f32),
    /// Values wrap around into `min..max`, e.g. `Wrap(-180.0, 180.0)` for a yaw in degrees
    Wrap(f32, f32),
}

impl InputAxisRange {
    fn apply(&self, value: f32) -> f32 {
        match *self {
            Self::Clamp(min, max) => value.clamp(min, max),
            Self::Wrap(min, max) if max > min => min + (value - min).rem_euclid(max - min),
            Self::Wrap(min, _) => min,
        }
    }
}

/// Integrates a 2D input rate, such as a look stick, into a value stored in a variable.
///
/// Every frame, `input` (units per second) is scaled by `speed` and added to the accumulated
/// value. A missing or mistyped input variable counts as no input. When the rig starts, the
/// accumulated value is picked up from the previously active rig's `output` variable, so switching
/// rigs keeps the camera's orientation.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InputAccumulator2DCameraNode {
    pub input: String,
    pub output: String,
    pub speed: Vec2,
    pub invert_x: bool,
    pub invert_y: bool,
    pub range_x: Option<InputAxisRange>,
    pub range_y: Option<InputAxisRange>,
}

impl Default for InputAccumulator2DCameraNode {
    fn default() -> Self {
        Self {
            input: "look_input".into(),
            output: "look".into(),
            speed: Vec2::ONE,
            invert_x: false,
            invert_y: false,
            range_x: None,
            range_y: None,
        }
    }
}

#[derive(Debug)]
pub struct InputAccumulator2DCameraNodeEvaluator {
    node: Arc<InputAccumulator2DCameraNode>,
    input: CameraVariableId,
    output: CameraVariableId,
    value: Vec2,
}

impl InputAccumulator2DCameraNodeEvaluator {
    fn constrain(&self, value: Vec2) -> Vec2 {
        let apply = |range: Option<InputAxisRange>, value: f32| match range {
            Some(range) => range.apply(value),
            None => value,
        };
        Vec2::new(
            apply(self.node.range_x, value.x),
            apply(self.node.range_y, value.y),
        )
    }
}

impl CameraNode for InputAccumulator2DCameraNode {
    fn build_evaluator(self: Arc<Self>, builder: &mut CameraNodeEvaluatorBuilder) -> EvaluatorHandle {
        builder.construct(InputAccumulator2DCameraNodeEvaluator {
            input: CameraVariableId::from_name(&self.input),
            output: CameraVariableId::from_name(&self.output),
            value: Vec2::ZERO,
            node: self,
        })
    }

    fn display_name(&self) -> String {
        format!("🕹 Accumulate {}", self.input)
    }
}

impl CameraNodeEvaluator for InputAccumulator2DCameraNodeEvaluator {
    fn on_initialize(
        &mut self,
        params: &CameraNodeEvaluatorInitializeParams,
        _result: &mut CameraNodeEvaluationResult,
    ) {
        let previous = params
            .last_active_result
            .and_then(|result| result.variable_table.get_vec2(self.output).ok())
            .unwrap_or_default();
        self.value = self.constrain(previous);
    }

    fn on_run(
        &mut self,
        params: &CameraNodeEvaluationParams,
        _tree: &CameraNodeEvaluatorTree,
        result: &mut CameraNodeEvaluationResult,
    ) {
        let input = result
            .variable_table
            .get_vec2(self.input)
            .unwrap_or_default();

        let mut delta = input * self.node.speed * params.delta_time;
        if self.node.invert_x {
            delta.x = -delta.x;
        }
        if self.node.invert_y {
            delta.y = -delta.y;
        }

        self.value = self.constrain(self.value + delta);
        result.variable_table.set(self.output, self.value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NodeHarness;

    fn run(harness: &NodeHarness, input: Vec2, delta_time: f32) -> Vec2 {
        let mut result = CameraNodeEvaluationResult::default();
        result
            .variable_table
            .set(CameraVariableId::from_name("look_input"), input.into());
        harness.run(delta_time, &mut result);
        result
            .variable_table
            .get_vec2(CameraVariableId::from_name("look"))
            .unwrap()
    }

    #[test]
    fn input_rate_accumulates_over_time() {
        let harness = NodeHarness::build(InputAccumulator2DCameraNode {
            speed: Vec2::new(90., 45.),
            invert_y: true,
            ..Default::default()
        });

        assert_eq!(run(&harness, Vec2::new(1., 1.), 0.5), Vec2::new(45., -22.5));
        assert_eq!(run(&harness, Vec2::new(-1., 0.), 0.5), Vec2::new(0., -22.5));
        assert_eq!(run(&harness, Vec2::ZERO, 0.5), Vec2::new(0., -22.5));
    }

    #[test]
    fn axis_ranges_clamp_and_wrap() {
        let harness = NodeHarness::build(InputAccumulator2DCameraNode {
            range_x: Some(InputAxisRange::Wrap(-180., 180.)),
            range_y: Some(InputAxisRange::Clamp(-60., 60.)),
            ..Default::default()
        });

        assert_eq!(run(&harness, Vec2::new(170., 100.), 1.), Vec2::new(170., 60.));
        assert_eq!(run(&harness, Vec2::new(20., -30.), 1.), Vec2::new(-170., 30.));
    }

    #[test]
    fn accumulation_resumes_from_the_previous_rig() {
        let harness = NodeHarness::build(InputAccumulator2DCameraNode {
            range_y: Some(InputAxisRange::Clamp(-60., 60.)),
            ..Default::default()
        });

        let mut previous = CameraNodeEvaluationResult::default();
        previous
            .variable_table
            .set(CameraVariableId::from_name("look"), Vec2::new(30., 80.).into());
        CameraNodeEvaluatorTree::new(&harness.storage).initialize(
            harness.root,
            &CameraNodeEvaluatorInitializeParams {
                last_active_result: Some(&previous),
            },
            &mut CameraNodeEvaluationResult::default(),
        );

        assert_eq!(run(&harness, Vec2::new(1., 0.), 1.), Vec2::new(31., 60.));
    }

    #[test]
    fn missing_input_counts_as_none() {
        let harness = NodeHarness::build(InputAccumulator2DCameraNode::default());
        let mut result = CameraNodeEvaluationResult::default();
        harness.run(0.1, &mut result);
        assert_eq!(
            result
                .variable_table
                .get_vec2(CameraVariableId::from_name("look")),
            Ok(Vec2::ZERO)
        );

        let node: InputAccumulator2DCameraNode = ron::from_str(
            r#"(input: "stick", speed: (120.0, 90.0), range_y: Some(Clamp(-80.0, 80.0)))"#,
        )
        .unwrap();
        assert_eq!(node.output, "look");
        assert_eq!(node.range_y, Some(InputAxisRange::Clamp(-80., 80.)));
        assert_eq!(node.display_name(), "🕹 Accumulate stick");
    }
}
