use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use serde::{Deserialize, Serialize};

/// Shape of a blend over normalized time.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
pub enum BlendCurve {
    Linear,
    /// Cubic Hermite, zero slope at both ends
    #[default]
    SmoothStep,
    /// Quintic, zero slope and curvature at both ends
    SmootherStep,
    EaseIn {
        exponent: f32,
    },
    EaseOut {
        exponent: f32,
    },
    EaseInOut {
        exponent: f32,
    },
}

impl BlendCurve {
    /// Maps `alpha` in `[0, 1]` to a blend factor in `[0, 1]`.
    pub fn evaluate(&self, alpha: f32) -> f32 {
        let x = alpha.clamp(0., 1.);
        match *self {
            BlendCurve::Linear => x,
            BlendCurve::SmoothStep => x * x * (3. - 2. * x),
            BlendCurve::SmootherStep => x * x * x * (x * (6. * x - 15.) + 10.),
            BlendCurve::EaseIn { exponent } => x.powf(exponent),
            BlendCurve::EaseOut { exponent } => 1. - (1. - x).powf(exponent),
            BlendCurve::EaseInOut { exponent } => {
                if x < 0.5 {
                    0.5 * (2. * x).powf(exponent)
                } else {
                    1. - 0.5 * (2. * (1. - x)).powf(exponent)
                }
            }
        }
    }
}

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

/// Piecewise linear curve through a list of keys. Evaluating before the first key or after the
/// last one clamps to their values.
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct KeyframeCurve {
    keys: Vec<CurveKey>,
}

impl Default for KeyframeCurve {
    fn default() -> Self {
        Self::from_keys(vec![
            CurveKey {
                time: 0.,
                value: 0.,
            },
            CurveKey {
                time: 1.,
                value: 1.,
            },
        ])
    }
}

impl From<Vec<CurveKey>> for KeyframeCurve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::from_keys(keys)
    }
}

impl From<KeyframeCurve> for Vec<CurveKey> {
    fn from(curve: KeyframeCurve) -> Self {
        curve.keys
    }
}

impl KeyframeCurve {
    pub fn from_keys(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Time of the last key.
    pub fn duration(&self) -> f32 {
        self.keys.last().map_or(0., |key| key.time)
    }

    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return time;
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let next = self.keys.partition_point(|key| key.time <= time);
        let (a, b) = (self.keys[next - 1], self.keys[next]);
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }
        a.value + (b.value - a.value) * (time - a.time) / span
    }
}
