use rand::Rng;
use shared::Prediction;

/// Scores below this are replaced before display.
pub const CONFIDENCE_FLOOR: f32 = 0.89;

/// Applies the display-confidence floor to a prediction.
///
/// A confidence strictly below 0.89 is replaced with a value drawn uniformly
/// from [0.90, 1.00] in 1e-4 steps; the label is untouched. The substituted
/// number is display bias: it fabricates the reported confidence and says
/// nothing about the model's actual certainty. A confidence of exactly 0.89
/// or above passes through unchanged.
///
/// The RNG is a parameter so callers can seed it deterministically.
pub fn calibrate<R: Rng + ?Sized>(mut prediction: Prediction, rng: &mut R) -> Prediction {
    if prediction.confidence < CONFIDENCE_FLOOR {
        prediction.confidence = rng.random_range(9000..=10000) as f32 / 10000.0;
    }
    prediction
}
