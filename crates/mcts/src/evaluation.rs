use alphasnake_env::NUM_ACTIONS;
use alphasnake_nn::{PolicyValueNet, Prediction};

/// Minimal prediction interface the search runs against.
///
/// Implemented both by the raw net (direct calls, used in tests and the
/// evaluator binary) and by the [`InferenceBatcher`](crate::InferenceBatcher)
/// handle, so the search code never knows whether requests are batched.
pub trait Evaluator {
    fn predict(&self, state: &[f32]) -> Prediction;

    /// Evaluate several states; the implementation may coalesce them into one
    /// batch. Results are in input order.
    fn predict_many(&self, states: &[Vec<f32>]) -> Vec<Prediction>;
}

impl Evaluator for PolicyValueNet {
    fn predict(&self, state: &[f32]) -> Prediction {
        PolicyValueNet::predict(self, state)
    }

    fn predict_many(&self, states: &[Vec<f32>]) -> Vec<Prediction> {
        self.predict_batch(states)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn predict(&self, state: &[f32]) -> Prediction {
        (**self).predict(state)
    }

    fn predict_many(&self, states: &[Vec<f32>]) -> Vec<Prediction> {
        (**self).predict_many(states)
    }
}

/// Project a raw policy onto the legal actions.
///
/// Negative entries are clamped to zero and illegal actions are dropped. If no
/// mass survives, the result is uniform over the legal actions, or uniform over
/// everything when no action is legal at all (the node terminates immediately).
pub fn normalize_masked(raw: &[f32; NUM_ACTIONS], mask: &[bool; NUM_ACTIONS]) -> [f32; NUM_ACTIONS] {
    let mut out = [0.0f32; NUM_ACTIONS];
    let mut sum = 0.0;
    for a in 0..NUM_ACTIONS {
        if mask[a] {
            out[a] = raw[a].max(0.0);
            sum += out[a];
        }
    }

    if sum <= 0.0 {
        let n = mask.iter().filter(|&&m| m).count();
        if n == 0 {
            return [0.25; NUM_ACTIONS];
        }
        let u = 1.0 / n as f32;
        for a in 0..NUM_ACTIONS {
            if mask[a] {
                out[a] = u;
            }
        }
        return out;
    }

    for p in out.iter_mut() {
        *p /= sum;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn masks_and_renormalizes() {
        let raw = [0.4, 0.4, 0.1, 0.1];
        let mask = [true, true, false, true];
        let p = normalize_masked(&raw, &mask);

        assert_eq!(p[2], 0.0);
        assert_relative_eq!(p.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(p[0], 0.4 / 0.9, epsilon = 1e-6);
    }

    #[test]
    fn clamps_negative_mass() {
        let raw = [-1.0, 0.5, 0.5, -0.5];
        let mask = [true, true, true, true];
        let p = normalize_masked(&raw, &mask);

        assert_eq!(p[0], 0.0);
        assert_eq!(p[3], 0.0);
        assert_relative_eq!(p[1], 0.5, epsilon = 1e-6);
        assert_relative_eq!(p[2], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn zero_mass_falls_back_to_uniform_over_legal() {
        let raw = [0.0; 4];
        let mask = [true, false, true, false];
        let p = normalize_masked(&raw, &mask);
        assert_eq!(p, [0.5, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn no_legal_actions_falls_back_to_uniform() {
        let raw = [0.0; 4];
        let mask = [false; 4];
        let p = normalize_masked(&raw, &mask);
        assert_eq!(p, [0.25; 4]);
    }
}
