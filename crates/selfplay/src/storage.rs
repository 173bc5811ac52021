use alphasnake_nn::TrainingExample;
use anyhow::{bail, Result};
use ndarray::{Array, Array1, Array2, Array4};
use ndarray_npy::write_npy;

/// Save training data to NPY files.
///
/// Creates three files next to each other:
/// - `{path}_states.npy`: `(N, 4, B, B)` state tensors
/// - `{path}_policies.npy`: `(N, 4)` visit policies
/// - `{path}_values.npy`: `(N,)` return targets
///
/// The dump is an offline-inspection aid; the trainer itself feeds from the
/// in-memory replay buffer.
pub fn save_training_data(
    examples: &[TrainingExample],
    board_size: usize,
    path: &str,
) -> Result<()> {
    if examples.is_empty() {
        bail!("cannot save empty training data");
    }

    let dim = 4 * board_size * board_size;
    if let Some(ex) = examples.iter().find(|ex| ex.state.len() != dim) {
        bail!(
            "state length {} does not match board size {board_size}",
            ex.state.len()
        );
    }

    let states: Vec<f32> = examples
        .iter()
        .flat_map(|ex| ex.state.iter().copied())
        .collect();
    let states_array: Array4<f32> =
        Array::from_shape_vec((examples.len(), 4, board_size, board_size), states)?;

    let policies: Vec<f32> = examples
        .iter()
        .flat_map(|ex| ex.policy.iter().copied())
        .collect();
    let policies_array: Array2<f32> = Array::from_shape_vec((examples.len(), 4), policies)?;

    let values: Vec<f32> = examples.iter().map(|ex| ex.outcome).collect();
    let values_array: Array1<f32> = Array::from_vec(values);

    write_npy(format!("{path}_states.npy"), &states_array)?;
    write_npy(format!("{path}_policies.npy"), &policies_array)?;
    write_npy(format!("{path}_values.npy"), &values_array)?;

    Ok(())
}
