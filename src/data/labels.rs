/// One-hot label vectors
use ndarray::{Array1, Array2};

use crate::InputError;

/// Build a one-hot vector of length `num_labels` with a 1 at `label`
pub fn one_hot(label: usize, num_labels: usize) -> crate::Result<Array1<f32>> {
    if label >= num_labels {
        return Err(InputError::LabelRange { label, num_labels });
    }
    let mut v = Array1::zeros(num_labels);
    v[label] = 1.0;
    Ok(v)
}

/// Build a `[labels.len(), num_labels]` matrix of one-hot rows
pub fn labels_to_dense(labels: &[usize], num_labels: usize) -> crate::Result<Array2<f32>> {
    let mut dense = Array2::zeros((labels.len(), num_labels));
    for (mut row, &label) in dense.rows_mut().into_iter().zip(labels) {
        row.assign(&one_hot(label, num_labels)?);
    }
    Ok(dense)
}
