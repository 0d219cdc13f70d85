//! Fixed-size minibatch selection.

use ndarray::{Array, ArrayBase, Axis, Data, RemoveAxis};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};

/// Split `0..len` into consecutive batches of `batch_size` indices.
///
/// A trailing partial batch is dropped. When `rng` is given, the indices are
/// shuffled once before splitting, so every index still appears at most once.
///
/// # Errors
///
/// Returns an error if `batch_size` is zero.
pub fn minibatch_indices<R: Rng + ?Sized>(
    len: usize,
    batch_size: usize,
    rng: Option<&mut R>,
) -> Result<Vec<Vec<usize>>> {
    if batch_size == 0 {
        return Err(Error::InvalidParameter {
            name: "batch_size".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    let mut indices: Vec<usize> = (0..len).collect();
    if let Some(rng) = rng {
        indices.shuffle(rng);
    }

    Ok(indices
        .chunks_exact(batch_size)
        .map(<[usize]>::to_vec)
        .collect())
}

/// Iterate over paired minibatches of `inputs` and `targets` along axis 0.
///
/// # Errors
///
/// Returns an error if the arrays disagree on their leading length or
/// `batch_size` is zero.
pub fn iterate_minibatches<'a, A, B, S, T, D, E, R>(
    inputs: &'a ArrayBase<S, D>,
    targets: &'a ArrayBase<T, E>,
    batch_size: usize,
    rng: Option<&mut R>,
) -> Result<impl Iterator<Item = (Array<A, D>, Array<B, E>)> + 'a>
where
    A: Clone + 'a,
    B: Clone + 'a,
    S: Data<Elem = A>,
    T: Data<Elem = B>,
    D: RemoveAxis,
    E: RemoveAxis,
    R: Rng + ?Sized,
{
    let len = inputs.len_of(Axis(0));
    let target_len = targets.len_of(Axis(0));
    if len != target_len {
        return Err(Error::ShapeMismatch {
            expected: format!("{len} targets"),
            actual: format!("{target_len} targets"),
        });
    }

    let batches = minibatch_indices(len, batch_size, rng)?;

    Ok(batches.into_iter().map(move |excerpt| {
        (
            inputs.select(Axis(0), &excerpt),
            targets.select(Axis(0), &excerpt),
        )
    }))
}
