use crate::IdentityError;

/// Euclidean distance between two encodings: `sqrt(sum((a[i] - b[i])^2))`.
///
/// Fails with [`IdentityError::DimensionMismatch`] when the lengths differ.
/// The result is symmetric, non-negative, and zero only for element-wise
/// equal inputs.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64, IdentityError> {
    if a.len() != b.len() {
        return Err(IdentityError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }

    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum();
    Ok(sum.sqrt())
}
