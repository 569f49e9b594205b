//! Error metrics

/// Mean absolute error over pairs where both values are finite.
///
/// NaN when no such pair exists.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let (sum, n) = actual
        .iter()
        .zip(predicted)
        .filter(|(a, p)| a.is_finite() && p.is_finite())
        .fold((0.0, 0usize), |(sum, n), (a, p)| (sum + (a - p).abs(), n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}
