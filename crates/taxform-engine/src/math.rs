//! Small numeric helpers shared by form computations.

/// Negative amounts become zero.
pub fn clamp_to_zero(value: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else {
        value
    }
}

pub fn none_to_zero(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

pub fn sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().fold(0.0, |acc, value| acc + value)
}
