/// Accuracy of paired (actual, predicted) values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accuracy {
    pub mse: f64,
    pub mape: f64,
}

/// `None` when the slices are empty or of different length.
pub fn accuracy(actual: &[f64], predicted: &[f64]) -> Option<Accuracy> {
    Some(Accuracy {
        mse: mean_squared_error(actual, predicted)?,
        mape: mean_absolute_percentage_error(actual, predicted)?,
    })
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    Some(sum / actual.len() as f64)
}

/// Mean of `|a - p| / max(|a|, eps)`, expressed as a fraction.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs() / a.abs().max(f64::EPSILON))
        .sum();
    Some(sum / actual.len() as f64)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
