//! Baseline statistics for spike detection.

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0 with fewer than two samples.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// How far a sample sits from a baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineScore {
    pub mean: f64,
    pub std_dev: f64,
    /// 0 when the baseline has no spread.
    pub z_score: f64,
}

/// Score `current` against `baseline`.
pub fn score_against_baseline(current: f64, baseline: &[f64]) -> BaselineScore {
    let mean = mean(baseline);
    let std_dev = population_std_dev(baseline);
    let z_score = if std_dev > 0.0 {
        (current - mean) / std_dev
    } else {
        0.0
    };
    BaselineScore {
        mean,
        std_dev,
        z_score,
    }
}
