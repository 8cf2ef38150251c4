//! Shared statistics helpers for reaction-time metrics

/// Extension trait for tracking minimum and maximum values in Option<T>.
///
/// # Example
///
/// ```
/// use cognitive_testkit::utils::MinMaxExt;
///
/// let mut fastest: Option<u64> = None;
/// let mut slowest: Option<u64> = None;
///
/// for rt in [310, 245, 480] {
///     fastest.update_min(rt);
///     slowest.update_max(rt);
/// }
/// assert_eq!(fastest, Some(245));
/// assert_eq!(slowest, Some(480));
/// ```
pub trait MinMaxExt<T: Ord + Copy> {
    /// Keep the smaller of the stored value and `value`
    fn update_min(&mut self, value: T);

    /// Keep the larger of the stored value and `value`
    fn update_max(&mut self, value: T);
}

impl<T: Ord + Copy> MinMaxExt<T> for Option<T> {
    fn update_min(&mut self, value: T) {
        *self = Some(self.map_or(value, |m| m.min(value)));
    }

    fn update_max(&mut self, value: T) {
        *self = Some(self.map_or(value, |m| m.max(value)));
    }
}

/// Arithmetic mean of millisecond samples
pub fn mean(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<u64>() as f64 / samples.len() as f64)
}

/// Population variance of millisecond samples
pub fn variance(samples: &[u64]) -> Option<f64> {
    let avg = mean(samples)?;
    let sum_sq = samples
        .iter()
        .map(|&x| {
            let diff = x as f64 - avg;
            diff * diff
        })
        .sum::<f64>();
    Some(sum_sq / samples.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_min_from_none() {
        let mut min: Option<u64> = None;
        min.update_min(100);
        assert_eq!(min, Some(100));
    }

    #[test]
    fn update_min_larger_value_unchanged() {
        let mut min: Option<u64> = Some(50);
        min.update_min(100);
        assert_eq!(min, Some(50));
    }

    #[test]
    fn update_max_smaller_value_unchanged() {
        let mut max: Option<u64> = Some(200);
        max.update_max(100);
        assert_eq!(max, Some(200));
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(variance(&[]), None);
    }

    #[test]
    fn mean_and_variance() {
        let samples = [200, 300, 400];
        assert_eq!(mean(&samples), Some(300.0));
        let var = variance(&samples).unwrap();
        assert!((var - 20_000.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn single_sample_has_zero_variance() {
        assert_eq!(variance(&[412]), Some(0.0));
    }
}
