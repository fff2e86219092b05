use std::time::Duration;

/// Nearest-rank percentile over a set of durations.
///
/// `p` is a percentage in `(0, 100]`. Returns `None` for an empty input.
pub fn percentile(durations: &[Duration], p: f64) -> Option<Duration> {
    if durations.is_empty() {
        return None;
    }

    let mut sorted = durations.to_vec();
    sorted.sort_unstable();

    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    let index = rank.clamp(1, sorted.len()) - 1;

    Some(sorted[index])
}

#[cfg(test)]
mod test {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|v| Duration::from_millis(*v)).collect()
    }

    #[test]
    fn empty_has_no_percentile() {
        assert_eq!(None, percentile(&[], 95.0));
    }

    #[test]
    fn single_value_is_every_percentile() {
        let d = ms(&[42]);
        assert_eq!(Some(Duration::from_millis(42)), percentile(&d, 50.0));
        assert_eq!(Some(Duration::from_millis(42)), percentile(&d, 95.0));
    }

    #[test]
    fn p95_of_twenty_values_is_nineteenth() {
        // Unsorted on purpose
        let d = ms(&[
            20, 1, 19, 2, 18, 3, 17, 4, 16, 5, 15, 6, 14, 7, 13, 8, 12, 9, 11, 10,
        ]);
        assert_eq!(Some(Duration::from_millis(19)), percentile(&d, 95.0));
        assert_eq!(Some(Duration::from_millis(10)), percentile(&d, 50.0));
        assert_eq!(Some(Duration::from_millis(20)), percentile(&d, 100.0));
    }
}
