//! Time-axis selection for extraction calls.

use chrono::{DateTime, Utc};

/// Which samples of the dataset's time axis an extraction covers.
///
/// Omitting a selection takes the whole axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSelection {
    /// The single sample nearest to the given instant (ties resolve to the
    /// earlier sample).
    Instant(DateTime<Utc>),
    /// All samples within the inclusive range.
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Resolves a selection to indices into the time axis, in axis order.
pub(crate) fn time_indices(
    times: &[DateTime<Utc>],
    selection: Option<&TimeSelection>,
) -> Vec<usize> {
    match selection {
        None => (0..times.len()).collect(),
        Some(TimeSelection::Instant(target)) => times
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (**t - *target).abs())
            .map(|(i, _)| vec![i])
            .unwrap_or_default(),
        Some(TimeSelection::Range { start, end }) => times
            .iter()
            .enumerate()
            .filter(|(_, t)| *start <= **t && **t <= *end)
            .map(|(i, _)| i)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn axis() -> Vec<DateTime<Utc>> {
        (0..6)
            .map(|h| Utc.with_ymd_and_hms(2024, 7, 3, h, 0, 0).unwrap())
            .collect()
    }

    #[test]
    fn no_selection_takes_the_whole_axis() {
        assert_eq!(time_indices(&axis(), None), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn instant_picks_the_nearest_sample() {
        let target = Utc.with_ymd_and_hms(2024, 7, 3, 2, 40, 0).unwrap();
        assert_eq!(
            time_indices(&axis(), Some(&TimeSelection::Instant(target))),
            vec![3]
        );
        // Exactly between two samples: the earlier one wins.
        let midpoint = Utc.with_ymd_and_hms(2024, 7, 3, 2, 30, 0).unwrap();
        assert_eq!(
            time_indices(&axis(), Some(&TimeSelection::Instant(midpoint))),
            vec![2]
        );
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let selection = TimeSelection::Range {
            start: Utc.with_ymd_and_hms(2024, 7, 3, 1, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 7, 3, 4, 0, 0).unwrap(),
        };
        assert_eq!(time_indices(&axis(), Some(&selection)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn range_outside_the_axis_is_empty() {
        let selection = TimeSelection::Range {
            start: Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 8, 2, 0, 0, 0).unwrap(),
        };
        assert!(time_indices(&axis(), Some(&selection)).is_empty());
    }

    #[test]
    fn empty_axis_resolves_to_nothing() {
        let target = Utc.with_ymd_and_hms(2024, 7, 3, 0, 0, 0).unwrap();
        assert!(time_indices(&[], Some(&TimeSelection::Instant(target))).is_empty());
        assert!(time_indices(&[], None).is_empty());
    }
}
