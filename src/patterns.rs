//! Pattern detection engine.
//!
//! Scans raw daily case counts for "acceleration" intervals: dates on which the case
//! count strictly exceeded the previous day's count, which in turn strictly exceeded
//! the count two days earlier. The scan is a single pass with a size-3 sliding window
//! over each (country, subregion, case category) partition sorted by date; no data
//! point is revisited once the window has advanced past it.

use crate::models::{CaseCount, CaseStreak};

use hashbrown::HashMap;

/// The result set is truncated to this many most recent streaks.
pub const RESULT_LIMIT: usize = 100;

/// The case category the result set is restricted to.
const CONFIRMED: &str = "Confirmed";

/// Find every two-step strictly increasing run in the given case count rows.
///
/// Rows may arrive in any order; they are partitioned by region and category and
/// sorted by date within each partition. For each emitted streak, `end_date` is the
/// date of the next sample in the same partition, if one exists; the lookahead plays
/// no part in the triggering condition. Rows with a missing count never trigger and
/// never participate in a window that triggers. Partitions with fewer than three rows
/// yield nothing. Results are restricted to the "Confirmed" category, ordered by
/// start date descending and truncated to [RESULT_LIMIT] records.
pub fn find_streaks(rows: &[CaseCount]) -> Vec<CaseStreak> {
    type PartitionKey<'a> = (&'a str, Option<&'a str>, &'a str);
    let mut partitions: HashMap<PartitionKey, Vec<&CaseCount>> = HashMap::new();
    // The category filter commutes with the windowed scan because the category is part
    // of the partition key.
    for row in rows.iter().filter(|row| row.case_type == CONFIRMED) {
        let key = (
            row.country_region.as_str(),
            row.province_state.as_deref(),
            row.case_type.as_str(),
        );
        partitions.entry(key).or_default().push(row);
    }

    let mut streaks = Vec::new();
    for partition in partitions.values_mut() {
        // ISO 8601 dates: lexicographic order equals chronological order.
        partition.sort_by(|a, b| a.date.cmp(&b.date));
        for i in 2..partition.len() {
            let (current, prev, prev2) = (partition[i], partition[i - 1], partition[i - 2]);
            let (Some(cases), Some(previous), Some(two_days_ago)) =
                (current.cases, prev.cases, prev2.cases)
            else {
                continue;
            };
            if cases > previous && previous > two_days_ago {
                streaks.push(CaseStreak {
                    country_region: current.country_region.clone(),
                    province_state: current.province_state.clone(),
                    start_date: current.date.clone(),
                    end_date: partition.get(i + 1).map(|next| next.date.clone()),
                    current_cases: cases,
                    previous_cases: previous,
                    two_days_ago_cases: two_days_ago,
                });
            }
        }
    }

    // Most recent first; region as a tie breaker so the order is deterministic.
    streaks.sort_by(|a, b| {
        b.start_date
            .cmp(&a.start_date)
            .then_with(|| a.country_region.cmp(&b.country_region))
            .then_with(|| a.province_state.cmp(&b.province_state))
    });
    streaks.truncate(RESULT_LIMIT);
    streaks
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::case_count;

    /// One region with the canonical spec counts [10, 12, 15, 14].
    fn single_partition() -> Vec<CaseCount> {
        let counts = [10, 12, 15, 14];
        counts
            .iter()
            .enumerate()
            .map(|(i, &cases)| {
                case_count(
                    "France",
                    None,
                    &format!("2020-03-{:02}", i + 1),
                    Some(cases),
                )
            })
            .collect()
    }

    #[test]
    fn detects_single_streak() {
        let streaks = find_streaks(&single_partition());
        assert_eq!(streaks.len(), 1);
        let streak = &streaks[0];
        assert_eq!(streak.start_date, "2020-03-03");
        assert_eq!(streak.end_date.as_deref(), Some("2020-03-04"));
        assert_eq!(streak.current_cases, 15);
        assert_eq!(streak.previous_cases, 12);
        assert_eq!(streak.two_days_ago_cases, 10);
    }

    #[test]
    fn end_date_unset_without_lookahead() {
        // Drop the trailing sample so the streak is the final row of the partition.
        let mut rows = single_partition();
        rows.truncate(3);
        let streaks = find_streaks(&rows);
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].end_date, None);
    }

    #[test]
    fn short_partition_yields_nothing() {
        let mut rows = single_partition();
        rows.truncate(2);
        assert!(find_streaks(&rows).is_empty());
        assert!(find_streaks(&[]).is_empty());
    }

    #[test]
    fn ties_do_not_qualify() {
        let rows = vec![
            case_count("France", None, "2020-03-01", Some(10)),
            case_count("France", None, "2020-03-02", Some(12)),
            case_count("France", None, "2020-03-03", Some(12)),
            case_count("France", None, "2020-03-04", Some(13)),
        ];
        // 12 == 12 breaks the first window; 13 > 12 but prev == prev2 breaks the second.
        assert!(find_streaks(&rows).is_empty());
    }

    #[test]
    fn missing_counts_yield_no_record() {
        let rows = vec![
            case_count("France", None, "2020-03-01", Some(10)),
            case_count("France", None, "2020-03-02", None),
            case_count("France", None, "2020-03-03", Some(15)),
            case_count("France", None, "2020-03-04", Some(20)),
            case_count("France", None, "2020-03-05", Some(25)),
        ];
        // Only the final window (15, 20, 25) has three known counts.
        let streaks = find_streaks(&rows);
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].start_date, "2020-03-05");
    }

    #[test]
    fn partitions_are_independent() {
        let mut rows = single_partition();
        // Same dates and counts in a subregion partition of another country.
        rows.extend([
            case_count("Australia", Some("Victoria"), "2020-03-01", Some(10)),
            case_count("Australia", Some("Victoria"), "2020-03-02", Some(12)),
            case_count("Australia", Some("Victoria"), "2020-03-03", Some(15)),
        ]);
        let streaks = find_streaks(&rows);
        assert_eq!(streaks.len(), 2);
        // Equal start dates: deterministic tie break by region.
        assert_eq!(streaks[0].country_region, "Australia");
        assert_eq!(streaks[1].country_region, "France");
    }

    #[test]
    fn unsorted_input_is_sorted_per_partition() {
        let mut rows = single_partition();
        rows.reverse();
        let streaks = find_streaks(&rows);
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].start_date, "2020-03-03");
    }

    #[test]
    fn non_confirmed_categories_are_excluded() {
        let rows: Vec<CaseCount> = single_partition()
            .into_iter()
            .map(|mut row| {
                row.case_type = "Deaths".to_string();
                row
            })
            .collect();
        assert!(find_streaks(&rows).is_empty());
    }

    #[test]
    fn ordered_descending_and_truncated() {
        // A long strictly increasing partition: every position from the third onwards
        // is a streak, well over the result limit.
        let rows: Vec<CaseCount> = (0..(RESULT_LIMIT as i64 + 10))
            .map(|i| {
                let date = format!("2020-{:02}-{:02}", 1 + i / 28, 1 + i % 28);
                case_count("France", None, &date, Some(i * 2))
            })
            .collect();
        let streaks = find_streaks(&rows);
        assert_eq!(streaks.len(), RESULT_LIMIT);
        for pair in streaks.windows(2) {
            assert!(pair[0].start_date > pair[1].start_date);
        }
        // The most recent sample heads the list.
        assert_eq!(streaks[0].start_date, rows.last().unwrap().date);
    }
}
