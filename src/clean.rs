//! Leading-noise removal for per-game observation series.
//!
//! Many titles were tracked long before they had a real player base; their
//! early months are near-zero noise. Per game, the cleaner finds the first
//! sustained run of months at or above a player-count threshold and drops
//! everything before it.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::month::parse_month_year;
use crate::record::Observation;

#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Minimum average players for a month to count as meaningful.
    pub min_avg_players: f64,
    /// Consecutive qualifying months required to accept a starting point.
    /// Values below 1 are treated as 1.
    pub min_consecutive_months: usize,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            min_avg_players: 500.0,
            min_consecutive_months: 2,
        }
    }
}

/// Cleans one game's series.
///
/// The series is sorted chronologically (labels that fail to parse sort last
/// in their incoming order) and truncated at the start of the first run of
/// `min_consecutive_months` observations with `avg_players >= min_avg_players`.
/// If no such run exists the sorted series is returned unchanged, so a new or
/// low-traffic title keeps its full history.
///
/// Duplicate month labels keep the first occurrence.
pub fn clean_series(series: Vec<Observation>, config: &CleanConfig) -> Vec<Observation> {
    let mut seen = HashSet::new();
    let mut sorted: Vec<Observation> = series
        .into_iter()
        .filter(|obs| seen.insert(obs.month.clone()))
        .collect();

    sorted.sort_by_key(|obs| match parse_month_year(&obs.month) {
        Some((year, month)) => (false, year, month),
        None => (true, i32::MAX, u32::MAX),
    });

    let min_run = config.min_consecutive_months.max(1);
    let mut run = 0usize;
    let mut cut = None;

    for (idx, obs) in sorted.iter().enumerate() {
        if parse_month_year(&obs.month).is_none() {
            // unknown dates sort to the tail; nothing left to scan
            break;
        }
        if obs.avg_players >= config.min_avg_players {
            run += 1;
            if run >= min_run {
                cut = Some(idx + 1 - min_run);
                break;
            }
        } else {
            run = 0;
        }
    }

    match cut {
        Some(start) => sorted.split_off(start),
        None => sorted,
    }
}

/// Cleans every game's series independently and concatenates the results in
/// ascending appid order.
pub fn clean_dataset(rows: Vec<Observation>, config: &CleanConfig) -> Vec<Observation> {
    let mut by_game: BTreeMap<u32, Vec<Observation>> = BTreeMap::new();
    for row in rows {
        by_game.entry(row.appid).or_default().push(row);
    }

    let mut cleaned = Vec::new();
    for (appid, series) in by_game {
        let before = series.len();
        let kept = clean_series(series, config);
        debug!(appid, before, after = kept.len(), "Cleaned series");
        cleaned.extend(kept);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTHS_2024: [&str; 8] = [
        "January 2024",
        "February 2024",
        "March 2024",
        "April 2024",
        "May 2024",
        "June 2024",
        "July 2024",
        "August 2024",
    ];

    fn obs(month: &str, avg: f64) -> Observation {
        Observation {
            appid: 230410,
            game_name: "Warframe".to_string(),
            month: month.to_string(),
            avg_players: avg,
            peak_players: (avg * 2.0) as u64,
        }
    }

    fn series(values: &[f64]) -> Vec<Observation> {
        values
            .iter()
            .zip(MONTHS_2024)
            .map(|(&avg, month)| obs(month, avg))
            .collect()
    }

    fn avg_values(series: &[Observation]) -> Vec<f64> {
        series.iter().map(|o| o.avg_players).collect()
    }

    #[test]
    fn test_cut_starts_at_first_qualifying_run() {
        let input = series(&[0.0, 0.0, 600.0, 700.0, 400.0, 800.0, 900.0, 900.0]);
        let cleaned = clean_series(input, &CleanConfig::default());

        assert_eq!(
            avg_values(&cleaned),
            vec![600.0, 700.0, 400.0, 800.0, 900.0, 900.0]
        );
        assert_eq!(cleaned[0].month, "March 2024");
    }

    #[test]
    fn test_all_below_threshold_keeps_full_series() {
        let input = series(&[0.0, 10.0, 499.9, 20.0]);
        let cleaned = clean_series(input.clone(), &CleanConfig::default());

        assert_eq!(cleaned, input);
    }

    #[test]
    fn test_interrupted_runs_never_qualify() {
        // 600 alone never makes a run of 2
        let input = series(&[600.0, 0.0, 600.0, 0.0, 600.0]);
        let cleaned = clean_series(input.clone(), &CleanConfig::default());

        assert_eq!(cleaned, input);
    }

    #[test]
    fn test_output_never_longer_than_input() {
        let input = series(&[0.0, 900.0, 900.0, 0.0]);
        let cleaned = clean_series(input.clone(), &CleanConfig::default());

        assert!(cleaned.len() <= input.len());
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let input = series(&[0.0, 0.0, 600.0, 700.0, 400.0, 800.0, 900.0, 900.0]);
        let config = CleanConfig::default();

        let once = clean_series(input, &config);
        let twice = clean_series(once.clone(), &config);

        assert_eq!(twice, once);
    }

    #[test]
    fn test_sorts_chronologically_before_scanning() {
        let mut input = series(&[0.0, 0.0, 600.0, 700.0]);
        input.reverse();
        let cleaned = clean_series(input, &CleanConfig::default());

        assert_eq!(avg_values(&cleaned), vec![600.0, 700.0]);
    }

    #[test]
    fn test_empty_series() {
        assert!(clean_series(Vec::new(), &CleanConfig::default()).is_empty());
    }

    #[test]
    fn test_single_observation_is_unchanged() {
        let input = vec![obs("July 2024", 900.0)];
        let cleaned = clean_series(input.clone(), &CleanConfig::default());

        assert_eq!(cleaned, input);
    }

    #[test]
    fn test_min_consecutive_months_three() {
        let config = CleanConfig {
            min_avg_players: 500.0,
            min_consecutive_months: 3,
        };
        let input = series(&[0.0, 600.0, 700.0, 400.0, 800.0, 900.0, 900.0]);
        let cleaned = clean_series(input, &config);

        // first run of three is May-July
        assert_eq!(avg_values(&cleaned), vec![800.0, 900.0, 900.0]);
    }

    #[test]
    fn test_unknown_labels_sort_last_and_survive_the_cut() {
        let mut input = series(&[0.0, 600.0, 700.0]);
        input.insert(0, obs("Last 30 Days", 750.0));
        let cleaned = clean_series(input, &CleanConfig::default());

        assert_eq!(avg_values(&cleaned), vec![600.0, 700.0, 750.0]);
        assert_eq!(cleaned.last().unwrap().month, "Last 30 Days");
    }

    #[test]
    fn test_unknown_labels_do_not_count_toward_runs() {
        // rolling row is above threshold but must not complete a run
        let input = vec![obs("August 2024", 600.0), obs("Last 30 Days", 900.0)];
        let cleaned = clean_series(input.clone(), &CleanConfig::default());

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].month, "August 2024");
    }

    #[test]
    fn test_duplicate_month_keeps_first_occurrence() {
        let input = vec![
            obs("July 2024", 600.0),
            obs("July 2024", 100.0),
            obs("August 2024", 700.0),
        ];
        let cleaned = clean_series(input, &CleanConfig::default());

        assert_eq!(avg_values(&cleaned), vec![600.0, 700.0]);
    }

    #[test]
    fn test_dataset_cleans_each_game_independently() {
        let mut rows = series(&[0.0, 0.0, 600.0, 700.0]);
        let mut other = series(&[900.0, 900.0]);
        for row in &mut other {
            row.appid = 570;
            row.game_name = "Dota 2".to_string();
        }
        rows.extend(other);

        let cleaned = clean_dataset(rows, &CleanConfig::default());

        let warframe: Vec<_> = cleaned.iter().filter(|o| o.appid == 230410).collect();
        let dota: Vec<_> = cleaned.iter().filter(|o| o.appid == 570).collect();
        assert_eq!(warframe.len(), 2);
        assert_eq!(dota.len(), 2);
        // ascending appid order
        assert_eq!(cleaned[0].appid, 570);
    }
}
