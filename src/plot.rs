//! Multi-panel trend chart rendering.
//!
//! Pure consumer of a cleaned dataset: one panel per requested game, average
//! players as the primary line and peak players as a thin secondary line.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use plotters::prelude::*;
use std::path::Path;
use tracing::{info, warn};

use crate::month::parse_month_year;
use crate::record::Observation;

pub const DEFAULT_GAMES: [&str; 4] = ["Warframe", "War Thunder", "Counter-Strike 2", "Dota 2"];

const PANEL_GRID: (usize, usize) = (2, 2);

/// Renders a 2x2 panel PNG of player trends for the named games.
///
/// Observations whose month label does not parse to a calendar month (the
/// rolling "Last 30 Days" row in particular) are skipped. A game with no
/// plottable data gets a log line and an empty panel.
pub fn render_trends(rows: &[Observation], games: &[String], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (1500, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly(PANEL_GRID);

    for (panel, game_name) in panels.iter().zip(games) {
        let mut series: Vec<(NaiveDate, f64, u64)> = rows
            .iter()
            .filter(|o| o.game_name == *game_name)
            .filter_map(|o| {
                let (year, month) = parse_month_year(&o.month)?;
                let date = NaiveDate::from_ymd_opt(year, month, 1)?;
                Some((date, o.avg_players, o.peak_players))
            })
            .collect();

        if series.is_empty() {
            warn!(game = %game_name, "No data to plot");
            continue;
        }
        series.sort_by_key(|(date, ..)| *date);

        let x_min = series.first().unwrap().0;
        let mut x_max = series.last().unwrap().0;
        if x_min == x_max {
            // a single month still needs a non-degenerate axis
            x_max = x_max + chrono::Months::new(1);
        }
        let y_max = series
            .iter()
            .map(|(_, avg, peak)| avg.max(*peak as f64))
            .fold(1.0f64, f64::max)
            * 1.05;

        let caption = format!(
            "{} ({} to {})",
            game_name,
            x_min.format("%B %Y"),
            series.last().unwrap().0.format("%B %Y")
        );

        let mut chart = ChartBuilder::on(panel)
            .caption(caption, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)?;

        chart
            .configure_mesh()
            .x_labels(8)
            .y_desc("Player count")
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                series.iter().map(|(date, avg, _)| (*date, *avg)),
                BLUE.stroke_width(2),
            ))?
            .label("Avg players")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

        chart
            .draw_series(LineSeries::new(
                series.iter().map(|(date, _, peak)| (*date, *peak as f64)),
                RED.mix(0.7).stroke_width(1),
            ))?
            .label("Peak players")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.mix(0.7)));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()
        .with_context(|| format!("cannot write chart to {}", path.display()))?;
    info!(path = %path.display(), "Chart rendered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn obs(name: &str, month: &str, avg: f64, peak: u64) -> Observation {
        Observation {
            appid: 230410,
            game_name: name.to_string(),
            month: month.to_string(),
            avg_players: avg,
            peak_players: peak,
        }
    }

    #[test]
    fn test_renders_chart_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trends.png");

        let rows = vec![
            obs("Warframe", "June 2024", 60000.0, 90000),
            obs("Warframe", "July 2024", 65000.0, 95000),
            obs("Warframe", "Last 30 Days", 70000.0, 99000),
            obs("Dota 2", "July 2024", 450000.0, 650000),
        ];
        let games = vec!["Warframe".to_string(), "Dota 2".to_string()];

        render_trends(&rows, &games, &path).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
    }

    #[test]
    fn test_unknown_game_renders_empty_panel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trends.png");

        let rows = vec![obs("Warframe", "June 2024", 60000.0, 90000)];
        let games = vec!["No Such Game".to_string()];

        render_trends(&rows, &games, &path).unwrap();
        assert!(path.exists());
    }
}
