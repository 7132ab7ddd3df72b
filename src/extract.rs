//! HTML extraction for the steamcharts listing and detail pages.

use anyhow::{Result, anyhow};
use scraper::{Html, Selector};
use tracing::warn;

use crate::error::Failure;
use crate::record::{GameRef, Observation};

/// Result of extracting one detail page: the good rows plus the per-row
/// failures that were skipped.
#[derive(Debug, Default)]
pub struct Extraction {
    pub observations: Vec<Observation>,
    pub failures: Vec<Failure>,
}

/// Parses the top-games listing page into `(appid, name)` pairs.
///
/// Anchors whose href does not end in a numeric appid are skipped.
pub fn parse_top_games(html: &str) -> Result<Vec<GameRef>> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("table#top-games a[href^='/app/']").unwrap();

    let mut games = Vec::new();
    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(appid) = href.rsplit('/').next().and_then(|s| s.parse::<u32>().ok()) else {
            warn!(href, "Listing anchor without numeric appid, skipping");
            continue;
        };
        let name = anchor.text().collect::<String>().trim().to_string();
        games.push(GameRef { appid, name });
    }

    if games.is_empty() {
        return Err(anyhow!("no games found on listing page"));
    }
    Ok(games)
}

/// Parses one detail page's monthly history table into observations.
///
/// Row layout is month | avg | gain | percent | peak. The header row is
/// skipped; rows with fewer than five cells or non-numeric values are dropped
/// with a recorded reason, and extraction continues. Output follows document
/// order, which is not guaranteed chronological.
pub fn parse_history_rows(html: &str, game: &GameRef) -> Extraction {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("table.common-table tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let mut out = Extraction::default();

    for row in document.select(&row_selector).skip(1) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|c| c.text().collect::<String>().trim().replace(',', ""))
            .collect();

        if cells.len() < 5 {
            skip_row(
                &mut out,
                game,
                format!("expected at least 5 cells, got {}", cells.len()),
            );
            continue;
        }

        let month = cells[0].clone();
        let avg_players = match numeric_cell::<f64>(&cells[1]) {
            Ok(v) => v,
            Err(reason) => {
                skip_row(&mut out, game, format!("avg_players: {reason}"));
                continue;
            }
        };
        let peak_players = match numeric_cell::<u64>(&cells[4]) {
            Ok(v) => v,
            Err(reason) => {
                skip_row(&mut out, game, format!("peak_players: {reason}"));
                continue;
            }
        };

        out.observations
            .push(Observation::new(game, month, avg_players, peak_players));
    }

    out
}

fn skip_row(out: &mut Extraction, game: &GameRef, reason: String) {
    warn!(appid = game.appid, game = %game.name, %reason, "Skipping history row");
    out.failures.push(Failure::Row {
        appid: game.appid,
        game_name: game.name.clone(),
        reason,
    });
}

/// Parses a numeric cell, mapping the `-` placeholder and empty text to zero.
fn numeric_cell<T>(cell: &str) -> Result<T, String>
where
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    if cell.is_empty() || cell == "-" {
        return Ok(T::default());
    }
    cell.parse()
        .map_err(|e| format!("invalid value {cell:?}: {e}"))
}
