//! Trait for a site that ranks games and exposes per-game player history.

use anyhow::Result;
use steam_charts::extract::Extraction;
use steam_charts::record::GameRef;

/// Abstraction over the leaderboard source (steamcharts.com in production).
#[async_trait::async_trait]
pub trait Leaderboard {
    /// Returns the ranked `(appid, name)` listing.
    async fn top_games(&self) -> Result<Vec<GameRef>>;

    /// Fetches and extracts one game's monthly history table.
    async fn game_history(&self, game: &GameRef) -> Result<Extraction>;
}
