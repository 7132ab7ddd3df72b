use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::services::leaderboard::Leaderboard;
use steam_charts::extract::{self, Extraction};
use steam_charts::fetch::{BasicClient, fetch_text};
use steam_charts::record::GameRef;

const DEFAULT_BASE_URL: &str = "https://steamcharts.com";

pub struct SteamChartsClient {
    base_url: String,
    client: BasicClient,
    delay: Duration,
}

impl SteamChartsClient {
    /// `delay` is the fixed pause applied after every detail-page request.
    pub fn new(delay: Duration) -> Self {
        let base_url = std::env::var("STEAMCHARTS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            client: BasicClient::new(),
            delay,
        }
    }
}

#[async_trait]
impl Leaderboard for SteamChartsClient {
    async fn top_games(&self) -> Result<Vec<GameRef>> {
        let url = format!("{}/top", self.base_url);
        let html = fetch_text(&self.client, &url).await?;
        extract::parse_top_games(&html)
    }

    async fn game_history(&self, game: &GameRef) -> Result<Extraction> {
        let url = format!("{}/app/{}", self.base_url, game.appid);
        let result = fetch_text(&self.client, &url).await;

        // fixed pause between requests, whether or not the fetch succeeded
        tokio::time::sleep(self.delay).await;

        let html = result?;
        debug!(appid = game.appid, bytes = html.len(), "Detail page fetched, parsing");
        Ok(extract::parse_history_rows(&html, game))
    }
}
