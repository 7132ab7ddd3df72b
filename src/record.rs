use serde::{Deserialize, Serialize};

/// One game from the top-games listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRef {
    pub appid: u32,
    pub name: String,
}

/// One monthly player-count observation for a single game.
///
/// Field order matches the flat CSV header:
/// `appid,game_name,month,avg_players,peak_players`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub appid: u32,
    pub game_name: String,
    /// Human-readable month label, e.g. `"July 2025"` or `"Last 30 Days"`.
    pub month: String,
    pub avg_players: f64,
    pub peak_players: u64,
}

impl Observation {
    pub fn new(
        game: &GameRef,
        month: impl Into<String>,
        avg_players: f64,
        peak_players: u64,
    ) -> Self {
        Self {
            appid: game.appid,
            game_name: game.name.clone(),
            month: month.into(),
            avg_players,
            peak_players,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_copies_game_identity() {
        let game = GameRef {
            appid: 570,
            name: "Dota 2".to_string(),
        };
        let obs = Observation::new(&game, "July 2025", 512345.6, 840321);

        assert_eq!(obs.appid, 570);
        assert_eq!(obs.game_name, "Dota 2");
        assert_eq!(obs.month, "July 2025");
        assert_eq!(obs.avg_players, 512345.6);
        assert_eq!(obs.peak_players, 840321);
    }
}
