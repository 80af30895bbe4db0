//! Application configuration.

use std::env;

/// Process configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Frozen iteration 1 results file.
    pub it1_snapshot_path: String,
    /// Reporting endpoints for the live iterations. A missing URL disables
    /// that iteration's endpoint instead of crashing the process.
    pub it2_url: Option<String>,
    pub it3_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let it1_snapshot_path = env::var("IT1_SNAPSHOT_PATH")
            .unwrap_or_else(|_| "data/it1_leaderboard_final.json".to_string());

        let it2_url = env::var("LEADERBOARD_IT2_URL").ok();
        let it3_url = env::var("LEADERBOARD_IT3_URL").ok();

        Ok(Self {
            port,
            it1_snapshot_path,
            it2_url,
            it3_url,
        })
    }
}
