use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file (ignored when absent, e.g. in production)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/pages.db".to_string()),
        })
    }
}
