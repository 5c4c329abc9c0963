//! Environment configuration, collected in one place at startup.

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let port = match std::env::var("PORT") {
            Ok(v) => v.parse().context("PORT must be a valid port number")?,
            Err(_) => 8080,
        };
        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(v) => v
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            Err(_) => 10,
        };
        Ok(Self {
            database_url,
            port,
            max_connections,
        })
    }
}
