use crate::errors::{JournalError, JournalResult};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_file: String,
    pub server_port: u16,
    pub dashboard_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> JournalResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| JournalError::Config(format!("SERVER_PORT: {e}")))?;

        let db_file = env_var_or("JOURNAL_DB_FILE", "journal.db");
        if db_file.trim().is_empty() {
            return Err(JournalError::Config("JOURNAL_DB_FILE: empty file name".into()));
        }

        Ok(Self {
            data_dir: PathBuf::from(env_var_or("JOURNAL_DATA_DIR", "data")),
            db_file,
            server_port,
            dashboard_dir: PathBuf::from(env_var_or("DASHBOARD_DIR", "dashboard/dist")),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
