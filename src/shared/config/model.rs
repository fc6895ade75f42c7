use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub wal: WalConfig,
    pub writer: WriterConfig,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct WalConfig {
    pub dir: String,
    pub fsync: bool,
    pub buffer_size: usize,
    /// Flush the buffered writer after every appended batch
    pub flush_each_write: bool,
}

#[derive(Debug, Deserialize)]
pub struct WriterConfig {
    /// Batches the background writer may hold before submissions are rejected
    pub queue_capacity: usize,
    /// Upper bound for a single transport write, in milliseconds
    pub write_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReplayConfig {
    pub delete_on_success: bool,
    /// Pause between backpressure polls while replaying, in milliseconds
    pub backoff_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

use std::env;

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("OLAP_INGEST_CONFIG").unwrap_or_else(|_| "config".to_string());
    load_settings_from(&config_path)
}

pub fn load_settings_from(config_path: &str) -> Result<Settings, config::ConfigError> {
    let settings: Settings = config::Config::builder()
        .set_default("wal.dir", "data/wal")?
        .set_default("wal.fsync", true)?
        .set_default("wal.buffer_size", 64 * 1024_i64)?
        .set_default("wal.flush_each_write", false)?
        .set_default("writer.queue_capacity", 16_i64)?
        .set_default("writer.write_timeout_ms", 30_000_i64)?
        .set_default("replay.delete_on_success", false)?
        .set_default("replay.backoff_ms", 5_i64)?
        .set_default("logging.log_dir", "logs")?
        .set_default("logging.stdout_level", "info")?
        .set_default("logging.file_level", "debug")?
        .add_source(config::File::with_name(config_path).required(false))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
