mod global;
pub mod model;


pub use global::CONFIG;
pub use model::{LoggingConfig, ReplayConfig, Settings, WalConfig, WriterConfig, load_settings};
