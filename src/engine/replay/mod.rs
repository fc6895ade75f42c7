mod wal_replay;

pub use wal_replay::{ReplayStats, WalReplayer};
