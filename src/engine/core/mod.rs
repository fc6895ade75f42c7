pub mod batch;
pub mod wal;
pub mod write;
