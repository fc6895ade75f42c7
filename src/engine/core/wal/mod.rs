pub mod column_pos_map;
pub mod wal_file_reader;
pub mod wal_format;
pub mod wal_manager;
pub mod wal_reader;
pub mod wal_writer;

pub use column_pos_map::{ColumnPositionMap, to_header};
pub use wal_file_reader::{WalFileReader, WalRecord};
pub use wal_manager::{WAL_FILE_EXTENSION, WalManager};
pub use wal_reader::WalReader;
pub use wal_writer::{WalWriter, WalWriterOptions};
