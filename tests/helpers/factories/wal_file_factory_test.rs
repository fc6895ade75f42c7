use crate::engine::core::wal::{WalFileReader, WalRecord};
use crate::test_helpers::factories::{RowBatchFactory, TempWalDir, WalFileFactory};

#[test]
fn creates_registered_wal_with_header_and_batches() {
    let dir = TempWalDir::new();
    let manager = dir.manager();

    let path = WalFileFactory::new()
        .with_wal_id(7)
        .with_col_ids(&[3, 1])
        .with_batch(RowBatchFactory::new().sequential(0, 2).create())
        .create(&manager);

    assert_eq!(manager.get_wal_path(7).unwrap(), path);

    let mut reader = WalFileReader::open(&path).unwrap();
    assert_eq!(reader.read_header().unwrap(), "3,1");
    assert!(matches!(reader.read_block().unwrap(), WalRecord::Block(_)));
    assert_eq!(reader.read_block().unwrap(), WalRecord::EndOfStream);
}

#[test]
fn writes_raw_header_verbatim() {
    let dir = TempWalDir::new();
    let path = WalFileFactory::new()
        .with_raw_header(" 10 , x ")
        .create(&dir.manager());

    let mut reader = WalFileReader::open(&path).unwrap();
    assert_eq!(reader.read_header().unwrap(), " 10 , x ");
}
