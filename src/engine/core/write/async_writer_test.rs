use std::time::{Duration, Instant};

use super::async_writer::{AsyncWriter, AsyncWriterOptions, Submitted};
use crate::engine::errors::{SinkError, WriterError};
use crate::engine::types::ScalarValue;
use crate::logging::init_for_tests;
use crate::test_helpers::factories::{MockTabletWriterFactory, RowBatchFactory};

fn options(queue_capacity: usize) -> AsyncWriterOptions {
    AsyncWriterOptions {
        queue_capacity,
        write_timeout_ms: 5_000,
    }
}

#[tokio::test]
async fn writes_batches_in_submission_order_and_closes() {
    init_for_tests();
    let mock = MockTabletWriterFactory::new();
    let log = mock.log();
    let mut writer = AsyncWriter::open("load-1", mock.writer(), options(8))
        .await
        .unwrap();

    for start in [0, 10, 20] {
        let batch = RowBatchFactory::new().sequential(start, 2).create();
        assert!(writer.submit(batch).unwrap().is_accepted());
    }

    writer.drain_and_close(&Ok(())).await.unwrap();

    let firsts: Vec<ScalarValue> = log
        .batches()
        .iter()
        .map(|b| b.row(0).unwrap()[0].clone())
        .collect();
    assert_eq!(
        firsts,
        vec![
            ScalarValue::Int64(0),
            ScalarValue::Int64(10),
            ScalarValue::Int64(20)
        ]
    );
    assert!(log.is_closed());
    assert_eq!(writer.metrics().written_rows(), 6);
    assert_eq!(writer.metrics().pending_batches(), 0);
}

#[tokio::test]
async fn open_failure_surfaces_from_open() {
    let mock = MockTabletWriterFactory::new().failing_open("no tablet");

    let err = AsyncWriter::open("load-1", mock.writer(), options(4))
        .await
        .err()
        .unwrap();
    assert_eq!(err, WriterError::Open("no tablet".into()));
}

#[tokio::test]
async fn full_queue_rejects_without_blocking_and_returns_the_batch() {
    let mock = MockTabletWriterFactory::new().blocking();
    let mut writer = AsyncWriter::open("load-1", mock.writer(), options(1))
        .await
        .unwrap();

    let started = Instant::now();
    let mut rejected = 0;
    for i in 0..20 {
        let batch = RowBatchFactory::new().sequential(i, 1).create();
        match writer.submit(batch).unwrap() {
            Submitted::Accepted => {}
            Submitted::Rejected(back) => {
                assert_eq!(back.row(0).unwrap()[0], ScalarValue::Int64(i));
                rejected += 1;
            }
        }
        tokio::task::yield_now().await;
    }

    assert!(rejected >= 18, "rejected {}", rejected);
    assert!(!writer.can_write());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(writer.metrics().rejected_submissions(), rejected);

    let cancel = Err(SinkError::Cancelled("upstream failed".into()));
    let status = writer.drain_and_close(&cancel).await;
    assert!(matches!(status, Err(WriterError::Cancelled(_))));
}

#[tokio::test]
async fn write_failure_becomes_first_error_and_fails_later_submits() {
    let mock = MockTabletWriterFactory::new().failing_write_at(1, "disk full");
    let log = mock.log();
    let mut writer = AsyncWriter::open("load-1", mock.writer(), options(8))
        .await
        .unwrap();

    for i in 0..3 {
        let _ = writer.submit(RowBatchFactory::new().sequential(i, 1).create());
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = writer
        .submit(RowBatchFactory::new().sequential(9, 1).create())
        .unwrap_err();
    assert_eq!(err, WriterError::Write("disk full".into()));
    assert!(!writer.can_write());

    let status = writer.drain_and_close(&Ok(())).await;
    assert_eq!(status, Err(WriterError::Write("disk full".into())));
    assert_eq!(log.batch_count(), 1);
    assert!(log.cancel_reason().is_some());
    assert!(!log.is_closed());
}

#[tokio::test]
async fn drain_and_close_is_memoized() {
    let mock = MockTabletWriterFactory::new().failing_close("commit failed");
    let mut writer = AsyncWriter::open("load-1", mock.writer(), options(4))
        .await
        .unwrap();

    let first = writer.drain_and_close(&Ok(())).await;
    let second = writer
        .drain_and_close(&Err(SinkError::Cancelled("late".into())))
        .await;

    assert_eq!(first, Err(WriterError::Close("commit failed".into())));
    assert_eq!(second, first);
    assert_eq!(
        writer.submit(RowBatchFactory::new().sequential(0, 1).create()).unwrap_err(),
        WriterError::Close("commit failed".into())
    );
}

#[tokio::test]
async fn slow_write_times_out() {
    let mock = MockTabletWriterFactory::new().with_write_delay(Duration::from_millis(500));
    let log = mock.log();
    let opts = AsyncWriterOptions {
        queue_capacity: 2,
        write_timeout_ms: 20,
    };
    let mut writer = AsyncWriter::open("load-1", mock.writer(), opts).await.unwrap();

    writer
        .submit(RowBatchFactory::new().sequential(0, 1).create())
        .unwrap();
    let status = writer.drain_and_close(&Ok(())).await;

    assert_eq!(status, Err(WriterError::Timeout(20)));
    assert_eq!(log.batch_count(), 0);
}

#[tokio::test]
async fn panicking_transport_is_reported() {
    let mock = MockTabletWriterFactory::new().panicking();
    let mut writer = AsyncWriter::open("load-1", mock.writer(), options(2))
        .await
        .unwrap();

    writer
        .submit(RowBatchFactory::new().sequential(0, 1).create())
        .unwrap();
    let status = writer.drain_and_close(&Ok(())).await;

    assert!(matches!(status, Err(WriterError::Panicked(_))));
}

#[tokio::test]
async fn submit_blocking_waits_for_room() {
    let mock = MockTabletWriterFactory::new().with_write_delay(Duration::from_millis(5));
    let log = mock.log();
    let mut writer = AsyncWriter::open("load-1", mock.writer(), options(1))
        .await
        .unwrap();

    for i in 0..5 {
        writer
            .submit_blocking(RowBatchFactory::new().sequential(i, 1).create())
            .await
            .unwrap();
    }
    writer.drain_and_close(&Ok(())).await.unwrap();

    assert_eq!(log.batch_count(), 5);
    assert_eq!(writer.metrics().submitted_batches(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn writer_runs_on_a_multi_threaded_runtime() {
    fn assert_send<T: Send>(value: T) -> T {
        value
    }

    let mock = MockTabletWriterFactory::new().with_write_delay(Duration::from_millis(1));
    let log = mock.log();
    let mut writer = assert_send(AsyncWriter::open("load-mt", mock.writer(), options(2)))
        .await
        .unwrap();

    let handle = tokio::spawn(async move {
        for start in 0..5 {
            let batch = RowBatchFactory::new().sequential(start, 1).create();
            writer.submit_blocking(batch).await.unwrap();
        }
        writer.drain_and_close(&Ok(())).await
    });

    assert_eq!(handle.await.unwrap(), Ok(()));
    assert_eq!(log.batch_count(), 5);
    assert!(log.is_closed());
}
