// SPDX-License-Identifier: Apache-2.0

use certval_model::CertNo;
use certval_server::{
    DecisionConfig, DecisionCoordinator, DecisionError, FakePhoenix, RejectCommand,
};
use certval_store::MemoryCertificateStore;
use serde_json::Value;
use std::io;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn partial_failure_is_logged_as_structured_error() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_max_level(Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = Arc::new(MemoryCertificateStore::default());
    store.fail_validation_inserts.store(true, Ordering::SeqCst);
    let phoenix = Arc::new(FakePhoenix::default());
    let coordinator = DecisionCoordinator::new(store, phoenix.clone(), DecisionConfig::default());

    let err = coordinator
        .reject(RejectCommand {
            cert_no: CertNo::parse("CAL-300").expect("cert"),
            reviewer: "alice".to_string(),
            calibration_id: Some("EXT-300".to_string()),
            comment: Some("drift".to_string()),
            tolerance_errors: None,
            cmc_errors: None,
            requirements_errors: None,
        })
        .await
        .expect_err("insert fails");
    assert!(matches!(err, DecisionError::Persistence { .. }));
    assert_eq!(phoenix.reject_call_count(), 1);

    let bytes = sink.0.lock().expect("lock output").clone();
    let text = String::from_utf8(bytes).expect("utf8 log output");
    let events: Vec<Value> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("json log line"))
        .collect();
    let partial = events
        .iter()
        .find(|e| e["level"] == "ERROR" && e["fields"]["partial_failure"] == true)
        .expect("partial failure event");
    assert_eq!(partial["fields"]["stage"], "insert");
    assert_eq!(partial["span"]["cert_no"], "CAL-300");
}
