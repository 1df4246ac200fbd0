//! FileInjector — shims served from a local directory.
//!
//! The common deployment: shims ship next to the application and the base
//! path is a filesystem directory. Reads never block the runtime; execution
//! happens inline once the bytes arrive.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::error::InjectError;
use super::{Executor, Injector};

/// Injector that reads each resolved address as a file path.
pub struct FileInjector {
    executor: Arc<dyn Executor>,
    // Held while executing in ordered mode so shims run one at a time.
    exec_gate: Mutex<()>,
}

impl FileInjector {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            exec_gate: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Injector for FileInjector {
    async fn inject(&self, address: &str, ordered: bool) -> Result<(), InjectError> {
        let bytes = tokio::fs::read(address)
            .await
            .map_err(|e| InjectError::Fetch {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        let _guard = if ordered {
            Some(self.exec_gate.lock().await)
        } else {
            None
        };
        self.executor
            .execute(address, &bytes)
            .map_err(|reason| InjectError::Execute {
                address: address.to_string(),
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Records every executed (address, byte length) pair.
    struct RecordingExecutor {
        executed: StdMutex<Vec<(String, usize)>>,
    }

    impl RecordingExecutor {
        fn new() -> Self {
            Self {
                executed: StdMutex::new(Vec::new()),
            }
        }
    }

    impl Executor for RecordingExecutor {
        fn execute(&self, address: &str, bytes: &[u8]) -> Result<(), String> {
            self.executed
                .lock()
                .unwrap()
                .push((address.to_string(), bytes.len()));
            Ok(())
        }
    }

    /// Always refuses to execute.
    struct RefusingExecutor;

    impl Executor for RefusingExecutor {
        fn execute(&self, _address: &str, _bytes: &[u8]) -> Result<(), String> {
            Err("host rejected shim".into())
        }
    }

    #[tokio::test]
    async fn reads_and_executes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fetch.js");
        std::fs::write(&path, b"self.fetch = shim;").unwrap();

        let executor = Arc::new(RecordingExecutor::new());
        let injector = FileInjector::new(executor.clone());

        let address = path.to_string_lossy().into_owned();
        injector.inject(&address, true).await.unwrap();

        let executed = executor.executed.lock().unwrap();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].0, address);
        assert_eq!(executed[0].1, 18);
    }

    #[tokio::test]
    async fn missing_file_is_a_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let address = dir
            .path()
            .join("no-such-shim.js")
            .to_string_lossy()
            .into_owned();

        let injector = FileInjector::new(Arc::new(RecordingExecutor::new()));
        let err = injector.inject(&address, false).await.unwrap_err();
        match err {
            InjectError::Fetch { address: a, .. } => assert_eq!(a, address),
            other => panic!("expected Fetch error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn executor_refusal_is_an_execute_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promise.js");
        std::fs::write(&path, b"shim").unwrap();

        let injector = FileInjector::new(Arc::new(RefusingExecutor));
        let address = path.to_string_lossy().into_owned();
        let err = injector.inject(&address, false).await.unwrap_err();
        match err {
            InjectError::Execute { reason, .. } => assert_eq!(reason, "host rejected shim"),
            other => panic!("expected Execute error, got: {other}"),
        }
    }
}
