//! HttpInjector — shims fetched from a remote host.
//!
//! No pipeline awareness — just GETs the address via reqwest and hands the
//! body to the executor. Transport errors and non-2xx statuses are fetch
//! failures; the response body is never executed on a bad status.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;

use super::error::InjectError;
use super::{Executor, Injector};

/// Injector that treats each resolved address as an HTTP(S) URL.
pub struct HttpInjector {
    http: Client,
    executor: Arc<dyn Executor>,
    exec_gate: Mutex<()>,
}

impl HttpInjector {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self::with_client(Client::new(), executor)
    }

    /// Build with a preconfigured client (timeouts, proxies, test servers).
    pub fn with_client(http: Client, executor: Arc<dyn Executor>) -> Self {
        Self {
            http,
            executor,
            exec_gate: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Injector for HttpInjector {
    async fn inject(&self, address: &str, ordered: bool) -> Result<(), InjectError> {
        let response = self
            .http
            .get(address)
            .send()
            .await
            .map_err(|e| InjectError::Fetch {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(InjectError::Fetch {
                address: address.to_string(),
                reason: format!("status {status}"),
            });
        }

        let bytes = response.bytes().await.map_err(|e| InjectError::Fetch {
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
