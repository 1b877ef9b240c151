//! Tunnel-entry lifecycle control
//!
//! Starting an entry is asynchronous: the serve task can fail, and
//! reachability is signalled independently of it. [`TunnelProxy::start`]
//! races the two against a fixed bound so a start that never completes
//! its network handshake cannot hang the run, and a start error is never
//! misread as success.

use crate::defaults;
use crate::error::{AppError, Result};
use crate::tunnel::{DirectEntry, EntryConfig, Service, ServiceInfo, TunnelEntry};
use crate::wallet::{Account, Wallet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Lifecycle states of a proxy handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    Constructed,
    Starting,
    Connected,
    Failed,
    Stopped,
}

/// Owns one tunnel entry for the duration of one measurement iteration
pub struct TunnelProxy {
    entry: Arc<dyn TunnelEntry>,
    port: u16,
    state: Mutex<ProxyState>,
    stopped: AtomicBool,
    serve_task: tokio::sync::Mutex<Option<JoinHandle<Result<()>>>>,
}

impl TunnelProxy {
    /// Construct a proxy around a loopback entry on `port`, with the
    /// entry identity derived from the wallet seed.
    pub fn new(seed: &[u8], port: u16) -> Result<Self> {
        let service = Service {
            name: defaults::SERVICE_NAME.to_string(),
            tcp: vec![port],
            encryption: defaults::SERVICE_ENCRYPTION.to_string(),
        };
        let service_info = ServiceInfo {
            listen_ip: defaults::LISTEN_IP,
            max_price: defaults::MAX_PRICE.to_string(),
        };
        let mut config = EntryConfig::default();
        config
            .services
            .insert(service.name.clone(), service_info.clone());

        let account = Account::from_seed(seed)?;
        let wallet = Wallet::from_account(account)?;
        let entry = DirectEntry::new(service, service_info, wallet, config)?;

        Ok(Self::with_entry(Arc::new(entry), port))
    }

    /// Wrap an already-built entry (relay-backed entries enter here)
    pub fn with_entry(entry: Arc<dyn TunnelEntry>, port: u16) -> Self {
        Self {
            entry,
            port,
            state: Mutex::new(ProxyState::Constructed),
            stopped: AtomicBool::new(false),
            serve_task: tokio::sync::Mutex::new(None),
        }
    }

    /// Start the entry, bounded by [`defaults::CONNECT_TIMEOUT`].
    ///
    /// First of three outcomes wins: the serve task returns (its result
    /// is taken verbatim), the connect signal fires (success; the serve
    /// task keeps running in the background), or the bound elapses
    /// (`ConnectTimeout`). The losing branches are abandoned, never
    /// reported.
    pub async fn start(&self) -> Result<()> {
        self.set_state(ProxyState::Starting);

        let mut connected = self.entry.connect_signal();
        let entry = self.entry.clone();
        let mut serve_task = tokio::spawn(async move { entry.start().await });

        let (outcome, serve_finished) = tokio::select! {
            served = &mut serve_task => {
                let result = match served {
                    Ok(result) => result,
                    Err(e) => Err(AppError::internal(format!("entry serve task failed: {}", e))),
                };
                (result, true)
            }
            changed = connected.wait_for(|reachable| *reachable) => {
                let result = match changed {
                    Ok(_) => Ok(()),
                    Err(_) => Err(AppError::network("entry dropped its connect signal")),
                };
                (result, false)
            }
            _ = tokio::time::sleep(defaults::CONNECT_TIMEOUT) => {
                (Err(AppError::connect_timeout("tunnel connect timeout")), false)
            }
        };

        // A still-running serve task is reaped by stop(); a finished one
        // must not be polled again
        if !serve_finished {
            *self.serve_task.lock().await = Some(serve_task);
        }

        match outcome {
            Ok(()) => {
                self.set_state(ProxyState::Connected);
                Ok(())
            }
            Err(e) => {
                self.set_state(ProxyState::Failed);
                Err(e)
            }
        }
    }

    /// Stop the entry and reap its serve task. Idempotent; safe to call
    /// whether or not `start` succeeded.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.entry.close().await;
        if let Some(mut task) = self.serve_task.lock().await.take() {
            // close() ends the serve loop; don't wait forever on an
            // entry that ignores it
            if tokio::time::timeout(Duration::from_secs(5), &mut task)
                .await
                .is_err()
            {
                task.abort();
            }
        }
        self.set_state(ProxyState::Stopped);
    }

    /// Current lifecycle state
    pub fn state(&self) -> ProxyState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(ProxyState::Failed)
    }

    /// Local port the entry serves on
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Identity the entry presents to relays
    pub fn identity(&self) -> String {
        self.entry.identity().to_string()
    }

    fn set_state(&self, next: ProxyState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }
}
