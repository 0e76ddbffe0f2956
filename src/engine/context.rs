//! Shared context handed to every action

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info};

use super::MomentaryScheduler;
use crate::config::SenderSettings;
use crate::osc::{OscMessage, Transport, TransportStatus};
use crate::render::FeedbackRenderer;
use crate::state::AddressStore;

/// Notification published after every state mutation
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChanged {
    /// Action that caused the change (e.g. "ButtonOSC")
    pub action: String,
    pub address: String,
    pub value: Decimal,
}

/// Callback type for value-change notifications
///
/// Feedback layers subscribe to refresh the image of every control bound to
/// the changed address.
pub type ChangeListener = Arc<dyn Fn(&ValueChanged) + Send + Sync>;

/// Everything an action may touch while handling a host call
///
/// Cloning is cheap; all members are shared handles.
#[derive(Clone)]
pub struct ActionContext {
    pub store: AddressStore,
    pub transport: Arc<Transport>,
    pub scheduler: MomentaryScheduler,
    pub renderer: Arc<FeedbackRenderer>,
    /// Delay before a momentary pulse returns to rest
    pub momentary_delay: Duration,
    /// Where sender settings are persisted (None: in-memory only)
    pub data_dir: Option<PathBuf>,
    runtime: Handle,
    listeners: Arc<RwLock<Vec<ChangeListener>>>,
    /// Held across resolve and reconfigure so appliers run one at a time
    applied_sender: Arc<AsyncMutex<Option<SenderSettings>>>,
    /// Newest Set Defaults ticket handed out
    defaults_issued: Arc<AtomicU64>,
    /// Newest Set Defaults ticket saved and applied
    defaults_done: Arc<AsyncMutex<u64>>,
}

impl ActionContext {
    pub(crate) fn new(
        runtime: Handle,
        renderer: FeedbackRenderer,
        momentary_delay: Duration,
    ) -> Self {
        Self {
            store: AddressStore::new(),
            transport: Arc::new(Transport::new()),
            scheduler: MomentaryScheduler::new(runtime.clone()),
            renderer: Arc::new(renderer),
            momentary_delay,
            data_dir: None,
            runtime,
            listeners: Arc::new(RwLock::new(Vec::new())),
            applied_sender: Arc::new(AsyncMutex::new(None)),
            defaults_issued: Arc::new(AtomicU64::new(0)),
            defaults_done: Arc::new(AsyncMutex::new(0)),
        }
    }

    /// Send through the shared transport
    pub fn send(&self, message: OscMessage) -> bool {
        self.transport.send(&message)
    }

    /// Publish a value change to every listener
    pub fn notify(&self, action: &str, address: &str, value: Decimal) {
        let event = ValueChanged {
            action: action.to_string(),
            address: address.to_string(),
            value,
        };
        // Listeners may call back into the engine
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener(&event);
        }
    }

    pub(crate) fn subscribe(&self, listener: ChangeListener) {
        self.listeners.write().push(listener);
    }

    /// Run a future on the engine runtime without waiting for it
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(future);
    }

    /// Point the transport at new sender settings
    ///
    /// Settings identical to the ones already applied leave the socket alone.
    /// Name resolution runs on the tokio resolver.
    pub async fn apply_sender_settings(&self, settings: &SenderSettings) -> TransportStatus {
        let mut applied = self.applied_sender.lock().await;
        if applied.as_ref() == Some(settings) {
            debug!("Sender settings unchanged, keeping current socket");
            return self.transport.status();
        }

        info!("Restarting OSC sender");
        if let Some(port) = settings.listener_port {
            debug!("Listener port {} configured (not bound)", port);
        }
        let status = self
            .transport
            .configure_async(&settings.sender_ip, settings.sender_port)
            .await;
        *applied = Some(settings.clone());
        status
    }

    /// Save `settings` to the data directory, then apply them, in the background
    ///
    /// Updates land in call order: one that finds a newer update already
    /// finished is dropped.
    pub fn update_sender_settings(&self, settings: SenderSettings) {
        let ticket = self.defaults_issued.fetch_add(1, Ordering::SeqCst) + 1;
        let ctx = self.clone();

        self.spawn(async move {
            let mut done = ctx.defaults_done.lock().await;
            if *done > ticket {
                debug!(ticket, newest = *done, "Superseded sender defaults skipped");
                return;
            }

            if let Some(dir) = &ctx.data_dir {
                match settings.save(dir).await {
                    Ok(()) => info!("Sender defaults saved to {}", dir.display()),
                    Err(e) => error!("Failed to save sender defaults: {}", e),
                }
            }
            let status = ctx.apply_sender_settings(&settings).await;
            info!("{}", status);
            *done = ticket;
        });
    }
}
