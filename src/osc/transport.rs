//! UDP transport for outgoing OSC messages
//!
//! Owns exactly one connected socket for the current sender endpoint. The
//! socket lives behind a mutex so a reconfiguration can never race a send onto
//! a half-closed socket, and so sends leave in the order they were issued.

use parking_lot::{Mutex, RwLock};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use super::OscMessage;

/// Callback type for transport status changes
pub type StatusCallback = Arc<dyn Fn(TransportStatus) + Send + Sync>;

/// Errors raised while opening the sender socket
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("{host}:{port} did not resolve to any address")]
    NoAddress { host: String, port: u16 },
    #[error("failed to bind local UDP socket: {0}")]
    Bind(#[source] std::io::Error),
    #[error("failed to connect UDP socket to {target}: {source}")]
    Connect {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Operator-facing transport state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportStatus {
    /// No sender IP/port set; sends are dropped
    Unconfigured,
    /// Socket open towards the endpoint
    Configured { host: String, port: u16 },
    /// Socket could not be opened; sends are dropped
    Failed {
        host: String,
        port: u16,
        reason: String,
    },
}

impl TransportStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, TransportStatus::Configured { .. })
    }
}

impl std::fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportStatus::Unconfigured => write!(
                f,
                "Defaults not set! Configure a SetDefaults button to set OSC ip and port"
            ),
            TransportStatus::Configured { host, port } => {
                write!(f, "Default set to {}:{}", host, port)
            },
            TransportStatus::Failed { host, port, reason } => {
                write!(f, "OSC Sender failed to start! IP:{} PORT:{} ({})", host, port, reason)
            },
        }
    }
}

struct Connection {
    socket: UdpSocket,
    target: SocketAddr,
}

impl Connection {
    /// Bind a local socket of the target's family and connect it
    fn open(target: SocketAddr) -> Result<Self, TransportError> {
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).map_err(TransportError::Bind)?;
        socket
            .connect(target)
            .map_err(|source| TransportError::Connect { target, source })?;

        Ok(Self { socket, target })
    }
}

/// Resolve `host:port` on the calling thread (may block on DNS)
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;
    addrs.next().ok_or_else(|| TransportError::NoAddress {
        host: host.to_string(),
        port,
    })
}

/// Resolve `host:port` without blocking the runtime
pub async fn resolve_async(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;
    addrs.next().ok_or_else(|| TransportError::NoAddress {
        host: host.to_string(),
        port,
    })
}

fn is_unset(host: &str, port: u16) -> bool {
    host.is_empty() || port == 0
}

/// Fire-and-forget OSC sender
pub struct Transport {
    connection: Mutex<Option<Connection>>,
    status: RwLock<TransportStatus>,
    status_callbacks: RwLock<Vec<StatusCallback>>,
}

impl Transport {
    /// Create an unconfigured transport (all sends are no-ops)
    pub fn new() -> Self {
        Self {
            connection: Mutex::new(None),
            status: RwLock::new(TransportStatus::Unconfigured),
            status_callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Close any existing socket and open one towards `host:port`
    ///
    /// An empty host or a zero port leaves the transport unconfigured. Open
    /// failures are reported through the returned status, never as an error.
    /// Name resolution blocks the caller but not concurrent sends.
    pub fn configure(&self, host: &str, port: u16) -> TransportStatus {
        let target = if is_unset(host, port) {
            None
        } else {
            Some(resolve(host, port))
        };
        self.install(host, port, target)
    }

    /// [`Transport::configure`] with name resolution on the tokio resolver
    pub async fn configure_async(&self, host: &str, port: u16) -> TransportStatus {
        let target = if is_unset(host, port) {
            None
        } else {
            Some(resolve_async(host, port).await)
        };
        self.install(host, port, target)
    }

    /// Swap the socket for one towards an already resolved target
    ///
    /// `None` means no endpoint is set.
    fn install(
        &self,
        host: &str,
        port: u16,
        target: Option<Result<SocketAddr, TransportError>>,
    ) -> TransportStatus {
        let opened = target.map(|target| target.and_then(Connection::open));

        let status = {
            let mut connection = self.connection.lock();
            if let Some(old) = connection.take() {
                debug!("Closing OSC sender socket to {}", old.target);
            }

            match opened {
                None => TransportStatus::Unconfigured,
                Some(Ok(conn)) => {
                    info!("OSC sender ready: {} -> {}", host, conn.target);
                    *connection = Some(conn);
                    TransportStatus::Configured {
                        host: host.to_string(),
                        port,
                    }
                },
                Some(Err(e)) => {
                    error!("OSC sender failed to start: {}", e);
                    TransportStatus::Failed {
                        host: host.to_string(),
                        port,
                        reason: e.to_string(),
                    }
                },
            }
        };

        self.emit_status(status.clone());
        status
    }

    /// Send one message; returns whether a datagram was handed to the OS
    ///
    /// A no-op when unconfigured. Encoding and socket errors are logged and
    /// swallowed so they never reach the dispatch path.
    pub fn send(&self, message: &OscMessage) -> bool {
        let packet = match message.encode() {
            Ok(packet) => packet,
            Err(e) => {
                warn!(address = %message.address, "Dropping OSC message: {}", e);
                return false;
            },
        };

        let connection = self.connection.lock();
        let Some(conn) = connection.as_ref() else {
            trace!(address = %message.address, "OSC transport unconfigured, message dropped");
            return false;
        };

        match conn.socket.send(&packet) {
            Ok(_) => {
                debug!("→ OSC {} {}", message.address, message.arg);
                trace!(target_addr = %conn.target, "packet {}", hex::encode(&packet));
                true
            },
            Err(e) => {
                warn!(address = %message.address, "Failed to send OSC message: {}", e);
                false
            },
        }
    }

    /// Release the socket
    pub fn close(&self) {
        let closed = self.connection.lock().take();
        if let Some(conn) = closed {
            info!("OSC sender to {} closed", conn.target);
            self.emit_status(TransportStatus::Unconfigured);
        }
    }

    /// Current status
    pub fn status(&self) -> TransportStatus {
        self.status.read().clone()
    }

    /// Local address of the open socket, if any
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.connection
            .lock()
            .as_ref()
            .and_then(|conn| conn.socket.local_addr().ok())
    }

    /// Subscribe to status changes
    pub fn subscribe_status(&self, callback: StatusCallback) {
        self.status_callbacks.write().push(callback);
    }

    /// Store and publish a status, once per change
    fn emit_status(&self, status: TransportStatus) {
        {
            let mut current = self.status.write();
            if *current == status {
                return;
            }
            *current = status.clone();
        }
        // Callbacks may subscribe or query the transport
        let callbacks = self.status_callbacks.read().clone();
        for callback in callbacks {
            callback(status.clone());
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
