// UDP Listener for logged ADIF
// Listens on configurable address (default 0.0.0.0:2237) and relays each
// datagram as one contact record
//
// Datagrams are handled strictly one at a time in arrival order: normalize,
// deliver with retry, then receive the next. A slow sink holds up the queue.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::UdpSocket;

use crate::contact::{Clock, NormalizeError, Normalizer, SystemClock};
use crate::delivery::{deliver_with_retry, DeliveryError, RecordSink, RetryPolicy};

/// How long a receive may block before the running flag is checked again
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause after an unexpected receive error
const ERROR_PAUSE: Duration = Duration::from_secs(1);

const RECV_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Listener state that can be shared with a signal handler
pub struct ListenerState {
    running: AtomicBool,
}

impl ListenerState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, value: bool) {
        self.running.store(value, Ordering::SeqCst);
    }

    /// Ask the loop to exit once the current datagram is done
    pub fn stop(&self) {
        self.set_running(false);
    }
}

impl Default for ListenerState {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to one datagram
#[derive(Debug)]
pub enum DatagramOutcome {
    Delivered { attempts: u32 },
    Rejected(NormalizeError),
    Dropped(DeliveryError),
}

/// Receive loop: UDP socket → Normalizer → RecordSink
pub struct IngestLoop<S, C = SystemClock> {
    socket: UdpSocket,
    normalizer: Normalizer<C>,
    sink: S,
    retry: RetryPolicy,
    state: Arc<ListenerState>,
    recv_timeout: Duration,
}

impl<S: RecordSink, C: Clock> IngestLoop<S, C> {
    /// Bind the socket and mark the listener running
    pub async fn bind(
        addr: &str,
        normalizer: Normalizer<C>,
        sink: S,
        retry: RetryPolicy,
        state: Arc<ListenerState>,
    ) -> Result<Self, ListenerError> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| ListenerError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        log::info!("UDP listener started on {}", addr);
        state.set_running(true);

        Ok(Self {
            socket,
            normalizer,
            sink,
            retry,
            state,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        })
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    #[cfg(test)]
    fn sink(&self) -> &S {
        &self.sink
    }

    /// Run until the shared state is stopped
    pub async fn run(&self) {
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        while self.state.is_running() {
            let received = tokio::time::timeout(self.recv_timeout, self.socket.recv_from(&mut buf)).await;

            match received {
                // Timeout - just loop around and check the running flag
                Err(_) => continue,
                Ok(Ok((len, src))) => {
                    log::debug!("Received {} bytes from {}", len, src);
                    self.handle_datagram(&buf[..len]).await;
                }
                Ok(Err(e)) => {
                    log::error!("UDP receive error: {}", e);
                    tokio::time::sleep(ERROR_PAUSE).await;
                }
            }
        }

        log::info!("UDP listener stopped");
    }

    /// Normalize and deliver a single datagram
    pub async fn handle_datagram(&self, data: &[u8]) -> DatagramOutcome {
        let adif = String::from_utf8_lossy(data);
        log::debug!("ADIF: {}...", adif.chars().take(100).collect::<String>());

        let record = match self.normalizer.normalize(&adif) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping datagram: {}", e);
                return DatagramOutcome::Rejected(e);
            }
        };

        match deliver_with_retry(&self.sink, &record, &self.retry).await {
            Ok(attempts) => DatagramOutcome::Delivered { attempts },
            Err(e) => {
                log::error!(
                    "Failed to log contact {} after {} attempts: {}",
                    record.contacted_callsign,
                    self.retry.attempts,
                    e
                );
                DatagramOutcome::Dropped(e)
            }
        }
    }
}
