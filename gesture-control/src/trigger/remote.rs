//! Remote mode notifications
//!
//! An external device (a BLE microcontroller behind a serial/TCP bridge)
//! sends one UTF-8 message per line: `Gesture Mode ON` or
//! `Gesture Mode OFF`. The transport here is a plain TCP connection that is
//! re-established with a fixed delay whenever it fails or closes.
//!
//! The async side runs on a current-thread tokio runtime owned by a
//! dedicated thread, and hands commands to the controller through an SPSC
//! ring.

use super::ring_buffer::TriggerProducer;
use super::types::ModeCommand;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default delay between connection attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Handle to the remote listener thread
pub struct RemoteListener {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl RemoteListener {
    /// Start listening to `address` (`host:port`).
    ///
    /// # Errors
    /// Returns `Error::Trigger` if the runtime or the thread cannot be
    /// created. Connection failures are not errors: they are retried.
    pub fn spawn(
        address: String,
        retry_delay: Duration,
        producer: TriggerProducer<ModeCommand>,
    ) -> crate::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| crate::Error::Trigger(format!("failed to create remote trigger runtime: {}", e)))?;
        let (shutdown, shutdown_rx) = watch::channel(false);

        let handle = thread::Builder::new()
            .name("remote-trigger".into())
            .spawn(move || {
                runtime.block_on(run_remote(address, retry_delay, producer, shutdown_rx));
            })
            .map_err(|e| crate::Error::Trigger(format!("failed to spawn remote listener: {}", e)))?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Stop the connection loop and wait for the thread.
    pub fn shutdown(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            debug!("Remote listener stopped");
        }
    }
}

impl Drop for RemoteListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Connect, read, reconnect, until `shutdown` flips to true or its sender
/// is dropped.
pub async fn run_remote(
    address: String,
    retry_delay: Duration,
    mut producer: TriggerProducer<ModeCommand>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Remote trigger listening via {}", address);
    loop {
        if *shutdown.borrow() {
            break;
        }

        match TcpStream::connect(address.as_str()).await {
            Ok(stream) => {
                info!("Connected to remote trigger {}", address);
                tokio::select! {
                    result = read_messages(BufReader::new(stream), &mut producer) => match result {
                        Ok(count) => info!("Remote trigger {} disconnected after {} commands", address, count),
                        Err(e) => warn!("Remote trigger {} read failed: {}", address, e),
                    },
                    _ = shutdown.changed() => break,
                }
            }
            Err(e) => warn!("Remote trigger {} unreachable: {}", address, e),
        }

        debug!("Reconnecting to {} in {:?}", address, retry_delay);
        tokio::select! {
            _ = tokio::time::sleep(retry_delay) => {}
            _ = shutdown.changed() => break,
        }
    }
}

/// Read line messages until EOF, pushing recognised commands.
/// Returns the number of commands accepted.
pub async fn read_messages<R>(reader: R, producer: &mut TriggerProducer<ModeCommand>) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut accepted = 0;
    while let Some(line) = lines.next_line().await? {
        match ModeCommand::from_remote(&line) {
            Some(command) => {
                info!("Remote message: {}", line.trim());
                if producer.push(command) {
                    accepted += 1;
                } else {
                    warn!("Trigger queue full, dropped remote command {}", command);
                }
            }
            None if line.trim().is_empty() => {}
            None => warn!("Ignoring unknown remote message {:?}", line),
        }
    }
    Ok(accepted)
}
