//! Connection management.
//!
//! A [`Connection`] owns one TCP socket to the device and a background
//! reader task:
//!
//! ```text
//! execute() --encode--> write half ----------------------------> device
//! device --> read half --> read_loop --decode--> dispatch --+--> pending answer --> execute()
//!                                                           +--> notification subscribers
//! ```
//!
//! Read failures are retried forever with a fixed delay between attempts.
//! A malformed frame, or a frame kind the device must not send, resets the
//! socket once and reading resumes on the new one.

use crate::error::ClientError;
use bravia_protocol::{CommandCode, Frame, FrameKind, ProtocolError, FRAME_LEN};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot, watch, Mutex};
use tokio::task::JoinHandle;

/// Default answer deadline for a single command (2 s).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Default dial timeout (5 s).
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Default delay before redialing after a read failure (5 s).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Default number of back-to-back desync reconnects before throttling.
pub const DEFAULT_MAX_CONSECUTIVE_DESYNCS: u32 = 8;

/// Default capacity of the notification channel.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Device address as `host:port`.
    pub addr: String,
    /// Dial timeout.
    pub dial_timeout: Duration,
    /// Answer deadline for a single command.
    pub command_timeout: Duration,
    /// Delay before each redial after a read failure.
    pub retry_delay: Duration,
    /// Desync reconnects allowed back to back before each further one
    /// waits `retry_delay` first.
    pub max_consecutive_desyncs: u32,
    /// Notifications buffered per subscriber before it starts lagging.
    pub notification_capacity: usize,
}

impl ConnectionConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_consecutive_desyncs: DEFAULT_MAX_CONSECUTIVE_DESYNCS,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_max_consecutive_desyncs(mut self, max: u32) -> Self {
        self.max_consecutive_desyncs = max;
        self
    }

    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity.max(1);
        self
    }
}

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// Terminal; reached only through [`Connection::close`].
    Closed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

/// Write half of the current socket, tagged with its generation.
struct Link {
    generation: u64,
    writer: OwnedWriteHalf,
}

/// Read half of the current socket, owned by the reader task.
struct Inbound {
    generation: u64,
    reader: OwnedReadHalf,
}

/// The single outstanding request waiting for its answer.
struct PendingAnswer {
    generation: u64,
    command: CommandCode,
    tx: oneshot::Sender<Frame>,
}

/// Dials the device once, bounded by `timeout`.
pub async fn dial(addr: &str, timeout: Duration) -> Result<TcpStream, ClientError> {
    tracing::debug!("Connecting to {}...", addr);

    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| ClientError::DialTimeout {
            addr: addr.to_string(),
            timeout,
        })?
        .map_err(|e| ClientError::Dial {
            addr: addr.to_string(),
            source: e,
        })?;

    // Frames are tiny; don't let Nagle hold them back
    stream.set_nodelay(true).ok();

    Ok(stream)
}

/// A reconnecting connection to one device.
pub struct Connection {
    config: ConnectionConfig,
    /// Write half of the current socket; `None` while disconnected.
    writer: Mutex<Option<Link>>,
    /// Incremented each time a new socket is installed.
    generation: AtomicU64,
    /// Serializes `execute` calls.
    gate: Mutex<()>,
    pending: parking_lot::Mutex<Option<PendingAnswer>>,
    /// Notification fan-out; taken on close so subscribers see the end.
    notifications: parking_lot::Mutex<Option<broadcast::Sender<Frame>>>,
    state: watch::Sender<ConnectionState>,
    started: AtomicBool,
    reader_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Creates a new connection (not yet connected).
    pub fn new(config: ConnectionConfig) -> Self {
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            writer: Mutex::new(None),
            generation: AtomicU64::new(0),
            gate: Mutex::new(()),
            pending: parking_lot::Mutex::new(None),
            notifications: parking_lot::Mutex::new(Some(notifications)),
            state,
            started: AtomicBool::new(false),
            reader_task: parking_lot::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn is_closed(&self) -> bool {
        self.state().is_closed()
    }

    /// Subscribes to notify frames, including the connectivity
    /// pseudo-notifications emitted on every connect and disconnect.
    ///
    /// Frames published while nobody is subscribed are dropped. After
    /// close the receiver reports `Closed`.
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        match self.notifications.lock().as_ref() {
            Some(tx) => tx.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Dials the device and starts the background reader.
    ///
    /// Fails if the first dial fails; once started, the reader keeps
    /// redialing on its own until [`close`](Self::close).
    pub async fn start(self: &Arc<Self>) -> Result<(), ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("start() called on a running connection");
            return Ok(());
        }

        let inbound = match self.open().await {
            Ok(inbound) => inbound,
            Err(e) => {
                self.started.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let task = tokio::spawn(Arc::clone(self).read_loop(inbound));
        *self.reader_task.lock() = Some(task);
        Ok(())
    }

    async fn open(&self) -> Result<Inbound, ClientError> {
        let stream = dial(&self.config.addr, self.config.dial_timeout).await?;
        self.attach(stream).await
    }

    /// Installs a freshly dialed socket as the current one.
    async fn attach(&self, stream: TcpStream) -> Result<Inbound, ClientError> {
        let (reader, writer) = stream.into_split();
        let generation = {
            let mut guard = self.writer.lock().await;
            if self.is_closed() {
                return Err(ClientError::Closed);
            }
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *guard = Some(Link { generation, writer });
            generation
        };

        self.set_state(ConnectionState::Connected);
        tracing::info!("Connected to {} (generation {})", self.config.addr, generation);
        self.publish(Frame::connection(true));

        Ok(Inbound { generation, reader })
    }

    /// Releases the current socket's write half and abandons the
    /// outstanding request, whose answer can no longer arrive.
    ///
    /// After a read failure this runs only once `retry_delay` has passed;
    /// until then the state stays `Connected` and requests are still
    /// written to the old socket, failing with `Write` or `Timeout`.
    async fn detach(&self) {
        drop(self.writer.lock().await.take());

        if let Some(pending) = self.pending.lock().take() {
            tracing::debug!("Abandoning request {} on disconnect", pending.command);
        }

        self.set_state(ConnectionState::Disconnected);
        self.publish(Frame::connection(false));
    }

    /// One reconnect attempt: drop the current socket, dial, install.
    async fn reconnect(&self) -> Result<Inbound, ClientError> {
        self.detach().await;
        self.open().await
    }

    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|state| {
            if state.is_closed() || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    fn publish(&self, frame: Frame) {
        if let Some(tx) = self.notifications.lock().as_ref() {
            // Err only means nobody is subscribed
            let _ = tx.send(frame);
        }
    }

    /// Reads frames until the connection is closed.
    async fn read_loop(self: Arc<Self>, inbound: Inbound) {
        tracing::debug!("read_loop started");
        let mut state = self.state.subscribe();
        let mut inbound = Some(inbound);
        let mut buf = [0u8; FRAME_LEN];
        let mut desyncs: u32 = 0;

        loop {
            let Some(current) = inbound.as_mut() else {
                if !self.pause(self.config.retry_delay, &mut state).await {
                    break;
                }
                inbound = self.redial(&mut state).await;
                continue;
            };
            let generation = current.generation;

            let read = tokio::select! {
                _ = wait_closed(&mut state) => break,
                read = current.reader.read_exact(&mut buf) => read,
            };

            if let Err(e) = read {
                tracing::warn!("read_loop: read failed: {}", e);
                inbound = None;
                continue;
            }

            match Frame::decode(&buf).and_then(|frame| self.dispatch(frame, generation)) {
                Ok(()) => desyncs = 0,
                Err(e) if !e.is_desync() => {
                    tracing::warn!("read_loop: dropping frame: {}", e);
                }
                Err(e) => {
                    desyncs = desyncs.saturating_add(1);
                    tracing::warn!("read_loop: stream desynchronized ({}), reconnecting", e);
                    inbound = None;

                    if desyncs > self.config.max_consecutive_desyncs {
                        tracing::error!(
                            "read_loop: {} consecutive malformed frames, throttling reconnects",
                            desyncs
                        );
                        if !self.pause(self.config.retry_delay, &mut state).await {
                            break;
                        }
                    }
                    inbound = self.redial(&mut state).await;
                }
            }
        }

        tracing::debug!("read_loop stopped");
    }

    /// Sleeps for `delay`; returns false if the connection closed meanwhile.
    async fn pause(&self, delay: Duration, state: &mut watch::Receiver<ConnectionState>) -> bool {
        tokio::select! {
            _ = wait_closed(state) => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    async fn redial(&self, state: &mut watch::Receiver<ConnectionState>) -> Option<Inbound> {
        tokio::select! {
            _ = wait_closed(state) => None,
            result = self.reconnect() => match result {
                Ok(inbound) => Some(inbound),
                Err(e) => {
                    tracing::warn!("Reconnect to {} failed: {}", self.config.addr, e);
                    None
                }
            },
        }
    }

    /// Routes one decoded frame. Any kind other than answer or notify
    /// means the stream can't be trusted.
    fn dispatch(&self, frame: Frame, generation: u64) -> Result<(), ProtocolError> {
        match frame.kind {
            FrameKind::Notify => {
                tracing::debug!("read_loop: notification {}", frame);
                self.publish(frame);
                Ok(())
            }
            FrameKind::Answer => {
                self.deliver(frame, generation);
                Ok(())
            }
            other => Err(ProtocolError::UnexpectedFrameKind(other.as_byte())),
        }
    }

    fn deliver(&self, frame: Frame, generation: u64) {
        let mut slot = self.pending.lock();
        match slot.take() {
            Some(pending) if pending.generation == generation && pending.command == frame.command => {
                tracing::debug!("read_loop: dispatching answer {}", frame);
                let _ = pending.tx.send(frame);
            }
            Some(pending) => {
                tracing::warn!(
                    "read_loop: discarding stray answer {} while waiting for {}",
                    frame,
                    pending.command
                );
                *slot = Some(pending);
            }
            None => {
                tracing::debug!("read_loop: no request waiting, discarding answer {}", frame);
            }
        }
    }

    /// Sends a frame and waits for the device's answer.
    ///
    /// Calls are serialized: a second caller waits until the first one has
    /// its answer or has timed out. The returned frame is the raw answer;
    /// interpret it with the frame accessors.
    pub async fn execute(&self, frame: &Frame) -> Result<Frame, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let _gate = self.gate.lock().await;
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let encoded = frame.encode();
        let (tx, rx) = oneshot::channel();
        {
            let mut writer_guard = self.writer.lock().await;
            let link = writer_guard.as_mut().ok_or(ClientError::NotConnected)?;

            // Armed before writing so a fast answer can't slip past; the
            // closed check sits under the slot lock so shutdown() either is
            // seen here or drops this request
            {
                let mut slot = self.pending.lock();
                if self.is_closed() {
                    return Err(ClientError::Closed);
                }
                *slot = Some(PendingAnswer {
                    generation: link.generation,
                    command: frame.command,
                    tx,
                });
            }

            tracing::debug!("Sending {}", frame);
            let written =
                tokio::time::timeout(self.config.command_timeout, link.writer.write_all(&encoded))
                    .await
                    .unwrap_or_else(|_| {
                        Err(std::io::Error::new(
                            std::io::ErrorKind::TimedOut,
                            "write timed out",
                        ))
                    });
            if let Err(e) = written {
                self.pending.lock().take();
                return Err(ClientError::Write(e));
            }
        }

        match tokio::time::timeout(self.config.command_timeout, rx).await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(_)) if self.is_closed() => Err(ClientError::Closed),
            Ok(Err(_)) => Err(ClientError::ConnectionClosed),
            Err(_) => {
                tracing::debug!("Request {} timed out", frame.command);
                self.pending.lock().take();
                Err(ClientError::Timeout)
            }
        }
    }

    /// Marks the connection closed without waiting for the reader task.
    ///
    /// Returns false if it was already closed.
    pub fn shutdown(&self) -> bool {
        let was_open = self.state.send_if_modified(|state| {
            if state.is_closed() {
                return false;
            }
            *state = ConnectionState::Closed;
            true
        });

        if was_open {
            // Unblocks an outstanding execute() and ends subscriber streams
            self.pending.lock().take();
            self.notifications.lock().take();
        }
        was_open
    }

    /// Closes the connection and stops the reader task.
    pub async fn close(&self) -> Result<(), ClientError> {
        if !self.shutdown() {
            return Ok(());
        }
        tracing::debug!("Closing connection...");

        let link = self.writer.lock().await.take();
        if let Some(mut link) = link {
            let _ = link.writer.shutdown().await;
        }

        let task = self.reader_task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }

        tracing::debug!("Connection closed");
        Ok(())
    }
}

async fn wait_closed(state: &mut watch::Receiver<ConnectionState>) {
    loop {
        if state.borrow_and_update().is_closed() {
            return;
        }
        if state.changed().await.is_err() {
            return;
        }
    }
}
