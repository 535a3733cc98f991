//! Protocol dispatcher (§4.3): owns the transport connection, runs the
//! producer and two consumer tasks, routes frames to devices resolved by
//! sender address, answers keep-alives, and owns reconnection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use tokio::task::JoinHandle;

use crate::devices::ecomax::Ecomax;
use crate::devices::ecoster::EcoSter;
use crate::error::{ConnectionError, Error, FrameReadError, ReadError};
use crate::frame::reader::FrameReader;
use crate::frame::writer::FrameWriter;
use crate::frame::{Frame, FrameType, ADDR_ECOMAX, ADDR_ECONET, ADDR_ECOSTER};
use crate::structures::network_info::{self, NetworkInfo};
use crate::structures::version_info::{self, VersionInfo};
use crate::transport::Transport;
use crate::value::{EventDataType, Value};

/// Timeout for establishing the transport connection (§4.3.5).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Delay between a lost connection and the next reconnect attempt (§4.3.5).
pub const RECONNECT_DELAY: Duration = Duration::from_secs(20);

/// A device resolved by sender address (§4.3.2). Only ecoMAX and ecoSTER are
/// addressable on the bus; mixers and thermostats are sub-devices reached
/// through [`Ecomax::mixer`]/[`Ecomax::thermostat`].
#[derive(Clone)]
pub enum DeviceHandle {
    Ecomax(Arc<Ecomax>),
    EcoSter(Arc<EcoSter>),
}

impl DeviceHandle {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceHandle::Ecomax(_) => "ecomax",
            DeviceHandle::EcoSter(_) => "ecoster",
        }
    }

    pub fn as_ecomax(&self) -> Option<&Arc<Ecomax>> {
        match self {
            DeviceHandle::Ecomax(ecomax) => Some(ecomax),
            DeviceHandle::EcoSter(_) => None,
        }
    }

    async fn handle_frame(&self, frame_type: FrameType, message: &[u8]) -> Result<(), Error> {
        match self {
            DeviceHandle::Ecomax(ecomax) => ecomax.handle_frame(frame_type, message).await,
            DeviceHandle::EcoSter(ecoster) => {
                ecoster.handle_data(crate::frames::decode(frame_type, message)?);
                Ok(())
            }
        }
    }

    fn events(&self) -> &Arc<crate::event_manager::EventManager> {
        match self {
            DeviceHandle::Ecomax(ecomax) => &ecomax.device.events,
            DeviceHandle::EcoSter(ecoster) => &ecoster.device.events,
        }
    }

    fn mark_connected(&self) {
        self.events().dispatch_nowait("connected".to_string(), Value::Bool(true));
    }

    fn mark_disconnected(&self) {
        self.events().dispatch_nowait("connected".to_string(), Value::Bool(false));
    }

    async fn shutdown(&self) {
        match self {
            DeviceHandle::Ecomax(ecomax) => ecomax.shutdown().await,
            DeviceHandle::EcoSter(ecoster) => ecoster.shutdown().await,
        }
    }
}

/// The set of devices discovered so far, keyed by bus address (§3.6: created
/// lazily the first time a frame arrives from a new sender).
struct Registry {
    by_address: RwLock<HashMap<u8, DeviceHandle>>,
    registered: Notify,
}

impl Registry {
    fn new() -> Self {
        Self { by_address: RwLock::new(HashMap::new()), registered: Notify::new() }
    }

    async fn get(&self, address: u8) -> Option<DeviceHandle> {
        self.by_address.read().await.get(&address).cloned()
    }

    async fn get_by_name(&self, name: &str) -> Option<DeviceHandle> {
        self.by_address.read().await.values().find(|handle| handle.name() == name).cloned()
    }

    async fn insert(&self, address: u8, handle: DeviceHandle) {
        self.by_address.write().await.insert(address, handle);
        self.registered.notify_waiters();
    }

    async fn all(&self) -> Vec<DeviceHandle> {
        self.by_address.read().await.values().cloned().collect()
    }
}

fn classify_read_error(e: FrameReadError) -> Option<ConnectionError> {
    match e {
        FrameReadError::Read(ReadError::Io(io)) => Some(ConnectionError::Io(io)),
        FrameReadError::Read(ReadError::Timeout) => Some(ConnectionError::Timeout),
        other => {
            log::debug!("dropping malformed frame: {other}");
            None
        }
    }
}

fn classify_write_error(e: Error) -> Option<ConnectionError> {
    match e {
        Error::Read(ReadError::Io(io)) => Some(ConnectionError::Io(io)),
        Error::Timeout => Some(ConnectionError::Timeout),
        other => {
            log::warn!("failed to write frame: {other}");
            None
        }
    }
}

/// Drives the ecoNET bus: (re)connects the transport, runs the producer and
/// consumer tasks, and owns the device registry (§4.3, §4.3.5).
pub struct Dispatcher {
    transport: Box<dyn Transport>,
    network_info: NetworkInfo,
    registry: Registry,
    write_tx: mpsc::UnboundedSender<Frame>,
    write_rx: Arc<Mutex<mpsc::UnboundedReceiver<Frame>>>,
    connected: RwLock<bool>,
    shutdown_signal: Notify,
    shutting_down: AtomicBool,
}

impl Dispatcher {
    pub fn new(transport: Box<dyn Transport>, network_info: NetworkInfo) -> Arc<Self> {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            transport,
            network_info,
            registry: Registry::new(),
            write_tx,
            write_rx: Arc::new(Mutex::new(write_rx)),
            connected: RwLock::new(false),
            shutdown_signal: Notify::new(),
            shutting_down: AtomicBool::new(false),
        })
    }

    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    /// Waits for a device to appear on the bus under `name` (`"ecomax"` or
    /// `"ecoster"`), satisfying §4.3.2's "pending `get_device` waiters".
    pub async fn get_device(&self, name: &str) -> DeviceHandle {
        loop {
            if let Some(handle) = self.registry.get_by_name(name).await {
                return handle;
            }
            let notified = self.registry.registered.notified();
            if let Some(handle) = self.registry.get_by_name(name).await {
                return handle;
            }
            notified.await;
        }
    }

    /// Resolves `address` to its device class via the fixed routing table
    /// (§4.3.2), instantiating and registering it on first contact. Unknown
    /// addresses return `None` and are logged, never treated as fatal.
    async fn ensure_device(&self, address: u8) -> Option<DeviceHandle> {
        if let Some(handle) = self.registry.get(address).await {
            return Some(handle);
        }
        let handle = match address {
            ADDR_ECOMAX => DeviceHandle::Ecomax(Ecomax::new(self.write_tx.clone()).await),
            ADDR_ECOSTER => DeviceHandle::EcoSter(EcoSter::new(address, self.write_tx.clone())),
            _ => return None,
        };
        self.registry.insert(address, handle.clone()).await;
        if let DeviceHandle::Ecomax(ecomax) = &handle {
            let ecomax = ecomax.clone();
            tokio::spawn(async move { ecomax.setup().await });
        }
        Some(handle)
    }

    fn respond_check_device(&self, recipient: u8) {
        let message = network_info::encode(&self.network_info);
        let frame = Frame::from_message(FrameType::ResponseDeviceAvailable, ADDR_ECONET, recipient, message);
        if self.write_tx.send(frame).is_err() {
            log::warn!("write queue closed while answering check-device");
        }
    }

    fn respond_program_version(&self, recipient: u8) {
        let info = VersionInfo { sender: ADDR_ECONET, ..VersionInfo::default() };
        match version_info::encode(&info) {
            Ok(message) => {
                let frame =
                    Frame::from_message(FrameType::ResponseProgramVersion, ADDR_ECONET, recipient, message);
                if self.write_tx.send(frame).is_err() {
                    log::warn!("write queue closed while answering program-version");
                }
            }
            Err(e) => log::warn!("failed to encode program-version response: {e}"),
        }
    }

    /// Routes one frame already read off the wire (§4.3.2).
    async fn route_frame(&self, mut frame: Frame) {
        if frame.frame_type == FrameType::RequestCheckDevice {
            self.respond_check_device(frame.sender);
        } else if frame.frame_type == FrameType::RequestProgramVersion {
            self.respond_program_version(frame.sender);
        }

        let Some(handle) = self.ensure_device(frame.sender).await else {
            log::debug!("unknown device address 0x{:02X}", frame.sender);
            return;
        };

        let message = match frame.message() {
            Ok(message) => message.to_vec(),
            Err(e) => {
                log::warn!("failed to read frame message: {e}");
                return;
            }
        };

        if let Err(e) = handle.handle_frame(frame.frame_type, &message).await {
            log::warn!("{} failed to handle {:?}: {e}", handle.name(), frame.frame_type);
        }
    }

    /// Runs one connection lifecycle (§4.3.5): connects, starts the
    /// producer and two consumers, and returns once the connection is lost
    /// or shutdown is requested.
    async fn connect_and_serve(self: &Arc<Self>) -> Result<(), ConnectionError> {
        let (read_half, write_half) = tokio::time::timeout(CONNECT_TIMEOUT, self.transport.connect())
            .await
            .map_err(|_| ConnectionError::Timeout)??;

        let mut reader = FrameReader::new(read_half);
        let mut writer = FrameWriter::new(write_half);

        *self.connected.write().await = true;
        log::info!("connection established");
        for device in self.registry.all().await {
            device.mark_connected();
        }
        let _ = self
            .write_tx
            .send(Frame::from_data(FrameType::RequestStartMaster, ADDR_ECOMAX, EventDataType::new()));

        let (read_tx, read_rx) = mpsc::unbounded_channel::<Frame>();
        let read_rx = Arc::new(Mutex::new(read_rx));
        let write_rx = self.write_rx.clone();
        let producer_dispatcher = self.clone();

        let producer: JoinHandle<Result<(), ConnectionError>> = tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = reader.read() => {
                        match result {
                            Ok(Some(frame)) => { let _ = read_tx.send(frame); }
                            Ok(None) => {}
                            Err(e) => if let Some(fatal) = classify_read_error(e) { return Err(fatal); }
                        }
                    }
                    frame = async { write_rx.lock().await.recv().await } => {
                        if let Some(mut frame) = frame {
                            if let Err(e) = writer.write(&mut frame).await {
                                if let Some(fatal) = classify_write_error(e) { return Err(fatal); }
                            }
                        }
                    }
                    _ = producer_dispatcher.shutdown_signal.notified() => {
                        let _ = writer.close().await;
                        return Ok(());
                    }
                }
            }
        });

        let mut consumers = Vec::with_capacity(2);
        for _ in 0..2 {
            let read_rx = read_rx.clone();
            let dispatcher = self.clone();
            consumers.push(tokio::spawn(async move {
                loop {
                    let frame = { read_rx.lock().await.recv().await };
                    match frame {
                        Some(frame) => dispatcher.route_frame(frame).await,
                        None => break,
                    }
                }
            }));
        }

        let result = match producer.await {
            Ok(inner) => inner,
            Err(e) => {
                log::warn!("producer task panicked: {e}");
                Ok(())
            }
        };

        for consumer in consumers {
            consumer.abort();
        }

        *self.connected.write().await = false;
        for device in self.registry.all().await {
            device.mark_disconnected();
        }

        result
    }

    /// Runs the connection lifecycle until [`Dispatcher::shutdown`] is
    /// called, reconnecting after [`RECONNECT_DELAY`] on every loss.
    pub async fn run(self: &Arc<Self>) {
        while !self.shutting_down.load(Ordering::SeqCst) {
            if let Err(e) = self.connect_and_serve().await {
                log::warn!("connection lost: {e}");
            }
            if self.shutting_down.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    /// Cancels the connection, shuts down every known device, and unblocks
    /// [`Dispatcher::run`] (§4.3.5).
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.shutdown_signal.notify_waiters();
        for device in self.registry.all().await {
            device.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;

    struct NullTransport;

    impl Transport for NullTransport {
        fn connect(
            &self,
        ) -> BoxFuture<'_, Result<(crate::transport::BoxRead, crate::transport::BoxWrite), ConnectionError>>
        {
            Box::pin(async { Err(ConnectionError::Timeout) })
        }
    }

    #[tokio::test]
    async fn ensure_device_creates_known_addresses_lazily() {
        let dispatcher = Dispatcher::new(Box::new(NullTransport), NetworkInfo::default());
        let handle = dispatcher.ensure_device(ADDR_ECOMAX).await.unwrap();
        assert_eq!(handle.name(), "ecomax");
        assert!(dispatcher.ensure_device(0x99).await.is_none());
    }

    #[tokio::test]
    async fn get_device_waits_for_registration() {
        let dispatcher = Dispatcher::new(Box::new(NullTransport), NetworkInfo::default());
        let waiter = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.get_device("ecomax").await })
        };
        tokio::task::yield_now().await;
        dispatcher.ensure_device(ADDR_ECOMAX).await;
        let handle = waiter.await.unwrap();
        assert_eq!(handle.name(), "ecomax");
    }
}
