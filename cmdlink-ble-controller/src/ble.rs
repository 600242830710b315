//! BLE Client for the cmdlink command channel
//!
//! Scans for devices, connects to the command characteristic, runs the
//! passcode handshake and executes commands, reading each response back one
//! chunk at a time.

use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use log::*;
use std::time::Duration;
use uuid::Uuid;

use cmdlink_proto::ble::{COMMAND_UUID_U128, SERVICE_UUID_U128, auth_command, sentinels};
use cmdlink_proto::{ReadProgress, ResponseReader, text};

const SERVICE_UUID: Uuid = Uuid::from_u128(SERVICE_UUID_U128);
const COMMAND_UUID: Uuid = Uuid::from_u128(COMMAND_UUID_U128);

/// Advertised name prefix of cmdlink devices
pub const DEVICE_NAME_PREFIX: &str = "cmdlink";

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("bluetooth error: {0}")]
    Ble(#[from] btleplug::Error),
    #[error("no Bluetooth adapter found")]
    NoAdapter,
    #[error("no cmdlink device found")]
    DeviceNotFound,
    #[error("command characteristic not found")]
    CharacteristicNotFound,
    #[error("passcode rejected")]
    AuthRejected,
    #[error("unexpected reply: {0:?}")]
    UnexpectedReply(String),
}

/// A discovered device
#[derive(Debug, Clone)]
pub struct CmdlinkDevice {
    pub name: String,
    pub address: String,
    pub rssi: Option<i16>,
    pub is_cmdlink: bool,
}

/// A command response read back from the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub bytes: Vec<u8>,
    pub chunks: usize,
    /// Every chunk slot was used, so the device may have dropped output
    pub possibly_truncated: bool,
}

impl Reply {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn is_rejected(&self) -> bool {
        self.bytes == sentinels::COMMAND_REJECTED
    }
}

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter, ControllerError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(ControllerError::NoAdapter)
}

fn is_cmdlink_name(name: &str, services: &[Uuid]) -> bool {
    // Some stacks report "nimble [cmdlink-xxx]"
    name.starts_with(DEVICE_NAME_PREFIX)
        || name.contains(&format!("[{DEVICE_NAME_PREFIX}"))
        || services.contains(&SERVICE_UUID)
}

/// Scan for BLE devices
///
/// Returns every discovered device; cmdlink devices have `is_cmdlink = true`.
pub async fn scan(duration_secs: u64) -> Result<Vec<CmdlinkDevice>, ControllerError> {
    let adapter = get_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;

    let peripherals = adapter.peripherals().await?;
    let mut devices = Vec::new();

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_else(|| "Unknown".to_string());
            let address = peripheral.address().to_string();
            let is_cmdlink = is_cmdlink_name(&name, &props.services);

            devices.push(CmdlinkDevice { name, address, rssi: props.rssi, is_cmdlink });
        }
    }

    adapter.stop_scan().await?;
    Ok(devices)
}

/// Find a device by name/address pattern, or any cmdlink device
pub async fn find_device(target: Option<&str>) -> Result<Peripheral, ControllerError> {
    let adapter = get_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(5)).await;

    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_default();
            let addr = peripheral.address().to_string();

            let matches = match target {
                Some(t) => name.contains(t) || addr.contains(t),
                None => is_cmdlink_name(&name, &props.services),
            };

            if matches {
                adapter.stop_scan().await?;
                info!("Found device: {name} ({addr})");
                return Ok(peripheral);
            }
        }
    }

    adapter.stop_scan().await?;
    Err(ControllerError::DeviceNotFound)
}

/// The `auth <passcode>` write, one byte per char like every other write
fn handshake_bytes(passcode: &str) -> Vec<u8> {
    text::encode(&auth_command(passcode))
}

/// Connection to a device's command characteristic
pub struct CommandLink {
    device: Peripheral,
    characteristic: Characteristic,
}

impl CommandLink {
    /// Find, connect and discover the command characteristic
    pub async fn connect(target: Option<&str>) -> Result<Self, ControllerError> {
        let device = find_device(target).await?;

        device.connect().await?;
        device.discover_services().await?;

        let characteristic = device
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == COMMAND_UUID)
            .ok_or(ControllerError::CharacteristicNotFound)?;

        Ok(Self { device, characteristic })
    }

    /// Run the passcode handshake
    pub async fn authenticate(&self, passcode: &str) -> Result<(), ControllerError> {
        self.write(&handshake_bytes(passcode)).await?;
        let reply = self.device.read(&self.characteristic).await?;

        match reply.as_slice() {
            r if r == sentinels::AUTH_OK => Ok(()),
            r if r == sentinels::AUTH_FAILED => Err(ControllerError::AuthRejected),
            other => Err(ControllerError::UnexpectedReply(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }

    /// Send a command and read the full reply
    pub async fn execute(&self, command: &str) -> Result<Reply, ControllerError> {
        self.write(&text::encode(command)).await?;

        let mut reader = ResponseReader::new();
        loop {
            let chunk = self.device.read(&self.characteristic).await?;
            debug!("Read chunk ({} bytes)", chunk.len());
            if reader.accept(&chunk) == ReadProgress::Done {
                break;
            }
        }

        let chunks = reader.chunk_count();
        let possibly_truncated = reader.possibly_truncated();
        Ok(Reply { bytes: reader.into_bytes(), chunks, possibly_truncated })
    }

    pub async fn disconnect(&self) -> Result<(), ControllerError> {
        self.device.disconnect().await?;
        Ok(())
    }

    async fn write(&self, data: &[u8]) -> Result<(), ControllerError> {
        self.device
            .write(&self.characteristic, data, WriteType::WithResponse)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_device_names() {
        assert!(is_cmdlink_name("cmdlink-4f2a", &[]));
        assert!(is_cmdlink_name("nimble [cmdlink-4f2a]", &[]));
        assert!(!is_cmdlink_name("Headphones", &[]));
    }

    #[test]
    fn recognizes_advertised_service() {
        assert!(is_cmdlink_name("Unknown", &[SERVICE_UUID]));
    }

    #[test]
    fn uuids_match_protocol_strings() {
        assert_eq!(SERVICE_UUID.to_string(), cmdlink_proto::ble::SERVICE_UUID);
        assert_eq!(COMMAND_UUID.to_string(), cmdlink_proto::ble::COMMAND_UUID);
    }

    #[test]
    fn handshake_with_non_ascii_passcode_is_accepted() {
        use cmdlink_mcu::{ChannelConfig, CommandChannel, TransportAdapter, TransportEvent};

        let config = ChannelConfig::new("contrase\u{f1}a", [r"^lock\s.*"]);
        let shell = |_: &str| String::new();
        let mut adapter = TransportAdapter::new(CommandChannel::new(config, shell).unwrap());

        let bytes = handshake_bytes("contrase\u{f1}a");
        assert_eq!(bytes, b"auth contrase\xf1a");
        adapter.dispatch(TransportEvent::Write(&bytes));
        assert_eq!(adapter.dispatch(TransportEvent::Read), Some(b"ok".to_vec()));
    }

    #[test]
    fn reply_detects_rejection() {
        let reply = Reply {
            bytes: b"Command not accepted.".to_vec(),
            chunks: 2,
            possibly_truncated: false,
        };
        assert!(reply.is_rejected());
        assert_eq!(reply.text(), "Command not accepted.");
    }
}
