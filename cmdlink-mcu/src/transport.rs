//! Glue between a GATT server and the command channel
//!
//! The BLE stack reports connect, write, read and disconnect on the command
//! characteristic. Each of those maps to one [`TransportEvent`] and goes
//! through [`TransportAdapter::dispatch`]. Protocol constants (UUIDs,
//! sentinels) live in `cmdlink_proto::ble`.

use log::*;

use crate::channel::CommandChannel;
use crate::shell::Shell;

/// One notification from the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent<'a> {
    /// A peer connected
    Connected,
    /// The peer wrote these bytes to the characteristic
    Write(&'a [u8]),
    /// The peer wants to read the characteristic
    Read,
    /// The peer went away
    Disconnected,
}

/// Owns the channel on behalf of a GATT server binding
pub struct TransportAdapter<S> {
    channel: CommandChannel<S>,
}

impl<S: Shell> TransportAdapter<S> {
    pub fn new(channel: CommandChannel<S>) -> Self {
        Self { channel }
    }

    /// Apply `event` to the channel.
    ///
    /// Returns the value to answer a [`TransportEvent::Read`] with; every
    /// other event returns `None`.
    pub fn dispatch(&mut self, event: TransportEvent<'_>) -> Option<Vec<u8>> {
        match event {
            TransportEvent::Connected => {
                info!("BLE: peer connected");
                None
            }
            TransportEvent::Write(bytes) => {
                debug!("BLE: write ({} bytes)", bytes.len());
                let text = cmdlink_proto::text::decode(bytes);
                self.channel.run_command(&text);
                None
            }
            TransportEvent::Read => {
                let chunk = self.channel.fetch_next_chunk();
                debug!("BLE: read -> {} bytes", chunk.len());
                Some(chunk)
            }
            TransportEvent::Disconnected => {
                info!("BLE: peer disconnected");
                self.channel.on_disconnect();
                None
            }
        }
    }

    /// The stack refused to deliver a response. The channel has no notion of
    /// delivery, so its state is left alone.
    pub fn report_send_failure(&self, err: &dyn std::fmt::Display) {
        error!("BLE: failed to send response: {err}");
    }

    pub fn channel(&self) -> &CommandChannel<S> {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut CommandChannel<S> {
        &mut self.channel
    }
}

/// Trait for BLE GATT server implementations
///
/// MCU-specific crates implement this using their BLE stack and route the
/// characteristic callbacks into a [`TransportAdapter`].
pub trait CommandServer {
    /// Error type for BLE operations
    type Error;

    /// Start BLE advertising with the given device name
    fn start_advertising(&mut self, device_name: &str) -> Result<(), Self::Error>;

    /// Stop BLE advertising
    fn stop_advertising(&mut self) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;

    fn adapter() -> TransportAdapter<impl Shell> {
        let config = ChannelConfig::new("tucar987", [r"^lock\s.*"]);
        let shell = |command: &str| match command {
            "lock driver" => "Door locked".to_string(),
            _ => String::new(),
        };
        TransportAdapter::new(CommandChannel::new(config, shell).unwrap())
    }

    #[test]
    fn only_reads_produce_a_value() {
        let mut adapter = adapter();
        assert_eq!(adapter.dispatch(TransportEvent::Connected), None);
        assert_eq!(adapter.dispatch(TransportEvent::Write(b"auth tucar987")), None);
        assert_eq!(adapter.dispatch(TransportEvent::Read), Some(b"ok".to_vec()));
        assert_eq!(adapter.dispatch(TransportEvent::Disconnected), None);
    }

    #[test]
    fn full_session_over_events() {
        let mut adapter = adapter();
        adapter.dispatch(TransportEvent::Connected);
        adapter.dispatch(TransportEvent::Write(b"auth tucar987"));
        assert_eq!(adapter.dispatch(TransportEvent::Read), Some(b"ok".to_vec()));

        adapter.dispatch(TransportEvent::Write(b"lock driver"));
        assert_eq!(adapter.dispatch(TransportEvent::Read), Some(b"Door locked".to_vec()));
        assert_eq!(adapter.dispatch(TransportEvent::Read), Some(b"empty".to_vec()));

        adapter.dispatch(TransportEvent::Disconnected);
        assert!(!adapter.channel().is_authenticated());
        assert!(!adapter.channel().has_next_chunk());
    }

    #[test]
    fn read_before_any_write_is_empty() {
        let mut adapter = adapter();
        assert_eq!(adapter.dispatch(TransportEvent::Read), Some(b"empty".to_vec()));
    }

    #[test]
    fn high_bytes_map_one_to_one() {
        let mut adapter = adapter();
        adapter.channel_mut().reset_passcode("p\u{e9}");
        adapter.dispatch(TransportEvent::Write(b"auth p\xe9"));
        assert_eq!(adapter.dispatch(TransportEvent::Read), Some(b"ok".to_vec()));
    }

    #[test]
    fn invalid_utf8_still_reaches_the_channel() {
        let mut adapter = adapter();
        adapter.dispatch(TransportEvent::Write(b"auth \xff\xfe"));
        assert_eq!(adapter.dispatch(TransportEvent::Read), Some(b"i".to_vec()));
    }

    #[cfg(unix)]
    #[test]
    fn process_output_bytes_reach_the_peer_unchanged() {
        let config = ChannelConfig::new("tucar987", [r"^printf\s.*"]);
        let channel = CommandChannel::new(config, crate::ProcessShell::default()).unwrap();
        let mut adapter = TransportAdapter::new(channel);

        adapter.dispatch(TransportEvent::Write(b"auth tucar987"));
        adapter.dispatch(TransportEvent::Read);
        adapter.dispatch(TransportEvent::Write(b"printf %s \xe9"));
        assert_eq!(adapter.dispatch(TransportEvent::Read), Some(vec![0xe9]));
    }

    #[test]
    fn send_failure_leaves_state_alone() {
        let mut adapter = adapter();
        adapter.dispatch(TransportEvent::Write(b"auth tucar987"));
        adapter.report_send_failure(&"stack busy");
        assert!(adapter.channel().is_authenticated());
        assert!(adapter.channel().has_next_chunk());
    }
}
