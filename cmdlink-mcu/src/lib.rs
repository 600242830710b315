//! cmdlink MCU Library
//!
//! Device side of the cmdlink command channel: a peer connected over BLE
//! authenticates with a passcode, writes whitelisted commands to a single
//! characteristic and reads the output back in small chunks.
//!
//! This crate provides:
//! - [`Session`]: the passcode handshake
//! - [`CommandValidator`]: the command whitelist
//! - [`CommandChannel`]: the state machine tying both to a [`Shell`]
//! - [`TransportAdapter`]: the mapping from GATT events to channel calls
//! - Traits for the GATT server and persistent storage
//!
//! # Example
//!
//! ```
//! use cmdlink_mcu::{ChannelConfig, CommandChannel, TransportAdapter, TransportEvent};
//!
//! let config = ChannelConfig::new("tucar987", [r"^lock\s.*"]);
//! let shell = |_: &str| "Door locked".to_string();
//! let mut adapter = TransportAdapter::new(CommandChannel::new(config, shell).unwrap());
//!
//! adapter.dispatch(TransportEvent::Write(b"auth tucar987"));
//! assert_eq!(adapter.dispatch(TransportEvent::Read).unwrap(), b"ok");
//!
//! adapter.dispatch(TransportEvent::Write(b"lock driver"));
//! assert_eq!(adapter.dispatch(TransportEvent::Read).unwrap(), b"Door locked");
//! ```

pub mod channel;
pub mod config;
pub mod session;
pub mod shell;
pub mod storage;
pub mod transport;
pub mod validator;

pub use channel::{ChannelError, ChannelState, CommandChannel};
pub use config::{ChannelConfig, ConfigError, DEFAULT_ACCEPTED_COMMANDS};
pub use session::Session;
pub use shell::{ProcessShell, Shell, ShellError};
pub use storage::{MemoryStorage, Storage, passcode_or};
pub use transport::{CommandServer, TransportAdapter, TransportEvent};
pub use validator::{CommandValidator, InvalidPattern};
