//! cmdlink BLE Controller
//!
//! BLE client for running whitelisted commands on cmdlink devices.
//!
//! # Example
//!
//! ```ignore
//! use cmdlink_ble_controller::ble;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Scan for devices
//!     let devices = ble::scan(5).await?;
//!     for device in &devices {
//!         println!("{} ({})", device.name, device.address);
//!     }
//!
//!     // Authenticate and run a command
//!     let link = ble::CommandLink::connect(None).await?;
//!     link.authenticate("tucar987").await?;
//!     let reply = link.execute("lock driver").await?;
//!     println!("{}", reply.text());
//!     link.disconnect().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod ble;
