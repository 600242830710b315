//! cmdlink firmware for ESP32
//!
//! Advertises a single BLE characteristic. A peer authenticates with the
//! passcode, then writes whitelisted commands and reads the output back in
//! 16-byte chunks. The built-in shell drives a lock output on GPIO2.

mod ble;
mod shell;
mod storage;

use esp_idf_svc::{
    hal::{
        gpio::{Gpio2, Output, PinDriver},
        prelude::Peripherals,
    },
    nvs::EspDefaultNvsPartition,
};
use log::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use cmdlink_mcu::{
    passcode_or, ChannelConfig, CommandChannel, CommandServer, TransportAdapter,
    DEFAULT_ACCEPTED_COMMANDS,
};

/// Passcode used until an owner stores one in NVS
const BUILTIN_PASSCODE: &str = match option_env!("CMDLINK_PASSCODE") {
    Some(passcode) => passcode,
    None => "cmdlink",
};

// Lock state
pub static IS_LOCKED: AtomicBool = AtomicBool::new(false);

// Set by `module restart`, acted on by the main loop
pub static RESTART_REQUESTED: AtomicBool = AtomicBool::new(false);

// Lock output (GPIO2 is the built-in LED on most ESP32 dev boards)
static LED: Mutex<Option<PinDriver<'static, Gpio2, Output>>> = Mutex::new(None);

/// Set the LED state
pub fn set_led(on: bool) {
    if let Ok(mut guard) = LED.lock() {
        if let Some(led) = guard.as_mut() {
            if on {
                let _ = led.set_high();
            } else {
                let _ = led.set_low();
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("cmdlink v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let led = PinDriver::output(peripherals.pins.gpio2)?;
    if let Ok(mut guard) = LED.lock() {
        *guard = Some(led);
    }

    let storage = storage::NvsStorage::open(&nvs)?;

    // Restore lock state from NVS
    let locked = storage.load_locked();
    IS_LOCKED.store(locked, Ordering::Relaxed);
    set_led(locked);
    info!("Restored lock state: {}", if locked { "LOCKED" } else { "UNLOCKED" });

    let passcode = passcode_or(&storage, BUILTIN_PASSCODE).unwrap_or_else(|e| {
        error!("Failed to read passcode from NVS: {:?}", e);
        BUILTIN_PASSCODE.to_string()
    });
    if passcode == BUILTIN_PASSCODE && option_env!("CMDLINK_PASSCODE").is_none() {
        warn!("Using the default passcode, set CMDLINK_PASSCODE at build time or run `module passcode <new>`");
    }

    let storage = Arc::new(Mutex::new(storage));
    let mut mac = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    let device_name = format!("cmdlink-{:02x}{:02x}", mac[4], mac[5]);

    let config = ChannelConfig::new(passcode, DEFAULT_ACCEPTED_COMMANDS.iter().copied());
    let channel = CommandChannel::new(config, shell::FirmwareShell::new(&device_name, storage))?;
    let adapter = Arc::new(Mutex::new(TransportAdapter::new(channel)));

    let mut server = ble::start_command_server(adapter);
    server
        .start_advertising(&device_name)
        .map_err(|e| anyhow::anyhow!("failed to start advertising: {:?}", e))?;

    loop {
        std::thread::sleep(std::time::Duration::from_millis(100));
        if RESTART_REQUESTED.load(Ordering::Relaxed) {
            restart_device();
        }
    }
}

fn restart_device() -> ! {
    info!("Restarting in 1 second...");
    std::thread::sleep(std::time::Duration::from_secs(1));
    unsafe {
        esp_idf_svc::sys::esp_restart();
    }
}
