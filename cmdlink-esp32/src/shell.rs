//! Built-in command set executed for whitelisted commands
//!
//! Stands in for a full device shell: `lock`/`unlock` drive the lock output
//! (the on-board LED), `module` reports, restarts or changes the passcode,
//! `bt` reports the advertised name.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use cmdlink_mcu::{Shell, Storage};
use log::*;

use crate::storage::NvsStorage;

const PASSCODE_COMMAND: &str = "module passcode";
const MAX_PASSCODE_LEN: usize = 64;

pub struct FirmwareShell {
    device_name: String,
    started: Instant,
    storage: Arc<Mutex<NvsStorage>>,
    pending_passcode: Option<String>,
}

impl FirmwareShell {
    pub fn new(device_name: &str, storage: Arc<Mutex<NvsStorage>>) -> Self {
        Self {
            device_name: device_name.to_string(),
            started: Instant::now(),
            storage,
            pending_passcode: None,
        }
    }

    /// Passcode changed by the last command, to be pushed into the channel
    pub fn take_pending_passcode(&mut self) -> Option<String> {
        self.pending_passcode.take()
    }

    /// `module passcode <new>` stores a passcode, bare `module passcode`
    /// goes back to the built-in one
    fn change_passcode(&mut self, new: Option<&str>) -> String {
        if let Some(new) = new {
            let len = new.chars().count();
            if len == 0 || len > MAX_PASSCODE_LEN {
                return format!("Passcode must be 1 to {MAX_PASSCODE_LEN} characters");
            }
        }

        let Ok(mut storage) = self.storage.lock() else {
            return "Error: storage unavailable".to_string();
        };
        let result = match new {
            Some(new) => storage.set_passcode(new),
            None => storage.clear_passcode(),
        };
        if let Err(e) = result {
            error!("Failed to save passcode: {:?}", e);
            return "Error: failed to save passcode".to_string();
        }

        info!("Passcode changed");
        self.pending_passcode = Some(new.unwrap_or(crate::BUILTIN_PASSCODE).to_string());
        match new {
            Some(_) => "Passcode changed".to_string(),
            None => "Passcode reset to default".to_string(),
        }
    }

    fn set_locked(&mut self, locked: bool, target: &str) -> String {
        crate::set_led(locked);
        crate::IS_LOCKED.store(locked, Ordering::Relaxed);
        if let Ok(mut storage) = self.storage.lock() {
            if let Err(e) = storage.save_locked(locked) {
                error!("Failed to save lock state: {:?}", e);
            }
        }
        info!("{} {}", if locked { "Locked" } else { "Unlocked" }, target);
        if locked {
            "Door locked".to_string()
        } else {
            "Door unlocked".to_string()
        }
    }
}

impl Shell for FirmwareShell {
    fn execute(&mut self, command: &str) -> String {
        if let Some(rest) = command.strip_prefix(PASSCODE_COMMAND) {
            if rest.is_empty() {
                return self.change_passcode(None);
            }
            if let Some(new) = rest.strip_prefix(' ') {
                return self.change_passcode(Some(new));
            }
        }

        let mut words = command.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let arg = words.next().unwrap_or_default();

        match (verb, arg) {
            ("lock", target) => self.set_locked(true, target),
            ("unlock", target) => self.set_locked(false, target),
            ("module", "info") => format!(
                "{} v{}\nuptime {}s\nlocked {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                self.started.elapsed().as_secs(),
                crate::IS_LOCKED.load(Ordering::Relaxed),
            ),
            ("module", "restart") => {
                crate::RESTART_REQUESTED.store(true, Ordering::Relaxed);
                "Restarting".to_string()
            }
            ("bt", "status") => format!("advertising as {}", self.device_name),
            _ => format!("Unrecognised command: {command}"),
        }
    }
}
