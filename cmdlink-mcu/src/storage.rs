//! Persistent Storage Abstraction Traits
//!
//! The passcode may only be known at runtime (set by an owner, loaded from
//! flash), so bindings keep it in non-volatile storage and push it into the
//! channel with `CommandChannel::reset_passcode`.

/// Trait for persistent storage operations
///
/// MCU-specific crates implement this trait using their storage backend
/// (NVS for ESP32, a file on a host, etc.)
pub trait Storage {
    /// Error type for storage operations
    type Error;

    /// Get the configured passcode, if one was ever saved
    fn get_passcode(&self) -> Result<Option<String>, Self::Error>;

    /// Save the passcode
    fn set_passcode(&mut self, passcode: &str) -> Result<(), Self::Error>;

    /// Forget the passcode
    fn clear_passcode(&mut self) -> Result<(), Self::Error>;
}

/// Volatile storage, for hosts and tests
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    passcode: Option<String>,
}

impl Storage for MemoryStorage {
    type Error = std::convert::Infallible;

    fn get_passcode(&self) -> Result<Option<String>, Self::Error> {
        Ok(self.passcode.clone())
    }

    fn set_passcode(&mut self, passcode: &str) -> Result<(), Self::Error> {
        self.passcode = Some(passcode.to_string());
        Ok(())
    }

    fn clear_passcode(&mut self) -> Result<(), Self::Error> {
        self.passcode = None;
        Ok(())
    }
}

/// Passcode from storage, or `fallback` when none was saved
pub fn passcode_or<S: Storage>(storage: &S, fallback: &str) -> Result<String, S::Error> {
    Ok(storage
        .get_passcode()?
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| fallback.to_string()))
}
