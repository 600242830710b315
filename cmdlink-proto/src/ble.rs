//! BLE GATT Service Protocol Constants for the cmdlink command channel
//!
//! The device exposes one service with a single read/write characteristic.
//! A peer writes a command and then reads the response back one chunk per
//! read request.

/// BLE Service UUID: c3d10000-6c6e-4b21-8000-000000000000
pub const SERVICE_UUID: &str = "c3d10000-6c6e-4b21-8000-000000000000";

/// Command Characteristic UUID (read/write)
pub const COMMAND_UUID: &str = "c3d10001-6c6e-4b21-8000-000000000000";

/// Same UUIDs as `u128`, for stacks that build UUIDs at compile time
pub const SERVICE_UUID_U128: u128 = 0xc3d10000_6c6e_4b21_8000_000000000000;
pub const COMMAND_UUID_U128: u128 = 0xc3d10001_6c6e_4b21_8000_000000000000;

/// Prefix of the handshake command. The full form is `auth <passcode>`.
pub const AUTH_COMMAND: &str = "auth";

/// Protocol sentinels, compared byte for byte on both sides
pub mod sentinels {
    /// Handshake accepted
    pub const AUTH_OK: &[u8] = b"ok";

    /// Handshake rejected. The value carries no meaning beyond "failed".
    pub const AUTH_FAILED: &[u8] = b"i";

    /// Authenticated command did not match the whitelist
    pub const COMMAND_REJECTED: &[u8] = b"Command not accepted.";

    /// Read with nothing queued
    pub const EMPTY: &[u8] = b"empty";
}

/// Builds the handshake text for a passcode
pub fn auth_command(passcode: &str) -> String {
    format!("{AUTH_COMMAND} {passcode}")
}

#[cfg(test)]
mod tests {
    #[test]
    fn uuid_strings_match_u128() {
        let service = format!("{:032x}", super::SERVICE_UUID_U128);
        assert_eq!(super::SERVICE_UUID.replace('-', ""), service);

        let command = format!("{:032x}", super::COMMAND_UUID_U128);
        assert_eq!(super::COMMAND_UUID.replace('-', ""), command);
    }

    #[test]
    fn auth_command_uses_single_space() {
        assert_eq!(super::auth_command("tucar987"), "auth tucar987");
        assert_eq!(super::auth_command(""), "auth ");
    }
}
