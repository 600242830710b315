//! Passcode handshake state for the single connected peer

use log::*;

use cmdlink_proto::ble::AUTH_COMMAND;

/// Authentication state of the current connection
#[derive(Debug, Default)]
pub struct Session {
    passcode: String,
    authenticated: bool,
    failed_attempts: u32,
}

impl Session {
    pub fn new(passcode: impl Into<String>) -> Self {
        Self {
            passcode: passcode.into(),
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Authenticate if `candidate` is exactly `auth <passcode>`.
    ///
    /// A mismatch leaves the authentication state unchanged.
    pub fn begin_handshake(&mut self, candidate: &str) -> bool {
        if matches_handshake(candidate, &self.passcode) {
            self.authenticated = true;
            self.failed_attempts = 0;
            info!("Session authenticated");
            return true;
        }

        self.failed_attempts = self.failed_attempts.saturating_add(1);
        warn!("Handshake rejected ({} consecutive failures)", self.failed_attempts);
        false
    }

    pub fn close(&mut self) {
        if self.authenticated {
            info!("Session closed");
        }
        self.authenticated = false;
        self.failed_attempts = 0;
    }

    /// Replace the passcode. An authenticated session stays authenticated.
    pub fn set_passcode(&mut self, passcode: impl Into<String>) {
        self.passcode = passcode.into();
    }

    /// Failed handshakes since the last success or close. Nothing locks out on it.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }
}

/// Compare without an early exit on the first differing byte
fn matches_handshake(candidate: &str, passcode: &str) -> bool {
    let Some(rest) = candidate.strip_prefix(AUTH_COMMAND) else {
        return false;
    };
    let Some(received) = rest.strip_prefix(' ') else {
        return false;
    };
    if received.len() != passcode.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in received.bytes().zip(passcode.bytes()) {
        diff |= a ^ b;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unauthenticated() {
        let session = Session::new("tucar987");
        assert!(!session.is_authenticated());
    }

    #[test]
    fn exact_handshake_authenticates() {
        let mut session = Session::new("tucar987");
        assert!(session.begin_handshake("auth tucar987"));
        assert!(session.is_authenticated());
    }

    #[test]
    fn near_misses_are_rejected() {
        let mut session = Session::new("tucar987");
        for candidate in [
            "auth tucar98",
            "auth tucar9877",
            "auth  tucar987",
            "auth tucar987 ",
            "Auth tucar987",
            "authtucar987",
            "tucar987",
            "",
        ] {
            assert!(!session.begin_handshake(candidate), "{candidate:?}");
        }
        assert!(!session.is_authenticated());
        assert_eq!(session.failed_attempts(), 8);
    }

    #[test]
    fn empty_passcode_accepts_bare_prefix() {
        let mut session = Session::default();
        assert!(!session.begin_handshake("auth"));
        assert!(session.begin_handshake("auth "));
    }

    #[test]
    fn failure_after_success_keeps_authentication() {
        let mut session = Session::new("pw");
        assert!(session.begin_handshake("auth pw"));
        assert!(!session.begin_handshake("auth nope"));
        assert!(session.is_authenticated());
    }

    #[test]
    fn close_resets() {
        let mut session = Session::new("pw");
        session.begin_handshake("auth wrong");
        session.begin_handshake("auth pw");
        session.close();
        assert!(!session.is_authenticated());
        assert_eq!(session.failed_attempts(), 0);
    }

    #[test]
    fn set_passcode_changes_handshake() {
        let mut session = Session::default();
        session.set_passcode("later");
        assert!(!session.begin_handshake("auth "));
        assert!(session.begin_handshake("auth later"));
    }
}
