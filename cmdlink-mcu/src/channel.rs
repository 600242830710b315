//! The command channel state machine
//!
//! Until the peer completes the passcode handshake, every write is treated as
//! a handshake attempt. After that, writes are commands: whitelisted ones run
//! through the [`Shell`], the rest get a fixed rejection. Each write replaces
//! the queued response, which the peer then drains one chunk per read.

use std::borrow::Cow;

use log::*;

use cmdlink_proto::ble::{AUTH_COMMAND, sentinels};
use cmdlink_proto::{ChunkQueue, text};

use crate::config::ChannelConfig;
use crate::session::Session;
use crate::shell::Shell;
use crate::validator::{CommandValidator, InvalidPattern};

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error(transparent)]
    InvalidPattern(#[from] InvalidPattern),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Unauthenticated,
    Authenticated,
}

pub struct CommandChannel<S> {
    session: Session,
    validator: CommandValidator,
    queue: ChunkQueue,
    shell: S,
    last_command: Option<String>,
}

impl<S: Shell> CommandChannel<S> {
    /// Compiles the whitelist once; an invalid pattern fails construction
    pub fn new(config: ChannelConfig, shell: S) -> Result<Self, ChannelError> {
        let validator = CommandValidator::new(&config.accepted_commands)?;
        if validator.is_empty() {
            warn!("Command whitelist is empty, every command will be rejected");
        }
        Ok(Self::with_validator(config.passcode, validator, shell))
    }

    pub fn with_validator(passcode: impl Into<String>, validator: CommandValidator, shell: S) -> Self {
        Self {
            session: Session::new(passcode),
            validator,
            queue: ChunkQueue::new(),
            shell,
            last_command: None,
        }
    }

    /// Handle one write from the peer
    pub fn run_command(&mut self, command: &str) {
        if !self.session.is_authenticated() {
            self.start_session(command);
            return;
        }

        let response = if self.validator.is_accepted(command) {
            info!("Executing command ({} bytes)", command.len());
            let output = text::encode(&self.shell.execute(command));
            debug!("Command produced {} bytes", output.len());
            output
        } else {
            warn!("Command not accepted: {:?}", loggable(command));
            sentinels::COMMAND_REJECTED.to_vec()
        };
        self.last_command = Some(command.to_string());

        self.respond(&response);
    }

    fn start_session(&mut self, candidate: &str) {
        if self.session.begin_handshake(candidate) {
            self.respond(sentinels::AUTH_OK);
        } else {
            self.respond(sentinels::AUTH_FAILED);
        }
    }

    fn respond(&mut self, response: &[u8]) {
        self.queue.clear();
        let dropped = self.queue.push(response);
        if dropped > 0 {
            warn!(
                "Response truncated: {} of {} bytes dropped",
                dropped,
                response.len()
            );
        }
    }

    /// Next chunk for a read request, or the `empty` sentinel
    pub fn fetch_next_chunk(&mut self) -> Vec<u8> {
        self.queue
            .next()
            .unwrap_or_else(|_| sentinels::EMPTY.to_vec())
    }

    pub fn has_next_chunk(&self) -> bool {
        self.queue.has_next()
    }

    pub fn on_disconnect(&mut self) {
        self.session.close();
        self.queue.clear();
        self.last_command = None;
    }

    /// Replace the passcode, e.g. once it has been loaded from storage
    pub fn reset_passcode(&mut self, passcode: impl Into<String>) {
        self.session.set_passcode(passcode);
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn state(&self) -> ChannelState {
        if self.session.is_authenticated() {
            ChannelState::Authenticated
        } else {
            ChannelState::Unauthenticated
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Most recent command received on an authenticated session
    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut S {
        &mut self.shell
    }
}

/// A rejected command as it may appear in the log. Anything that looks like
/// a handshake carries a passcode and is reduced to its length.
fn loggable(command: &str) -> Cow<'_, str> {
    if command.trim_start().starts_with(AUTH_COMMAND) {
        Cow::Owned(format!("<{AUTH_COMMAND} ..., {} bytes>", command.len()))
    } else {
        Cow::Borrowed(command)
    }
}
