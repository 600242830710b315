//! Command execution backends
//!
//! The channel hands every accepted command to a [`Shell`] and uses the
//! returned text as the response. Both carry one byte per char (see
//! [`cmdlink_proto::text`]), so chars up to U+00FF go out as single bytes.

use std::ffi::OsString;
use std::process::{Command, Stdio};

use cmdlink_proto::text;

use log::*;

/// Trait for whatever executes accepted commands
///
/// Implementations run synchronously; the channel waits for the full output.
pub trait Shell {
    fn execute(&mut self, command: &str) -> String;
}

impl<F> Shell for F
where
    F: FnMut(&str) -> String,
{
    fn execute(&mut self, command: &str) -> String {
        self(command)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs commands through a host shell (`sh -c` by default)
#[derive(Debug, Clone)]
pub struct ProcessShell {
    program: String,
    args: Vec<String>,
}

impl Default for ProcessShell {
    fn default() -> Self {
        Self::new("sh", ["-c"])
    }
}

impl ProcessShell {
    /// `program` is invoked with `args` followed by the command text
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Run `command` and return stdout followed by stderr
    pub fn run(&self, command: &str) -> Result<String, ShellError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(command_arg(command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ShellError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            debug!("Command exited with {}", output.status);
        }

        let mut bytes = output.stdout;
        bytes.extend_from_slice(&output.stderr);
        Ok(text::decode(&bytes))
    }
}

#[cfg(unix)]
fn command_arg(command: &str) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(text::encode(command))
}

#[cfg(not(unix))]
fn command_arg(command: &str) -> OsString {
    OsString::from(command)
}

impl Shell for ProcessShell {
    fn execute(&mut self, command: &str) -> String {
        match self.run(command) {
            Ok(text) => text,
            Err(e) => {
                error!("{e}");
                format!("Error: {e}")
            }
        }
    }
}
