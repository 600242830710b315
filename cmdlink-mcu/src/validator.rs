//! Whitelist of accepted commands

use log::*;
use regex::Regex;

#[derive(Debug, thiserror::Error)]
#[error("invalid command pattern {pattern:?}: {source}")]
pub struct InvalidPattern {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Ordered set of compiled patterns. A command is accepted when it matches
/// one of them in full.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    patterns: Vec<(String, Regex)>,
}

impl CommandValidator {
    pub fn new<I, S>(patterns: I) -> Result<Self, InvalidPattern>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                // Anchor both ends so a match covers the entire command
                Regex::new(&format!("^(?:{pattern})$"))
                    .map(|re| (pattern.to_string(), re))
                    .map_err(|source| InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_accepted(&self, command: &str) -> bool {
        match self.patterns.iter().find(|(_, re)| re.is_match(command)) {
            Some((pattern, _)) => {
                debug!("Command matched {pattern:?}");
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
