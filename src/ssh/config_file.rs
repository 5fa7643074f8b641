//! Minimal parser for OpenSSH client configuration.
//!
//! Only the pieces that matter for key resolution are modeled: `Host`
//! blocks, their `IdentityFile` and `User` directives, and a grab bag of
//! remaining options. Anything the parser does not understand is skipped
//! rather than treated as fatal, matching how lenient ssh itself is with
//! unknown directives.

use crate::env::Env;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// Characters that never appear in a usable host pattern. A Host line
// containing one of these disables its whole block.
const INVALID_PATTERN_CHARS: &[char] = &['|', '[', ']', '{', '}', '\\', ';'];

/// One `Host` block from the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostEntry {
    /// The pattern after `Host`, verbatim.
    pub pattern: String,
    /// `IdentityFile` values in the order they appeared.
    pub identity_files: Vec<String>,
    pub user: Option<String>,
    /// Remaining directives, lowercased key to last value.
    pub options: HashMap<String, String>,
}

/// A parsed client config, entries in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SshClientConfig {
    pub entries: Vec<HostEntry>,
}

impl SshClientConfig {
    /// Parse the file at `path`. A missing or unreadable file yields an
    /// empty config.
    pub fn parse(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse_str(&contents),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no ssh config to parse");
                Self::default()
            }
        }
    }

    fn parse_str(contents: &str) -> Self {
        let mut config = Self::default();
        // Index into entries of the block directives currently apply to.
        // None outside any block or after an invalid Host line.
        let mut current: Option<usize> = None;

        for raw_line in contents.lines() {
            let line = match raw_line.find('#') {
                Some(pos) => &raw_line[..pos],
                None => raw_line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = split_directive(line) else {
                continue;
            };

            if key == "host" {
                if is_valid_host_pattern(value) {
                    current = Some(config.entry_index(value));
                } else {
                    warn!(pattern = value, "skipping host block with invalid pattern");
                    current = None;
                }
                continue;
            }

            let Some(index) = current else {
                // Directive outside any Host block.
                continue;
            };
            let entry = &mut config.entries[index];

            match key.as_str() {
                "identityfile" => entry.identity_files.push(value.to_string()),
                "user" => entry.user = Some(value.to_string()),
                _ => {
                    entry.options.insert(key, value.to_string());
                }
            }
        }

        config
    }

    // Repeated Host lines with the same pattern reopen the earlier entry.
    fn entry_index(&mut self, pattern: &str) -> usize {
        if let Some(index) = self.entries.iter().position(|e| e.pattern == pattern) {
            return index;
        }
        self.entries.push(HostEntry {
            pattern: pattern.to_string(),
            ..Default::default()
        });
        self.entries.len() - 1
    }
}

/// Split a config line into a lowercased directive and its value.
/// Lines without a value are reported as `None`.
fn split_directive(line: &str) -> Option<(String, &str)> {
    let (key, value) = line.split_once(char::is_whitespace)?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some((key.to_ascii_lowercase(), value))
}

fn is_valid_host_pattern(pattern: &str) -> bool {
    !pattern.is_empty() && !pattern.contains(INVALID_PATTERN_CHARS)
}

/// Default location of the user's SSH client config.
pub fn default_config_path(env: &dyn Env) -> Option<PathBuf> {
    env.home_dir().map(|home| home.join(".ssh").join("config"))
}
