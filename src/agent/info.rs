use crate::agent::platform::Platform;
use crate::env::Env;
use crate::error::{KeyholdError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const INFO_FILE_NAME: &str = "agent_info.json";

/// Connection details of a running agent, cached on disk so later
/// invocations can reconnect instead of spawning a fresh agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    #[serde(rename = "SSH_AUTH_SOCK")]
    pub auth_sock: String,

    #[serde(rename = "SSH_AGENT_PID", deserialize_with = "pid_as_string")]
    pub agent_pid: String,

    /// Epoch seconds at save time.
    pub timestamp: f64,

    /// Platform family that wrote the record ("unix" or "windows").
    pub platform: String,
}

// Other writers store the pid as a JSON number; accept both forms.
fn pid_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PidField {
        Text(String),
        Number(i64),
    }

    Ok(match PidField::deserialize(deserializer)? {
        PidField::Text(text) => text,
        PidField::Number(number) => number.to_string(),
    })
}

/// Reads and writes the cached agent info file under `~/.ssh`.
pub struct AgentInfoStore {
    env: Arc<dyn Env>,
    expiry: Duration,
}

impl AgentInfoStore {
    pub fn new(env: Arc<dyn Env>, expiry_hours: u64) -> Self {
        Self {
            env,
            expiry: Duration::from_secs(expiry_hours * 60 * 60),
        }
    }

    /// Location of the cache file, if a home directory can be resolved.
    pub fn path(&self) -> Option<PathBuf> {
        self.env
            .home_dir()
            .map(|home| home.join(".ssh").join(INFO_FILE_NAME))
    }

    /// Persist connection details for a running agent. Best effort: a save
    /// failure is logged and swallowed, callers carry on with the agent
    /// they already have.
    pub fn save(&self, auth_sock: &str, agent_pid: &str) {
        if let Err(e) = self.try_save(auth_sock, agent_pid) {
            warn!(error = %e, "could not persist agent info");
        }
    }

    fn try_save(&self, auth_sock: &str, agent_pid: &str) -> Result<()> {
        let path = self.path().ok_or(KeyholdError::HomeNotFound)?;
        let dir = path.parent().ok_or(KeyholdError::HomeNotFound)?;
        std::fs::create_dir_all(dir)?;

        let info = AgentInfo {
            auth_sock: auth_sock.to_string(),
            agent_pid: agent_pid.to_string(),
            timestamp: epoch_seconds(),
            platform: Platform::current().tag.to_string(),
        };

        // Temp file plus rename keeps concurrent readers from ever seeing a
        // partial record.
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(serde_json::to_string(&info)?.as_bytes())?;
        file.persist(&path).map_err(|e| KeyholdError::Io(e.error))?;

        debug!(path = %path.display(), "agent info saved");
        Ok(())
    }

    /// Load the cached info if it is present, well formed, from this
    /// platform, and younger than the expiry. On success the agent
    /// variables are exported through the environment seam.
    pub fn load(&self) -> Option<AgentInfo> {
        let path = self.path()?;

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!(path = %path.display(), error = %e, "could not read agent info");
                }
                return None;
            }
        };

        let info: AgentInfo = match serde_json::from_str(&contents) {
            Ok(info) => info,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "agent info malformed, ignoring");
                return None;
            }
        };

        if info.auth_sock.is_empty() || info.agent_pid.is_empty() {
            warn!("agent info lacks connection details, ignoring");
            return None;
        }

        let platform = Platform::current();
        if info.platform != platform.tag {
            debug!(
                recorded = %info.platform,
                current = platform.tag,
                "agent info from another platform, ignoring"
            );
            return None;
        }

        // A timestamp in the future has a negative age and passes.
        let age = epoch_seconds() - info.timestamp;
        if age > self.expiry.as_secs_f64() {
            debug!(age_hours = (age / 3600.0) as u64, "agent info expired");
            return None;
        }

        self.env.set_var("SSH_AUTH_SOCK", &info.auth_sock);
        self.env.set_var("SSH_AGENT_PID", &info.agent_pid);
        Some(info)
    }

    /// Remove the cache file. Returns whether a file was deleted.
    pub fn clear(&self) -> Result<bool> {
        let Some(path) = self.path() else {
            return Ok(false);
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

pub(crate) fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
