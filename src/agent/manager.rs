use crate::agent::info::{AgentInfo, AgentInfoStore};
use crate::agent::platform::Platform;
use crate::env::Env;
use crate::error::{KeyholdError, Result};
use crate::process::{CommandOutput, CommandRunner};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// What probing the cached agent revealed.
enum AgentProbe {
    /// No agent is reachable through the cached connection details.
    NoAgent,
    /// The agent answers but does not hold the key.
    KeyMissing(AgentInfo),
    /// The agent answers and already holds the key.
    KeyLoaded,
}

/// Drives the agent lifecycle: reconnect to a cached agent when allowed,
/// start a fresh one otherwise, then make sure the identity is loaded.
pub struct AgentManager {
    env: Arc<dyn Env>,
    runner: Arc<dyn CommandRunner>,
    store: AgentInfoStore,
    reuse_agent: bool,
    platform: Platform,
}

impl AgentManager {
    pub fn new(
        env: Arc<dyn Env>,
        runner: Arc<dyn CommandRunner>,
        store: AgentInfoStore,
        reuse_agent: bool,
    ) -> Self {
        Self {
            env,
            runner,
            store,
            reuse_agent,
            platform: Platform::current(),
        }
    }

    /// Make sure an agent is running and has `identity` loaded.
    pub fn ensure_key_loaded(&self, identity: &Path) -> Result<()> {
        if self.reuse_agent {
            match self.probe_cached_agent(identity) {
                AgentProbe::KeyLoaded => {
                    debug!("reusing agent, key already loaded");
                    return Ok(());
                }
                AgentProbe::KeyMissing(cached) => {
                    debug!("reusing agent, key still to add");
                    self.store.save(&cached.auth_sock, &cached.agent_pid);
                    return self.add_key(identity);
                }
                AgentProbe::NoAgent => {}
            }
        }

        let (auth_sock, agent_pid) = self.start_agent()?;
        if let (Some(sock), Some(pid)) = (&auth_sock, &agent_pid) {
            self.store.save(sock, pid);
        }
        self.add_key(identity)
    }

    /// Check whether the cached agent is alive and already holds `identity`.
    fn probe_cached_agent(&self, identity: &Path) -> AgentProbe {
        let Some(cached) = self.store.load() else {
            return AgentProbe::NoAgent;
        };

        let output = match self.runner.run("ssh-add", &["-l"], &[]) {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "could not query agent");
                return AgentProbe::NoAgent;
            }
        };

        // ssh-add -l exits 0 with a listing, 1 when the agent holds no
        // identities, 2 when no agent is reachable.
        match output.code {
            Some(0) if self.listing_has_key(&output.stdout, identity) => AgentProbe::KeyLoaded,
            Some(0) | Some(1) => AgentProbe::KeyMissing(cached),
            _ => AgentProbe::NoAgent,
        }
    }

    /// Look for `identity` in `ssh-add -l` output, by fingerprint when
    /// ssh-keygen can compute one, by path otherwise.
    fn listing_has_key(&self, listing: &str, identity: &Path) -> bool {
        if let Some(fingerprint) = self.key_fingerprint(identity) {
            if listing.contains(&fingerprint) {
                return true;
            }
        }
        identity
            .to_str()
            .is_some_and(|path| listing.contains(path))
    }

    /// Fingerprint of `identity` via `ssh-keygen -lf`.
    fn key_fingerprint(&self, identity: &Path) -> Option<String> {
        let path = identity.to_str()?;
        let output = self.runner.run("ssh-keygen", &["-lf", path], &[]).ok()?;
        if !output.success() {
            return None;
        }
        // "256 SHA256:xxxx comment (ED25519)", the second column.
        output.stdout.split_whitespace().nth(1).map(str::to_string)
    }

    /// Start a fresh agent and export its connection variables. Returns
    /// whichever of SSH_AUTH_SOCK / SSH_AGENT_PID the agent reported.
    fn start_agent(&self) -> Result<(Option<String>, Option<String>)> {
        let args = self.platform.agent_start_args;
        debug!(command = ?args, "starting ssh-agent");

        let output = self
            .runner
            .run(args[0], &args[1..], &[])
            .map_err(|e| KeyholdError::AgentStart(e.to_string()))?;

        if !output.success() {
            return Err(KeyholdError::AgentStart(format!(
                "ssh-agent exited with {}: {}",
                exit_label(&output),
                output.stderr.trim()
            )));
        }

        let vars = parse_agent_output(&output.stdout);
        for (name, value) in &vars {
            self.env.set_var(name, value);
        }

        let auth_sock = lookup(&vars, "SSH_AUTH_SOCK");
        let agent_pid = lookup(&vars, "SSH_AGENT_PID");
        if auth_sock.is_none() && agent_pid.is_none() {
            return Err(KeyholdError::AgentStart(
                "no connection variables in ssh-agent output".to_string(),
            ));
        }

        info!("started new ssh-agent");
        Ok((auth_sock, agent_pid))
    }

    /// Hand `identity` to ssh-add.
    fn add_key(&self, identity: &Path) -> Result<()> {
        let path = identity.to_string_lossy();
        let output = self
            .runner
            .run("ssh-add", &[path.as_ref()], &[])
            .map_err(|e| KeyholdError::KeyAdd(e.to_string()))?;

        if !output.success() {
            return Err(KeyholdError::KeyAdd(format!(
                "ssh-add exited with {}: {}",
                exit_label(&output),
                output.stderr.trim()
            )));
        }

        info!(identity = %identity.display(), "key loaded into agent");
        Ok(())
    }
}

fn exit_label(output: &CommandOutput) -> String {
    match output.code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

fn lookup(vars: &[(String, String)], name: &str) -> Option<String> {
    vars.iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

/// Parse `VAR=value;` assignments from the shell-format output of ssh-agent,
/// e.g. `SSH_AUTH_SOCK=/tmp/ssh-XXXX/agent.7; export SSH_AUTH_SOCK;`.
fn parse_agent_output(output: &str) -> Vec<(String, String)> {
    let mut vars = Vec::new();

    for line in output.lines() {
        let Some((name, rest)) = line.split_once('=') else {
            continue;
        };
        let Some((value, _)) = rest.split_once(';') else {
            continue;
        };

        let name = name.trim();
        let value = value.trim().trim_matches('"');
        if name.is_empty() || value.is_empty() {
            continue;
        }
        vars.push((name.to_string(), value.to_string()));
    }

    vars
}
