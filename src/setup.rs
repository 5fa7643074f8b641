use crate::agent::info::AgentInfoStore;
use crate::agent::manager::AgentManager;
use crate::config::Config;
use crate::env::{ensure_home_var, Env, ProcessEnv};
use crate::process::{CommandRunner, SystemRunner};
use crate::ssh::resolver;
use crate::ssh::url::{extract_hostname, is_valid_hostname};
use crate::utils::path::forward_slashes;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Ties the pieces together: resolve the key for a host, get an agent
/// running with it, and wrap the Git operations that need the agent.
///
/// Methods report success as booleans or options. Failures are logged on
/// the way out, never propagated, so callers can chain operations without
/// error plumbing.
pub struct SshSetup {
    config: Config,
    env: Arc<dyn Env>,
    runner: Arc<dyn CommandRunner>,
}

impl SshSetup {
    pub fn new(config: Config) -> Self {
        Self::with_parts(config, Arc::new(ProcessEnv), Arc::new(SystemRunner))
    }

    /// Build with explicit environment and subprocess implementations.
    pub fn with_parts(
        config: Config,
        env: Arc<dyn Env>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self { config, env, runner }
    }

    /// Resolve the identity for `hostname` and make sure a running agent
    /// holds it.
    pub fn setup_ssh(&self, hostname: &str) -> bool {
        ensure_home_var(self.env.as_ref());

        if !is_valid_hostname(hostname) {
            error!(hostname, "invalid hostname");
            return false;
        }

        let Some(identity) = resolver::resolve_identity(&self.config, self.env.as_ref(), hostname)
        else {
            error!(hostname, "no identity file could be resolved");
            return false;
        };

        if !identity.exists() {
            warn!(path = %identity.display(), "identity file not found");
            return false;
        }

        debug!(hostname, identity = %identity.display(), "preparing agent");

        let store = AgentInfoStore::new(self.env.clone(), self.config.agent.expiry_hours);
        let manager = AgentManager::new(
            self.env.clone(),
            self.runner.clone(),
            store,
            self.config.agent.reuse,
        );

        match manager.ensure_key_loaded(&identity) {
            Ok(()) => {
                info!(hostname, "agent ready");
                true
            }
            Err(e) => {
                error!(hostname, error = %e, "ssh setup failed");
                false
            }
        }
    }

    /// The value Git should use as GIT_SSH_COMMAND when talking to
    /// `hostname`, with the agent already prepared.
    pub fn git_ssh_command(&self, hostname: &str) -> Option<String> {
        if !self.setup_ssh(hostname) {
            return None;
        }

        let identity = resolver::resolve_identity(&self.config, self.env.as_ref(), hostname)?;
        if !identity.exists() {
            warn!(path = %identity.display(), "identity file disappeared after setup");
            return None;
        }

        // Forward slashes even on Windows.
        Some(format!(
            "ssh -i {} -o StrictHostKeyChecking=no",
            forward_slashes(&identity)
        ))
    }

    /// Clone `url` into `dest`, preparing SSH for its host first.
    pub fn clone_repository(&self, url: &str, dest: &str, branch: Option<&str>) -> bool {
        let Some(hostname) = extract_hostname(url) else {
            error!(url, "could not extract hostname from url");
            return false;
        };

        let Some(ssh_command) = self.git_ssh_command(hostname) else {
            return false;
        };

        let mut args = vec!["clone"];
        if let Some(branch) = branch {
            args.extend(["--branch", branch]);
        }
        args.extend([url, dest]);

        info!(url, dest, "cloning repository");
        match self
            .runner
            .run("git", &args, &[("GIT_SSH_COMMAND", &ssh_command)])
        {
            Ok(output) if output.success() => true,
            Ok(output) => {
                error!(
                    code = ?output.code,
                    stderr = %output.stderr.trim(),
                    "git clone failed"
                );
                false
            }
            Err(e) => {
                error!(error = %e, "git clone failed");
                false
            }
        }
    }

    /// Probe SSH authentication to `hostname` the way Git would reach it.
    pub fn test_connection(&self, hostname: &str) -> bool {
        if !self.setup_ssh(hostname) {
            return false;
        }

        let target = format!("git@{}", hostname);
        let output = match self.runner.run(
            "ssh",
            &["-T", "-o", "StrictHostKeyChecking=no", &target],
            &[],
        ) {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "ssh probe failed to run");
                return false;
            }
        };

        // Git servers without shell access answer successful auth with 1.
        matches!(output.code, Some(0) | Some(1))
    }
}
