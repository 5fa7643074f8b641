use crate::agent::info::{epoch_seconds, AgentInfoStore};
use crate::config::Config;
use crate::env::ProcessEnv;
use crate::error::Result;
use crate::version;
use std::sync::Arc;

const REQUIRED_TOOLS: &[&str] = &["ssh", "ssh-agent", "ssh-add", "ssh-keygen", "git"];

pub fn execute(config: &Config) -> Result<()> {
    println!("keyhold {}", version::VERSION);

    println!("\nTools:");
    for tool in REQUIRED_TOOLS {
        let found = which::which(tool).is_ok();
        println!("  {:<11} {}", tool, if found { "found" } else { "missing" });
    }

    println!("\nConfiguration:");
    println!("  Reuse agent: {}", config.agent.reuse);
    println!("  Expiry: {}h", config.agent.expiry_hours);
    if let Some(identity) = &config.ssh.identity_file {
        println!("  Identity: {}", identity);
    }
    if let Some(config_path) = &config.ssh.config_path {
        println!("  SSH config: {}", config_path);
    }

    let store = AgentInfoStore::new(Arc::new(ProcessEnv), config.agent.expiry_hours);

    println!("\nCached agent:");
    match store.path() {
        Some(path) => println!("  File: {}", path.display()),
        None => {
            println!("  File: unknown (no home directory)");
            return Ok(());
        }
    }

    match store.load() {
        Some(info) => {
            let age = (epoch_seconds() - info.timestamp).max(0.0) as i64;
            println!("  Status: usable");
            println!("  SSH_AUTH_SOCK: {}", info.auth_sock);
            println!("  SSH_AGENT_PID: {}", info.agent_pid);
            println!("  Platform: {}", info.platform);
            println!("  Age: {}", format_age(age));
        }
        None => {
            println!("  Status: absent or stale");
        }
    }

    Ok(())
}

fn format_age(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}
