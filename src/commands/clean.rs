use crate::agent::info::AgentInfoStore;
use crate::config::Config;
use crate::env::ProcessEnv;
use crate::error::Result;
use std::io::{self, Write};
use std::sync::Arc;

pub fn execute(config: &Config, yes: bool) -> Result<()> {
    let store = AgentInfoStore::new(Arc::new(ProcessEnv), config.agent.expiry_hours);

    let Some(path) = store.path() else {
        println!("No home directory, nothing to clean.");
        return Ok(());
    };

    if !path.exists() {
        println!("No cached agent info: {}", path.display());
        return Ok(());
    }

    println!("Cached agent info: {}", path.display());
    println!("Removing it makes the next setup start a fresh agent.");
    println!();

    // Prompt for confirmation unless --yes was provided
    if !yes {
        print!("Remove cached agent info? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input).ok();
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("Aborted.");
            return Ok(());
        }
    }

    if store.clear()? {
        println!("Removed {}", path.display());
    } else {
        println!("Nothing to remove.");
    }

    Ok(())
}
