use crate::config::Config;
use crate::setup::SshSetup;

pub fn execute(config: &Config, hostname: &str) -> bool {
    let setup = SshSetup::new(config.clone());

    println!("Testing SSH authentication to {}...", hostname);

    if !setup.test_connection(hostname) {
        eprintln!("Authentication to {} failed", hostname);
        return false;
    }

    println!("Authentication to {} works", hostname);
    true
}
