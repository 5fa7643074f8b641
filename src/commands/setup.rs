use crate::config::Config;
use crate::setup::SshSetup;

pub fn execute(config: &Config, hostname: &str) -> bool {
    let setup = SshSetup::new(config.clone());

    if !setup.setup_ssh(hostname) {
        eprintln!("SSH setup failed for {}", hostname);
        return false;
    }

    println!("Agent ready for {}", hostname);
    true
}
