use crate::config::Config;
use crate::setup::SshSetup;

pub fn execute(config: &Config, url: &str, dest: &str, branch: Option<&str>) -> bool {
    let setup = SshSetup::new(config.clone());

    println!("Cloning {} into {}...", url, dest);

    if !setup.clone_repository(url, dest, branch) {
        eprintln!("Clone failed: {}", url);
        return false;
    }

    println!("Cloned successfully: {}", dest);
    true
}
