use crate::config::Config;
use crate::setup::SshSetup;

pub fn execute(config: &Config, hostname: &str) -> bool {
    let setup = SshSetup::new(config.clone());

    match setup.git_ssh_command(hostname) {
        Some(command) => {
            // Bare on stdout so it can be captured:
            //   GIT_SSH_COMMAND="$(keyhold ssh-command github.com)" git fetch
            println!("{}", command);
            true
        }
        None => {
            eprintln!("No SSH command available for {}", hostname);
            false
        }
    }
}
