use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "keyhold")]
#[command(about = "Keep one unlocked ssh-agent alive across repeated Git operations", long_about = None)]
#[command(version = env!("KEYHOLD_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Identity file to use, overriding config and SSH config resolution
    #[arg(short = 'i', long = "identity", global = true, env = "KEYHOLD_IDENTITY")]
    pub identity: Option<String>,

    /// Always start a fresh agent instead of reusing a cached one
    #[arg(long = "no-reuse", global = true)]
    pub no_reuse: bool,

    /// Show verbose output including agent probing
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the key for a host and load it into a running agent
    Setup {
        /// Host to prepare, e.g. github.com
        hostname: String,
    },

    /// Clone a repository with the agent prepared for its host
    Clone {
        /// Repository URL in scp form, e.g. git@github.com:user/repo.git
        url: String,

        /// Directory to clone into
        dest: String,

        /// Branch to check out
        #[arg(long)]
        branch: Option<String>,
    },

    /// Print the GIT_SSH_COMMAND value for a host
    SshCommand {
        /// Host the command should target
        hostname: String,
    },

    /// Check that SSH authentication to a host works
    Test {
        /// Host to authenticate against
        hostname: String,
    },

    /// Show tool availability and the cached agent state
    Status,

    /// Remove the cached agent info file
    Clean {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}
