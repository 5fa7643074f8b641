/// Platform-specific facts about running an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Family tag recorded in the agent info file ("unix" or "windows").
    pub tag: &'static str,
    /// Program and arguments that start an agent in shell-output mode.
    pub agent_start_args: &'static [&'static str],
    /// Environment variable naming the user's home directory.
    pub home_var: &'static str,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform {
                tag: "windows",
                agent_start_args: &["ssh-agent", "-s"],
                home_var: "USERPROFILE",
            }
        } else {
            Platform {
                tag: "unix",
                agent_start_args: &["ssh-agent"],
                home_var: "HOME",
            }
        }
    }
}
