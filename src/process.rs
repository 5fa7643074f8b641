use crate::error::{KeyholdError, Result};
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Seam for the external programs this crate drives (ssh-agent, ssh-add,
/// ssh-keygen, ssh, git). The agent lifecycle is decided entirely from exit
/// codes and captured output, so tests substitute a scripted implementation.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, blocking until it exits. `envs` are set on
    /// top of the inherited environment.
    fn run(&self, program: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<CommandOutput>;
}

/// Runs real child processes with captured output. Stdin stays inherited so
/// ssh-add can still prompt for a passphrase on a terminal.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        // output() nulls stdin unless it is configured explicitly.
        cmd.stdin(Stdio::inherit());

        for (key, value) in envs {
            cmd.env(key, value);
        }

        let output = cmd
            .output()
            .map_err(|e| KeyholdError::CommandFailed(format!("{}: {}", program, e)))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// One invocation seen by a [`ScriptedRunner`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Program followed by its arguments.
    pub command: Vec<String>,
    pub envs: Vec<(String, String)>,
}

/// Scripted stand-in for tests: replays canned outputs and records every
/// invocation. Responses are matched by program name and argument prefix, in
/// registration order, and are not consumed.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Vec<ScriptedResponse>,
    calls: Mutex<Vec<RecordedCall>>,
}

struct ScriptedResponse {
    program: String,
    args_prefix: Vec<String>,
    // None means the program fails to launch.
    output: Option<CommandOutput>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `program` invocations whose arguments start with
    /// `args_prefix`.
    pub fn respond(mut self, program: &str, args_prefix: &[&str], output: CommandOutput) -> Self {
        self.responses.push(ScriptedResponse {
            program: program.to_string(),
            args_prefix: args_prefix.iter().map(|s| s.to_string()).collect(),
            output: Some(output),
        });
        self
    }

    /// Treat every invocation of `program` as unlaunchable.
    pub fn fail_to_spawn(mut self, program: &str) -> Self {
        self.responses.push(ScriptedResponse {
            program: program.to_string(),
            args_prefix: Vec::new(),
            output: None,
        });
        self
    }

    /// Every call made so far, as `[program, arg...]` vectors.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.command.clone())
            .collect()
    }

    /// Every call made so far, with the extra environment each one got.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times `program` was invoked.
    pub fn invocations_of(&self, program: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.command[0] == program)
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<CommandOutput> {
        let mut command = vec![program.to_string()];
        command.extend(args.iter().map(|s| s.to_string()));
        self.calls.lock().unwrap().push(RecordedCall {
            command,
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        let response = self
            .responses
            .iter()
            .find(|r| {
                r.program == program
                    && args.len() >= r.args_prefix.len()
                    && r.args_prefix
                        .iter()
                        .zip(args.iter())
                        .all(|(expected, actual)| expected == actual)
            })
            .ok_or_else(|| {
                KeyholdError::CommandFailed(format!(
                    "no scripted response for {} {:?}",
                    program, args
                ))
            })?;

        match &response.output {
            Some(output) => Ok(output.clone()),
            None => Err(KeyholdError::CommandFailed(format!(
                "{}: failed to launch",
                program
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exit(code: i32, stdout: &str) -> CommandOutput {
        CommandOutput {
            code: Some(code),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_scripted_runner_matches_by_argument_prefix() {
        let runner = ScriptedRunner::new()
            .respond("ssh-add", &["-l"], exit(0, "listing"))
            .respond("ssh-add", &[], exit(0, "added"));

        let listing = runner.run("ssh-add", &["-l"], &[]).unwrap();
        assert_eq!(listing.stdout, "listing");

        let added = runner.run("ssh-add", &["/some/key"], &[]).unwrap();
        assert_eq!(added.stdout, "added");
    }

    #[test]
    fn test_scripted_runner_records_calls() {
        let runner = ScriptedRunner::new().respond("git", &[], exit(0, ""));

        runner
            .run("git", &["clone", "url"], &[("GIT_SSH_COMMAND", "ssh -i key")])
            .unwrap();

        assert_eq!(runner.invocations_of("git"), 1);
        assert_eq!(runner.calls(), vec![vec!["git", "clone", "url"]]);

        let recorded = runner.recorded_calls();
        assert_eq!(
            recorded[0].envs,
            vec![("GIT_SSH_COMMAND".to_string(), "ssh -i key".to_string())]
        );
    }

    #[test]
    fn test_scripted_runner_rejects_unscripted_calls() {
        let runner = ScriptedRunner::new();
        let err = runner.run("ssh-agent", &[], &[]).unwrap_err();
        assert!(matches!(err, KeyholdError::CommandFailed(_)));
    }

    #[test]
    fn test_scripted_runner_spawn_failure() {
        let runner = ScriptedRunner::new().fail_to_spawn("ssh-agent");
        assert!(runner.run("ssh-agent", &[], &[]).is_err());
        // The attempt is still recorded.
        assert_eq!(runner.invocations_of("ssh-agent"), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_system_runner_inherits_stdin() {
        // The child must see this process's stdin, not the null device,
        // or ssh-add could never prompt for a passphrase.
        let parent = std::fs::read_link("/proc/self/fd/0").unwrap();

        let output = SystemRunner
            .run("sh", &["-c", "readlink /proc/self/fd/0"], &[])
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), parent.to_string_lossy());
    }
}
