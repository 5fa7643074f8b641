use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A keyhold command with its home pointed at an isolated temp directory
/// and every ambient override cleared, so tests never touch the real
/// ~/.ssh or a running agent.
fn keyhold_in(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("keyhold"));
    cmd.env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .env_remove("SSH_IDENTITY_FILE")
        .env_remove("SSH_IDENTITY_CONTENT")
        .env_remove("KEYHOLD_IDENTITY")
        .env_remove("KEYHOLD_REUSE_AGENT")
        .env_remove("KEYHOLD_EXPIRY_HOURS")
        .env_remove("KEYHOLD_SSH_CONFIG")
        .env_remove("RUST_LOG");
    cmd.current_dir(home.path());
    cmd
}

#[test]
fn test_help_output() {
    let home = TempDir::new().unwrap();
    let mut cmd = keyhold_in(&home);
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Keep one unlocked ssh-agent alive",
        ))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_output() {
    let home = TempDir::new().unwrap();
    let mut cmd = keyhold_in(&home);
    cmd.arg("--version");

    let output = cmd.assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);

    assert!(stdout.starts_with("keyhold "));
    let version_part = stdout.strip_prefix("keyhold ").unwrap().trim();
    assert!(
        version_part.chars().next().unwrap().is_numeric(),
        "Version should start with a number: {}",
        version_part
    );
}

#[test]
fn test_subcommand_help() {
    let home = TempDir::new().unwrap();
    let mut cmd = keyhold_in(&home);
    cmd.args(["clone", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Clone a repository"))
        .stdout(predicate::str::contains("--branch"));
}

#[test]
fn test_setup_fails_without_any_key() {
    let home = TempDir::new().unwrap();
    let mut cmd = keyhold_in(&home);
    cmd.args(["setup", "github.com"]);

    // An empty home has no key to resolve, so setup stops before touching
    // any agent.
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("SSH setup failed"));
}

#[test]
fn test_setup_rejects_invalid_hostname() {
    let home = TempDir::new().unwrap();
    let mut cmd = keyhold_in(&home);
    cmd.args(["setup", "bad_host.com"]);

    cmd.assert().failure().code(1);
}

#[test]
fn test_clone_rejects_non_scp_url() {
    let home = TempDir::new().unwrap();
    let mut cmd = keyhold_in(&home);
    cmd.args(["clone", "https://github.com/user/repo.git", "dest"]);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Clone failed"));
}

#[test]
fn test_ssh_command_fails_without_any_key() {
    let home = TempDir::new().unwrap();
    let mut cmd = keyhold_in(&home);
    cmd.args(["ssh-command", "github.com"]);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No SSH command available"));
}

#[test]
fn test_status_reports_missing_cache() {
    let home = TempDir::new().unwrap();
    let mut cmd = keyhold_in(&home);
    cmd.arg("status");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Tools:"))
        .stdout(predicate::str::contains("absent or stale"));
}

#[test]
fn test_clean_without_cache() {
    let home = TempDir::new().unwrap();
    let mut cmd = keyhold_in(&home);
    cmd.args(["clean", "-y"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No cached agent info"));
}

#[test]
fn test_clean_removes_cache_file() {
    let home = TempDir::new().unwrap();
    let ssh_dir = home.path().join(".ssh");
    std::fs::create_dir_all(&ssh_dir).unwrap();
    let info_path = ssh_dir.join("agent_info.json");
    std::fs::write(&info_path, "{}").unwrap();

    let mut cmd = keyhold_in(&home);
    cmd.args(["clean", "-y"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Removed"));
    assert!(!info_path.exists());
}

#[test]
fn test_config_file_is_honored() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join(".keyhold.toml"),
        "[agent]\nexpiry_hours = 7\n",
    )
    .unwrap();

    let mut cmd = keyhold_in(&home);
    cmd.arg("status");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Expiry: 7h"));
}

#[test]
fn test_broken_config_file_is_an_error() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".keyhold.toml"), "[agent\nbroken").unwrap();

    let mut cmd = keyhold_in(&home);
    cmd.arg("status");

    cmd.assert().failure();
}

#[test]
fn test_unknown_subcommand_suggests() {
    let home = TempDir::new().unwrap();
    let mut cmd = keyhold_in(&home);
    cmd.arg("stats");

    // clap exits 2 on usage errors
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("status"));
}
