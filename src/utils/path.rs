use crate::env::Env;
use std::path::{Path, PathBuf};

/// Expand tilde (~) in paths to actual home directories.
///
/// Supports:
/// - `~` or `~/path` - expands to the current user's home directory
/// - `~username/path` - expands to the specified user's home directory
///   (Unix only)
///
/// # Examples
///
/// ```
/// use keyhold::env::MemoryEnv;
/// use keyhold::utils::path::expand_tilde;
/// use std::path::Path;
///
/// let env = MemoryEnv::with_home(Path::new("/home/tester"));
/// let path = expand_tilde("~/Documents", &env).unwrap();
/// assert_eq!(path, Path::new("/home/tester/Documents"));
/// ```
pub fn expand_tilde<P: AsRef<Path>>(path: P, env: &dyn Env) -> Option<PathBuf> {
    let path = path.as_ref();
    let path_str = path.to_str()?;

    if !path_str.starts_with('~') {
        return Some(path.to_path_buf());
    }

    let after_tilde = &path_str[1..];

    // Case 1: Just ~ or ~/...
    if after_tilde.is_empty() || after_tilde.starts_with('/') {
        let home = env.home_dir()?;
        return Some(home.join(after_tilde.trim_start_matches('/')));
    }

    // Case 2: ~username/... or ~username
    let username_end = after_tilde.find('/').unwrap_or(after_tilde.len());
    let username = &after_tilde[..username_end];
    let rest = after_tilde[username_end..].trim_start_matches('/');

    other_user_home(username).map(|home| home.join(rest))
}

#[cfg(unix)]
fn other_user_home(username: &str) -> Option<PathBuf> {
    use uzers::os::unix::UserExt;

    let user = uzers::get_user_by_name(username)?;
    Some(user.home_dir().to_path_buf())
}

#[cfg(not(unix))]
fn other_user_home(_username: &str) -> Option<PathBuf> {
    None
}

/// Path rendered with forward slashes regardless of platform, the form the
/// ssh command line accepts everywhere.
pub fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
