//! Hostname validation and extraction from scp-style Git URLs.

/// Check that `hostname` is plausible as an SSH destination: non-empty, at
/// most 255 characters, and built only from ASCII letters, digits, hyphens,
/// and dots.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 255 {
        return false;
    }
    hostname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Extract the hostname from an scp-style URL of the form
/// `user@host:path`, e.g. `git@github.com:user/repo.git`.
///
/// Returns `None` for every other URL shape, including https URLs. Git
/// treats those natively, so there is no agent to prepare for them.
pub fn extract_hostname(url: &str) -> Option<&str> {
    // Split on the first ':' so the path may itself contain ':' or '@'.
    let (user_host, path) = url.split_once(':')?;

    if path.trim_matches('/').is_empty() {
        return None;
    }

    let (user, host) = user_host.split_once('@')?;
    if user.is_empty() || host.is_empty() || host.contains('@') {
        return None;
    }

    if !is_valid_hostname(host) {
        return None;
    }

    // No leading or trailing separator characters.
    let first = host.chars().next()?;
    let last = host.chars().last()?;
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return None;
    }

    Some(host)
}
