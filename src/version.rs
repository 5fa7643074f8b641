// Compile-time constants from Cargo.toml and build.rs
pub const VERSION: &str = env!("KEYHOLD_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(PKG_NAME, "keyhold");
    }

    #[test]
    fn test_version_format() {
        // Either a plain version (release) or "-dev+hash" (debug)
        // Examples: "0.3.0" or "0.3.0-dev+a1b2c3d4" or "0.3.0-dev+a1b2c3d4.dirty"
        assert!(
            VERSION.chars().next().unwrap().is_numeric(),
            "Version should start with a number"
        );
    }
}
