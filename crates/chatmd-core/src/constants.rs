//! Package-level constants.

/// Current version of the chatmd engine (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "chatmd";

/// Name assigned to code-cell output messages after relabeling.
pub const CELL_OUTPUT_NAME: &str = "cell_output";

/// Name synthesized for the implicit first message of a headerless body.
pub const IMPLICIT_USER_NAME: &str = "user";

/// Name synthesized for the implicit counterpart when `user` is the only
/// participant.
pub const IMPLICIT_ASSISTANT_NAME: &str = "assistant";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3, "VERSION must be semver (MAJOR.MINOR.PATCH)");
        for part in parts {
            let _: u32 = part.parse().expect("each semver segment must be a number");
        }
    }

    #[test]
    fn name_is_lowercase() {
        assert_eq!(NAME, NAME.to_lowercase());
    }

    #[test]
    fn reserved_names_distinct() {
        assert_ne!(CELL_OUTPUT_NAME, IMPLICIT_USER_NAME);
        assert_ne!(IMPLICIT_USER_NAME, IMPLICIT_ASSISTANT_NAME);
    }
}
