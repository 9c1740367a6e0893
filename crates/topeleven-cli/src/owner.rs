//! Acting-owner resolution for mutating commands.
//!
//! The resolution chain: `--owner` flag > `T11_OWNER` env > `owner` in the user
//! config file. Read-only commands work without an owner.

/// Errors from owner resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerResolutionError {
    /// Human-readable description.
    pub message: String,
    /// Machine error code.
    pub code: &'static str,
}

impl std::fmt::Display for OwnerResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for OwnerResolutionError {}

/// Pick the acting owner from the flag or the already-resolved config value
/// (which covers `T11_OWNER` and the user config).
pub fn resolve_owner(cli_flag: Option<&str>, configured: Option<&str>) -> Option<String> {
    cli_flag
        .map(str::trim)
        .filter(|owner| !owner.is_empty())
        .or_else(|| configured.map(str::trim).filter(|owner| !owner.is_empty()))
        .map(str::to_string)
}

/// Resolve the owner, returning an error if none is configured.
pub fn require_owner(
    cli_flag: Option<&str>,
    configured: Option<&str>,
) -> Result<String, OwnerResolutionError> {
    resolve_owner(cli_flag, configured).ok_or_else(|| OwnerResolutionError {
        message: "Owner identity required for this command. \
                  Set --owner, T11_OWNER, or `owner` in the user config."
            .to_string(),
        code: "missing_owner",
    })
}
