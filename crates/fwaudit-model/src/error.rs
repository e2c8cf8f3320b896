//! Error types for the rule model.

/// Model errors.
///
/// Nothing is recovered locally; every error carries enough context for one
/// actionable log line at the shell. Invariants that hold by construction
/// (range bounds, variable block widths) are asserted, not returned.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Address token failed the strict or loose parse.
    #[error("'{token}' is not a valid IP address: {reason}")]
    InvalidAddress { token: String, reason: String },

    /// Protocol/port token failed the parse.
    #[error("'{token}' is not a valid protocol/port specification")]
    InvalidService { token: String },

    /// An object id ran past the capacity of its domain.
    #[error("{domain} domain is full: cannot allocate id {id}")]
    DomainOverflow { domain: &'static str, id: u128 },

    /// Two rules with the same id reached one firewall.
    #[error("duplicate rule id {id}")]
    DuplicateRuleId { id: u32 },

    /// Pool or group resolution looped back on itself.
    #[error("group cycle detected at '{name}'")]
    CycleInGroup { name: String },

    /// A command referenced a rule that does not exist.
    #[error("rule {id} not found")]
    RuleNotFound { id: u32 },

    /// A command referenced a firewall that does not exist.
    #[error("firewall '{name}' not found")]
    FirewallNotFound { name: String },

    /// Cooperative cancellation observed during a long pass.
    #[error("** interrupted **")]
    Interrupted,
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
