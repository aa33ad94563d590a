//! Service configuration.
//!
//! [`ApprovalConfig`] is built once at process start, from a JSON document
//! or from environment variables, and shared by reference with the
//! components that need it.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the base of approve/decline links.
pub const LINK_BASE_VAR: &str = "COUNTERSIGN_LINK_BASE";
/// Environment variable holding the store call timeout in milliseconds.
pub const STORE_TIMEOUT_VAR: &str = "COUNTERSIGN_STORE_TIMEOUT_MS";
/// Environment variable enabling notifications on intermediate approvals.
pub const NOTIFY_ON_ADVANCE_VAR: &str = "COUNTERSIGN_NOTIFY_ON_ADVANCE";
/// Environment variable enabling notifications on decline.
pub const NOTIFY_ON_DECLINE_VAR: &str = "COUNTERSIGN_NOTIFY_ON_DECLINE";
/// Environment variable selecting the delete policy.
pub const DELETE_POLICY_VAR: &str = "COUNTERSIGN_DELETE_POLICY";
/// Environment variable holding the tracing filter directive.
pub const LOG_FILTER_VAR: &str = "COUNTERSIGN_LOG_FILTER";

const DEFAULT_LINK_BASE: &str = "localhost:5000/task/v1";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_LOG_FILTER: &str = "countersign=info";

/// Which transitions, beyond creation and final approval, notify anyone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationPolicy {
    /// Ask the new turn-holder to act after an intermediate approval.
    pub notify_on_advance: bool,
    /// Tell the initiator when a coordinator declines.
    pub notify_on_decline: bool,
}

/// Which tasks an initiator may delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Any task, whatever its status.
    #[default]
    Any,
    /// Only tasks that are not yet approved or declined.
    UnresolvedOnly,
}

impl DeletePolicy {
    /// Returns the canonical text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::UnresolvedOnly => "unresolved_only",
        }
    }
}

impl TryFrom<&str> for DeletePolicy {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "unresolved_only" => Ok(Self::UnresolvedOnly),
            _ => Err(ConfigError::InvalidValue {
                variable: DELETE_POLICY_VAR,
                value: value.to_owned(),
                expected: "any or unresolved_only",
            }),
        }
    }
}

/// Configuration for the approval services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApprovalConfig {
    /// Base prepended to `/approve/...` and `/decline/...` links.
    pub action_link_base: String,
    /// Upper bound for each store call, in milliseconds.
    pub store_timeout_ms: u64,
    /// Optional notifications.
    pub notifications: NotificationPolicy,
    /// Delete restrictions.
    pub delete_policy: DeletePolicy,
    /// `tracing` filter directive.
    pub log_filter: String,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            action_link_base: DEFAULT_LINK_BASE.to_owned(),
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            notifications: NotificationPolicy::default(),
            delete_policy: DeletePolicy::default(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl ApprovalConfig {
    /// Returns the store call timeout.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Parses a JSON document; omitted fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed documents or unknown
    /// fields, and a validation error for out-of-range values.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()
    }

    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ApprovalConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps variable names to
    /// values. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for values that do not parse,
    /// and a validation error for out-of-range values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(LINK_BASE_VAR) {
            config.action_link_base = value;
        }
        if let Some(value) = lookup(STORE_TIMEOUT_VAR) {
            config.store_timeout_ms = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                variable: STORE_TIMEOUT_VAR,
                value: value.clone(),
                expected: "a whole number of milliseconds",
            })?;
        }
        if let Some(value) = lookup(NOTIFY_ON_ADVANCE_VAR) {
            config.notifications.notify_on_advance = parse_flag(NOTIFY_ON_ADVANCE_VAR, &value)?;
        }
        if let Some(value) = lookup(NOTIFY_ON_DECLINE_VAR) {
            config.notifications.notify_on_decline = parse_flag(NOTIFY_ON_DECLINE_VAR, &value)?;
        }
        if let Some(value) = lookup(DELETE_POLICY_VAR) {
            config.delete_policy = DeletePolicy::try_from(value.as_str())?;
        }
        if let Some(value) = lookup(LOG_FILTER_VAR) {
            config.log_filter = value;
        }

        config.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        let base = self.action_link_base.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(ConfigError::EmptyLinkBase);
        }
        self.action_link_base = base.to_owned();

        if self.store_timeout_ms == 0 {
            return Err(ConfigError::ZeroStoreTimeout);
        }
        Ok(self)
    }
}

fn parse_flag(variable: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            variable,
            value: value.to_owned(),
            expected: "true or false",
        }),
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),

    /// A variable holds a value that does not parse.
    #[error("invalid value '{value}' for {variable}, expected {expected}")]
    InvalidValue {
        /// Variable name.
        variable: &'static str,
        /// Offending value.
        value: String,
        /// Description of accepted values.
        expected: &'static str,
    },

    /// The link base is blank.
    #[error("action link base must not be empty")]
    EmptyLinkBase,

    /// The store timeout is zero.
    #[error("store timeout must be greater than zero")]
    ZeroStoreTimeout,
}
