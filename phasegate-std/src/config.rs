//! Assembly configuration.
//!
//! Everything here is plain data with builder-style setters. With the `serde`
//! feature it can be loaded from any serde format:
//!
//! ```toml
//! insert_ignore = true
//!
//! [audit_log]
//! enabled = true
//! level = "debug"
//! ```

/// The level completed calls are logged at by the audit logger.
///
/// Failed calls are always logged at `warn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum AuditLevel {
    /// `tracing::Level::INFO`.
    #[default]
    Info,
    /// `tracing::Level::DEBUG`.
    Debug,
    /// `tracing::Level::TRACE`.
    Trace,
}

/// Settings of the audit logger appended to every operation's terminal phase.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct AuditLogConfig {
    /// Whether successful calls are logged. Failures are logged regardless.
    pub enabled: bool,
    /// The level successful calls are logged at.
    pub level: AuditLevel,
}

impl Default for AuditLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: AuditLevel::Info,
        }
    }
}

impl AuditLogConfig {
    /// Sets whether successful calls are logged.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the level successful calls are logged at.
    pub fn level(mut self, level: AuditLevel) -> Self {
        self.level = level;
        self
    }
}

/// Settings of a [`DispatcherFactory`](crate::DispatcherFactory).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FactoryConfig {
    /// Passed to the port on create: duplicates are skipped instead of failing.
    pub insert_ignore: bool,
    /// The audit logger's settings.
    pub audit_log: AuditLogConfig,
}

impl FactoryConfig {
    /// The default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the insert-ignore flag.
    pub fn insert_ignore(mut self, ignore: bool) -> Self {
        self.insert_ignore = ignore;
        self
    }

    /// Replaces the audit logger's settings.
    pub fn audit_log(mut self, audit_log: AuditLogConfig) -> Self {
        self.audit_log = audit_log;
        self
    }
}
