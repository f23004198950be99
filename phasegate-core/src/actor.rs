//! The identity on whose behalf an operation runs.

/// The caller of an operation.
///
/// Extensions receive the actor at every phase, typically to scope queries to
/// a tenant or to stamp creators and updaters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Actor {
    /// Stable identifier of the caller.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Tenant the caller belongs to.
    pub tenant: Option<String>,
}

impl Actor {
    /// Creates an actor with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            tenant: None,
        }
    }

    /// The actor used for calls that originate inside the system.
    pub fn system() -> Self {
        Self::new("system")
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the tenant.
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }
}
