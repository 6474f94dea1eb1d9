//! Caller identity as resolved by the hosting platform.
//!
//! The platform tells us which organization is invoking an operation and
//! hands over that organization's identity token. How it does so (client
//! certificates, MSP lookups, ...) is outside this workspace.

use serde::{Deserialize, Serialize};

use crate::{OrgId, Result};

/// The organization invoking an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    /// Organization / membership id. Scopes the private partition.
    pub org: OrgId,
    /// Identity token of the invoking client, mixed into owner hashes.
    pub identity_token: String,
}

impl CallerIdentity {
    #[must_use]
    pub fn new(org: impl Into<String>, identity_token: impl Into<String>) -> Self {
        Self {
            org: OrgId::new(org),
            identity_token: identity_token.into(),
        }
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.org)
    }
}

/// Resolves the identity of the current caller.
pub trait IdentityGateway {
    fn caller(&self) -> Result<CallerIdentity>;
}

/// An already-resolved identity resolves to itself.
impl IdentityGateway for CallerIdentity {
    fn caller(&self) -> Result<CallerIdentity> {
        Ok(self.clone())
    }
}
