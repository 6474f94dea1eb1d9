//! Fixture constructors shared by tests across the workspace.

use crate::{BondSpec, CallerIdentity};

/// A bond request for `cusip` with the given face and a fixed pool name.
#[must_use]
pub fn bond_spec(cusip: &str, original_face: u64) -> BondSpec {
    BondSpec {
        uid: None,
        name: "FR RA7777".to_string(),
        cusip: cusip.to_string(),
        original_face,
        classes: vec!["passthrough".to_string(), "MBS 30yr".to_string()],
    }
}

/// Caller for organization `org` with a token derived from its name.
#[must_use]
pub fn caller(org: &str) -> CallerIdentity {
    CallerIdentity::new(org, format!("x509::CN={org}-client::O={org}"))
}
