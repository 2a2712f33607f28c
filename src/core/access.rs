//! Role-based access checks.
//!
//! Every role-gated operation names a [`Capability`]; the roles allowed to use it
//! are listed once here instead of being repeated at each call site.

use crate::{
    entities::Role,
    errors::{Error, Result},
};

/// Something an account may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Submit a new credit for audit
    SubmitCredit,
    /// Approve or reject a pending credit
    AuditCredit,
    /// Buy tons from an approved credit
    PurchaseCredit,
    /// See the producer dashboard
    ProducerDashboard,
    /// See the company dashboard
    CompanyDashboard,
    /// See the admin dashboard
    AdminDashboard,
    /// List credits (a producer's own, or all for an admin)
    ListCredits,
    /// List every registered account
    ListAccounts,
}

impl Capability {
    /// Roles that hold this capability.
    #[must_use]
    pub const fn required_roles(self) -> &'static [Role] {
        match self {
            Self::SubmitCredit | Self::ProducerDashboard => &[Role::Producer],
            Self::PurchaseCredit | Self::CompanyDashboard => &[Role::Company],
            Self::AuditCredit | Self::AdminDashboard | Self::ListAccounts => &[Role::Admin],
            Self::ListCredits => &[Role::Producer, Role::Admin],
        }
    }

    /// Human-readable action for error messages.
    #[must_use]
    pub const fn action(self) -> &'static str {
        match self {
            Self::SubmitCredit => "submit credits",
            Self::AuditCredit => "audit credits",
            Self::PurchaseCredit => "purchase credits",
            Self::ProducerDashboard => "view the producer dashboard",
            Self::CompanyDashboard => "view the company dashboard",
            Self::AdminDashboard => "view the admin dashboard",
            Self::ListCredits => "list credits",
            Self::ListAccounts => "list accounts",
        }
    }
}

/// Returns true if `role` is one of `required_roles`.
#[must_use]
pub fn account_can_access(role: Role, required_roles: &[Role]) -> bool {
    required_roles.contains(&role)
}

/// Fails with [`Error::Forbidden`] unless `role` holds `capability`.
pub fn require(role: Role, capability: Capability) -> Result<()> {
    if account_can_access(role, capability.required_roles()) {
        Ok(())
    } else {
        Err(Error::Forbidden {
            role,
            action: capability.action(),
        })
    }
}
