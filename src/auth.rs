//! Authorization context for tenant-scoped operations.
//!
//! The access-control layer resolves the caller once per request and hands
//! the result to every core operation. Core code never re-derives "the
//! current user's company" on its own.

use serde::{Deserialize, Serialize};

use crate::model::{CompanyId, TechnicianId};

/// Who is acting. Resolved once by `Db::resolve_role`; the old pattern of
/// probing "is this user a technician?" and swallowing the miss is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role")]
pub enum Role {
    /// Company owner: full access to the company's data.
    Owner { company_id: CompanyId },
    /// Technician: sees their own orders and reports their own location.
    Technician {
        company_id: CompanyId,
        technician_id: TechnicianId,
    },
    /// No known association. Callers must reject, not guess.
    Unknown,
}

impl Role {
    pub fn company_id(&self) -> Option<CompanyId> {
        match self {
            Role::Owner { company_id } | Role::Technician { company_id, .. } => Some(*company_id),
            Role::Unknown => None,
        }
    }
}

/// Per-request authorization context. Every tenant-scoped `Db` operation
/// takes one and filters by its company.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub company_id: CompanyId,
    pub role: Role,
}

impl AuthContext {
    /// Context for an owner of `company_id`.
    pub fn owner(company_id: CompanyId) -> Self {
        Self {
            company_id,
            role: Role::Owner { company_id },
        }
    }

    /// Context for a technician acting within their company.
    pub fn technician(company_id: CompanyId, technician_id: TechnicianId) -> Self {
        Self {
            company_id,
            role: Role::Technician {
                company_id,
                technician_id,
            },
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self.role, Role::Owner { .. })
    }
}
