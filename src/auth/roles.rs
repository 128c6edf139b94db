// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! User roles and the authorization gate.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `SuperAdmin` - authorized for every gated operation
/// - `Admin` - platform operations; NOT authorized for super-admin-only
///   operations such as system settings
/// - `User` - normal investor account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Normal investor account
    User,
    /// Platform administrator
    Admin,
    /// Full administrative access, including system settings
    SuperAdmin,
}

impl Role {
    /// Parse role from string (case-insensitive, accepts `SUPER_ADMIN`).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_uppercase().as_str() {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            "SUPER_ADMIN" | "SUPERADMIN" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    /// Whether this role may use the admin application.
    pub fn is_admin_capable(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl Default for Role {
    /// Default role is User (least privilege for authenticated accounts).
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
            Role::SuperAdmin => write!(f, "SUPER_ADMIN"),
        }
    }
}

/// Decide whether a principal with `role` may perform an operation gated on
/// `required`.
///
/// With no required role, any resolved principal passes (authentication-only
/// gate). Otherwise the role must match exactly, except that `SuperAdmin`
/// passes every gate. `Admin` does not satisfy super-admin-only gates.
///
/// Callers evaluate this on every gated request with the freshly resolved
/// principal; the decision is never cached across requests, so a role change
/// takes effect on the next request (bounded by access-token lifetime).
pub fn authorize(role: Role, required: Option<Role>) -> bool {
    match required {
        None => true,
        Some(required) => role == required || role == Role::SuperAdmin,
    }
}
