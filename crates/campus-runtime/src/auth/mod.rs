//! Runtime side of authorization.
//!
//! Data types and the [`PermissionPolicy`] trait live in `campus-auth`.
//! This module provides the implementations the engine wires in:
//!
//! - [`DefaultPolicy`]: audited [`PermissionPolicy`]
//! - [`IdentityProvider`] / [`StaticIdentities`]: username → [`Identity`]
//!
//! # Architecture
//!
//! ```text
//! campus-auth (traits + data types)
//!     Grants, Requirement, RolePermissions, PermissionPolicy
//!         ↓
//! campus-runtime/auth (implementations)
//!     DefaultPolicy, Identity, IdentityProvider, StaticIdentities
//! ```

mod checker;
mod identity;

pub use checker::DefaultPolicy;
pub use identity::{Identity, IdentityProvider, StaticIdentities};

pub use campus_auth::{AccessDenied, Grants, PermissionPolicy, Requirement, RolePermissions};
