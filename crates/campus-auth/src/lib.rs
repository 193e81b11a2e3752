//! Permission model for campus command authorization.
//!
//! # Three Independent Checks
//!
//! ```text
//! Allowed = Permission(WHAT token) ∧ Role(WHO, hierarchical) ∧ AccessLevel(HOW MUCH)
//! ```
//!
//! | Check | Type | Satisfied when |
//! |-------|------|----------------|
//! | permission | [`Permission`] | a held token equals it, is `*`/`all`, or is a matching `ns.*` |
//! | role | [`Role`] | the highest held role ranks at or above it |
//! | access level | [`AccessLevel`] | the held level ranks at or above it |
//!
//! A [`Requirement`] carries any subset of the three; [`evaluate`] ANDs
//! the present ones against a caller's [`Grants`].
//!
//! # Crate Architecture
//!
//! ```text
//! campus-types  (SessionId, Principal, ErrorCode)
//!      ↑
//! campus-auth   ◄── THIS CRATE (pure data + comparison, no I/O)
//!      ↑
//! campus-runtime (DefaultPolicy with audit logging, executor)
//! ```

pub mod access;
pub mod defaults;
pub mod error;
pub mod grants;
pub mod permission;
pub mod policy;
pub mod requirement;
pub mod role;

pub use access::{access_level_satisfies, AccessLevel};
pub use defaults::RolePermissions;
pub use error::AccessDenied;
pub use grants::Grants;
pub use permission::{permission_satisfies, Permission, PermissionSet};
pub use policy::PermissionPolicy;
pub use requirement::{evaluate, Requirement};
pub use role::{role_satisfies, Role, UnknownName};

pub use campus_types::Principal;
