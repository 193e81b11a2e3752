//! Core types shared by every campus crate.
//!
//! # Crate Architecture
//!
//! ```text
//! campus-types   (SessionId, CallerId, Principal, ErrorCode)  ◄── THIS CRATE
//!      ↑
//! campus-auth    (Role, AccessLevel, Permission, Grants, PermissionPolicy)
//!      ↑
//! campus-runtime (registry, parser, executor, editor, adapters, sessions)
//!      ↑
//! campus-cli     (campus binary)
//! ```
//!
//! This crate has no logic beyond identity and error classification, so
//! every layer above can depend on it without cycles.

pub mod error;
pub mod id;
pub mod principal;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{CallerId, SessionId};
pub use principal::Principal;
