//! Audited authorization policy.
//!
//! [`DefaultPolicy`] is the guard the executor consults before every
//! handler call. It applies [`campus_auth::evaluate`] and records the
//! check details at debug level. The denial audit event itself is
//! written by the executor, so it is kept whatever policy is installed.
//!
//! The executor wraps each dispatch in a span carrying the session,
//! caller and command, so these events need only the check details.
//!
//! # Example
//!
//! ```
//! use campus_auth::{Grants, PermissionPolicy, Requirement, Role};
//! use campus_runtime::auth::DefaultPolicy;
//!
//! let policy = DefaultPolicy;
//! let user = Grants::new().with_role(Role::User);
//!
//! assert!(policy.authorize(&user, &Requirement::none()).is_ok());
//! assert!(policy
//!     .authorize(&user, &Requirement::none().with_role(Role::Admin))
//!     .is_err());
//! ```

use campus_auth::{evaluate, AccessDenied, Grants, PermissionPolicy, Requirement};

/// Standard authorization policy with audit logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl PermissionPolicy for DefaultPolicy {
    fn authorize(&self, grants: &Grants, requirement: &Requirement) -> Result<(), AccessDenied> {
        match evaluate(grants, requirement) {
            Ok(()) => {
                tracing::debug!(
                    requirement = %requirement,
                    role = ?grants.highest_role(),
                    level = %grants.access_level(),
                    "authorization allowed"
                );
                Ok(())
            }
            Err(denied) => {
                tracing::debug!(
                    requirement = %requirement,
                    role = ?grants.highest_role(),
                    level = %grants.access_level(),
                    check = denied.layer(),
                    reason = %denied,
                    "authorization denied"
                );
                Err(denied)
            }
        }
    }
}
