//! Authorization guard trait.
//!
//! The trait lives here; the audited implementation (`DefaultPolicy`)
//! lives in `campus-runtime` next to the executor that calls it.

use crate::error::AccessDenied;
use crate::grants::Grants;
use crate::requirement::Requirement;

/// Decides whether grants meet a requirement.
///
/// Implementations must be pure with respect to their inputs: the same
/// grants and requirement always produce the same decision. Side effects
/// such as audit logging are allowed.
///
/// # Example Implementation
///
/// ```
/// use campus_auth::{evaluate, AccessDenied, Grants, PermissionPolicy, Requirement, Role};
///
/// /// Denies everything below moderator, then applies the normal rules.
/// struct StaffOnly;
///
/// impl PermissionPolicy for StaffOnly {
///     fn authorize(&self, grants: &Grants, req: &Requirement) -> Result<(), AccessDenied> {
///         evaluate(grants, &Requirement::none().with_role(Role::Moderator))?;
///         evaluate(grants, req)
///     }
/// }
///
/// let user = Grants::new().with_role(Role::User);
/// assert!(StaffOnly.authorize(&user, &Requirement::none()).is_err());
/// assert!(!StaffOnly.can_view(&user, &Requirement::none()));
/// ```
pub trait PermissionPolicy: Send + Sync {
    /// Authorizes an invocation.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] describing the failed check. A denial is
    /// terminal; callers must not retry with the same grants.
    fn authorize(&self, grants: &Grants, requirement: &Requirement) -> Result<(), AccessDenied>;

    /// Returns `true` if an operation should be listed to the caller.
    ///
    /// The default delegates to the pure [`evaluate`](crate::evaluate) so
    /// that visibility filtering does not emit audit records.
    fn can_view(&self, grants: &Grants, requirement: &Requirement) -> bool {
        crate::evaluate(grants, requirement).is_ok()
    }
}
