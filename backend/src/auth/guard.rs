//! Role and ownership decisions.
//!
//! Pure functions over their inputs so they can be unit-tested without any
//! request machinery. Handlers call these explicitly before touching work
//! logs, users or payroll.

use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::models::{Role, User};

/// Require the caller to hold exactly `role`.
pub fn require_role(caller: &AuthUser, role: Role) -> Result<()> {
    if caller.role == role {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "{} role required",
            role.as_str()
        )))
    }
}

/// Allow the resource owner or any admin.
pub fn require_owner_or_admin(caller: &AuthUser, resource_owner_id: i64) -> Result<()> {
    if caller.id == resource_owner_id || caller.role == Role::Admin {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "You can only access your own records".to_string(),
        ))
    }
}

/// Reject deleting or disabling `target` when it is the only enabled admin.
///
/// The scan over `all_users` keeps the check a pure function of its inputs;
/// the observable guarantee is simply that no operation may leave zero
/// enabled administrators.
pub fn guard_last_admin(target: &User, all_users: &[User]) -> Result<()> {
    if !(target.is_admin() && target.enabled) {
        return Ok(());
    }

    let enabled_admins = all_users
        .iter()
        .filter(|u| u.is_admin() && u.enabled)
        .count();
    if enabled_admins <= 1 {
        return Err(Error::Forbidden(
            "cannot remove the last active administrator".to_string(),
        ));
    }
    Ok(())
}
