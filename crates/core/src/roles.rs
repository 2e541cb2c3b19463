//! Well-known role name constants and the resource allow-list check.
//!
//! Role names must match the `role` claim issued by the platform's identity
//! service. Comparison is exact and case-sensitive.

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_CRM_MANAGER: &str = "CRM_MANAGER";
pub const ROLE_COMPANY_MANAGER: &str = "GESTOR_EMPRESA";
pub const ROLE_PUBLIC_EMPLOYEE: &str = "EMPLEAT_PUBLIC";
pub const ROLE_COMPANY: &str = "EMPRESA";
pub const ROLE_USER: &str = "USER";

/// Roles that bypass resource allow-lists and may manage resources.
pub const PRIVILEGED_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_CRM_MANAGER];

/// Whether `role` bypasses per-resource access checks.
pub fn is_privileged(role: &str) -> bool {
    PRIVILEGED_ROLES.contains(&role)
}

/// Flat allow-list check: privileged roles always pass, everyone else must
/// appear in `access_roles`.
pub fn can_access(role: &str, access_roles: &[String]) -> bool {
    is_privileged(role) || access_roles.iter().any(|r| r == role)
}

/// Like [`can_access`], but returns a `Forbidden` error on denial.
pub fn ensure_access(role: &str, access_roles: &[String]) -> Result<(), CoreError> {
    if can_access(role, access_roles) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role '{role}' does not have access to this resource"
        )))
    }
}

/// Require a privileged role for write operations.
pub fn ensure_privileged(role: &str) -> Result<(), CoreError> {
    if is_privileged(role) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Admin or CRM manager role required".into(),
        ))
    }
}
