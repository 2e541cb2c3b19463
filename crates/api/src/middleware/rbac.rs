//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement. Per-resource allow-lists are checked by the
//! resource service, not here.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use lapublica_core::roles::ensure_privileged;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires `ADMIN` or `CRM_MANAGER`. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn manage(RequireResourceManager(user): RequireResourceManager) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireResourceManager(pub AuthUser);

impl FromRequestParts<AppState> for RequireResourceManager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        ensure_privileged(&user.role)?;
        Ok(RequireResourceManager(user))
    }
}

/// Requires any authenticated user (any valid role).
///
/// Functionally equivalent to [`AuthUser`] but named explicitly so route
/// handlers read as "this route requires authentication".
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
