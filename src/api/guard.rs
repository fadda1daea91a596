//! Authorization gate: identity and permission checks run as extractors,
//! so a rejected request never reaches the handler body.

use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Permission, UserClaims},
    AppState,
};

/// Identity from the bearer token, if any. Bad or expired tokens count as anonymous.
pub struct MaybeUser(pub Option<UserClaims>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Ok(TypedHeader(Authorization(bearer))) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
        else {
            return Ok(MaybeUser(None));
        };

        match UserClaims::from_token(bearer.token(), &state.config.auth.jwt_secret) {
            Ok(claims) => Ok(MaybeUser(Some(claims))),
            Err(e) => {
                tracing::debug!("Ignoring invalid bearer token: {}", e);
                Ok(MaybeUser(None))
            }
        }
    }
}

/// Requires an identity; anonymous callers are redirected to the login URL
pub struct LoginRequired(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for LoginRequired {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = match MaybeUser::from_request_parts(parts, state).await {
            Ok(user) => user,
            Err(never) => match never {},
        };
        require_login(user, &request_path(parts), &state.config.auth).map(LoginRequired)
    }
}

/// Compile-time name of a permission, for use with [`PermissionRequired`]
pub trait RequiredPermission: Send + Sync + 'static {
    const PERMISSION: Permission;
}

pub struct CanMarkReturned;

impl RequiredPermission for CanMarkReturned {
    const PERMISSION: Permission = Permission::CanMarkReturned;
}

pub struct CanEdit;

impl RequiredPermission for CanEdit {
    const PERMISSION: Permission = Permission::CanEdit;
}

/// Requires an identity holding `P::PERMISSION`
pub struct PermissionRequired<P: RequiredPermission>(pub UserClaims, PhantomData<P>);

#[async_trait]
impl<P: RequiredPermission> FromRequestParts<AppState> for PermissionRequired<P> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let LoginRequired(user) = LoginRequired::from_request_parts(parts, state).await?;
        require_permission(&user, P::PERMISSION, &request_path(parts), &state.config.auth)?;
        Ok(PermissionRequired(user, PhantomData))
    }
}

/// Gate for author create/update/delete, see [`author_mutation`]
pub struct AuthorMutationAllowed;

#[async_trait]
impl FromRequestParts<AppState> for AuthorMutationAllowed {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = match MaybeUser::from_request_parts(parts, state).await {
            Ok(user) => user,
            Err(never) => match never {},
        };
        author_mutation(user, &request_path(parts), &state.config.auth)?;
        Ok(AuthorMutationAllowed)
    }
}

/// Full request path and query, including the prefix stripped by nested routers
pub fn request_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or(&parts.uri);
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Login URL with `next` percent-encoded; slashes stay readable
fn login_redirect(next: &str, auth: &AuthConfig) -> AppError {
    let next = urlencoding::encode(next).replace("%2F", "/");
    AppError::LoginRequired(format!("{}?next={}", auth.login_url, next))
}

/// Identity check
pub fn require_login(user: Option<UserClaims>, next: &str, auth: &AuthConfig) -> AppResult<UserClaims> {
    user.ok_or_else(|| login_redirect(next, auth))
}

/// Permission check for an identified caller
pub fn require_permission(
    user: &UserClaims,
    permission: Permission,
    next: &str,
    auth: &AuthConfig,
) -> AppResult<()> {
    if user.has_perm(permission) {
        return Ok(());
    }

    tracing::debug!("User {} lacks permission {}", user.sub, permission);
    if auth.redirect_on_forbidden {
        Err(login_redirect(next, auth))
    } else {
        Err(AppError::Authorization(format!(
            "Permission {} required",
            permission
        )))
    }
}

/// Author create/update/delete are open unless `auth.guard_author_mutations` is set
pub fn author_mutation(user: Option<UserClaims>, next: &str, auth: &AuthConfig) -> AppResult<()> {
    if !auth.guard_author_mutations {
        return Ok(());
    }
    let user = require_login(user, next, auth)?;
    require_permission(&user, Permission::CanEdit, next, auth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(permissions: &[Permission]) -> UserClaims {
        UserClaims {
            sub: "member".into(),
            user_id: 1,
            is_superuser: false,
            permissions: permissions.iter().map(|p| p.codename().to_string()).collect(),
            exp: i64::MAX,
            iat: 0,
        }
    }

    #[test]
    fn anonymous_is_sent_to_login() {
        let auth = AuthConfig::default();
        match require_login(None, "/api/v1/mybooks", &auth) {
            Err(AppError::LoginRequired(location)) => {
                assert_eq!(location, "/accounts/login/?next=/api/v1/mybooks")
            }
            other => panic!("unexpected {:?}", other.map(|u| u.sub)),
        }
    }

    #[test]
    fn login_redirect_keeps_the_query_encoded() {
        let auth = AuthConfig::default();
        match require_login(None, "/api/v1/mybooks?page=2&x=a b", &auth) {
            Err(AppError::LoginRequired(location)) => assert_eq!(
                location,
                "/accounts/login/?next=/api/v1/mybooks%3Fpage%3D2%26x%3Da%20b"
            ),
            other => panic!("unexpected {:?}", other.map(|u| u.sub)),
        }
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let auth = AuthConfig::default();
        let member = user(&[Permission::CanMarkReturned]);
        assert!(require_permission(&member, Permission::CanMarkReturned, "/", &auth).is_ok());
        assert!(matches!(
            require_permission(&member, Permission::CanEdit, "/", &auth),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn missing_permission_can_redirect_instead() {
        let auth = AuthConfig {
            redirect_on_forbidden: true,
            ..AuthConfig::default()
        };
        assert!(matches!(
            require_permission(&user(&[]), Permission::CanEdit, "/x", &auth),
            Err(AppError::LoginRequired(_))
        ));
    }

    #[test]
    fn author_mutations_follow_configuration() {
        let open = AuthConfig::default();
        assert!(author_mutation(None, "/", &open).is_ok());

        let guarded = AuthConfig {
            guard_author_mutations: true,
            ..AuthConfig::default()
        };
        assert!(matches!(
            author_mutation(None, "/", &guarded),
            Err(AppError::LoginRequired(_))
        ));
        assert!(matches!(
            author_mutation(Some(user(&[])), "/", &guarded),
            Err(AppError::Authorization(_))
        ));
        assert!(author_mutation(Some(user(&[Permission::CanEdit])), "/", &guarded).is_ok());
    }
}
