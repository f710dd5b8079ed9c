//! Session-token authentication.
//!
//! Users authenticate with opaque bearer tokens. The raw token is returned
//! exactly once at issue time; only its SHA-256 digest is stored, so a
//! database leak does not leak usable credentials. Expiry is checked lazily
//! on every authentication; `delete_expired_sessions` exists for periodic
//! cleanup but nothing depends on it running.

use chrono::{Duration, Utc};

use crate::api::{NewSession, NewUser, User, UserId, UserRole};
use crate::db::codes::{generate_session_token, token_digest};
use crate::db::repository::{FullRepository, RepositoryError};

/// Errors from authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token is unknown or malformed.
    #[error("Invalid authentication token")]
    InvalidToken,

    /// The token exists but its session has expired.
    #[error("Token has expired")]
    ExpiredToken,

    /// The caller is authenticated but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// Underlying storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// The identity attached to a verified session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
}

/// A newly registered user together with their first session token.
///
/// The token is raw here and nowhere else.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub user: User,
    pub token: String,
}

/// Loose structural check; real deliverability is out of scope.
pub(crate) fn email_is_well_formed(email: &str) -> bool {
    let trimmed = email.trim();
    trimmed.len() <= 254
        && !trimmed.contains(char::is_whitespace)
        && matches!(trimmed.split_once('@'), Some((local, domain)) if !local.is_empty() && domain.contains('.'))
}

fn validate_email(email: &str) -> AuthResult<()> {
    if email_is_well_formed(email) {
        Ok(())
    } else {
        Err(AuthError::Validation("Invalid email address".to_string()))
    }
}

/// Register a new user and issue their first session.
///
/// The email must be unique (case-insensitive). Returns the created user
/// plus a raw session token valid for `session_ttl`.
pub async fn register_user(
    repo: &dyn FullRepository,
    email: &str,
    display_name: &str,
    role: Option<UserRole>,
    session_ttl: Duration,
) -> AuthResult<RegisteredUser> {
    validate_email(email)?;
    let display_name = display_name.trim();
    if display_name.is_empty() || display_name.len() > 100 {
        return Err(AuthError::Validation(
            "Display name must be between 1 and 100 characters".to_string(),
        ));
    }

    let user = repo
        .insert_user(NewUser {
            email: email.trim().to_string(),
            display_name: display_name.to_string(),
            role,
        })
        .await
        .map_err(|e| {
            if matches!(e, RepositoryError::ValidationError { .. }) {
                AuthError::Validation("A user with this email already exists".to_string())
            } else {
                AuthError::Repository(e)
            }
        })?;

    let token = issue_session(repo, user.id, session_ttl).await?;
    Ok(RegisteredUser { user, token })
}

/// Issue a new session for an existing user and return the raw token.
pub async fn issue_session(
    repo: &dyn FullRepository,
    user_id: UserId,
    ttl: Duration,
) -> AuthResult<String> {
    let token = generate_session_token();
    repo.insert_session(NewSession {
        user_id,
        token_digest: token_digest(&token),
        expires_at: Utc::now() + ttl,
    })
    .await?;
    Ok(token)
}

/// Resolve a bearer token to the user behind it.
///
/// Fails with `InvalidToken` for unknown digests and `ExpiredToken` once
/// `expires_at` has passed. Expired sessions are left in place; they can
/// never authenticate again.
pub async fn authenticate(
    repo: &dyn FullRepository,
    token: &str,
) -> AuthResult<AuthenticatedUser> {
    let session = repo
        .find_session_by_digest(&token_digest(token))
        .await?
        .ok_or(AuthError::InvalidToken)?;

    if Utc::now() >= session.expires_at {
        return Err(AuthError::ExpiredToken);
    }

    let user = repo
        .fetch_user(session.user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    Ok(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
    })
}

/// Delete the session behind a token. Returns false if it did not exist.
pub async fn revoke_session(repo: &dyn FullRepository, token: &str) -> AuthResult<bool> {
    Ok(repo.delete_session(&token_digest(token)).await?)
}

/// Reject callers whose role is not `admin`.
pub fn require_admin(user: &AuthenticatedUser) -> AuthResult<()> {
    if user.role == UserRole::Admin {
        Ok(())
    } else {
        Err(AuthError::Forbidden(
            "Admin privileges required".to_string(),
        ))
    }
}

/// List every registered user. Admin only.
pub async fn list_users(
    repo: &dyn FullRepository,
    acting: &AuthenticatedUser,
) -> AuthResult<Vec<User>> {
    require_admin(acting)?;
    Ok(repo.list_users().await?)
}
