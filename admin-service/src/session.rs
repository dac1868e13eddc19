//! Back-office login and bearer-token sessions.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use shared::http::ApiError;
use shared::password::verify_password;
use shared::{AdminUser, Store};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Credenciales inválidas";
const INVALID_SESSION: &str = "Sesión no válida o expirada";

/// Logged-in admins keyed by bearer token. Sessions end on logout or restart.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<RwLock<HashMap<Uuid, AdminUser>>>,
}

impl Sessions {
    pub async fn open(&self, user: AdminUser) -> Uuid {
        let token = Uuid::new_v4();
        self.inner.write().await.insert(token, user);
        token
    }

    pub async fn get(&self, token: Uuid) -> Option<AdminUser> {
        self.inner.read().await.get(&token).cloned()
    }

    pub async fn close(&self, token: Uuid) -> Option<AdminUser> {
        self.inner.write().await.remove(&token)
    }
}

/// Checks the password against the stored digest and opens a session.
pub async fn login(
    store: &dyn Store,
    sessions: &Sessions,
    username: &str,
    password: &str,
) -> Result<(Uuid, AdminUser), ApiError> {
    let credentials = store
        .find_admin(username.trim())
        .await?
        .filter(|c| verify_password(password, &c.password_hash))
        .ok_or_else(|| {
            warn!("Failed login for {}", username);
            ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
        })?;

    let user = credentials.user;
    let token = sessions.open(user.clone()).await;
    info!("{} logged in as {}", user.username, user.role.as_str());
    Ok((token, user))
}

/// The admin behind the request's `Authorization: Bearer <token>` header.
pub struct AuthAdmin {
    pub token: Uuid,
    pub user: AdminUser,
}

fn bearer_token(parts: &Parts) -> Option<Uuid> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthAdmin
where
    Sessions: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = || ApiError::Unauthorized(INVALID_SESSION.to_string());
        let token = bearer_token(parts).ok_or_else(unauthorized)?;
        let user = Sessions::from_ref(state)
            .get(token)
            .await
            .ok_or_else(unauthorized)?;
        Ok(AuthAdmin { token, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::memory::InMemoryStore;
    use shared::Role;

    #[tokio::test]
    async fn login_opens_a_session_for_valid_credentials() {
        let store = InMemoryStore::with_demo_data();
        let sessions = Sessions::default();

        let (token, user) = login(&store, &sessions, "logistica", "logistica123")
            .await
            .unwrap();
        assert_eq!(user.role, Role::Logistic);
        assert_eq!(sessions.get(token).await.unwrap().username, "logistica");

        assert!(sessions.close(token).await.is_some());
        assert!(sessions.get(token).await.is_none());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let store = InMemoryStore::with_demo_data();
        let sessions = Sessions::default();

        for (username, password) in [("admin", "admin"), ("nadie", "admin123")] {
            let err = login(&store, &sessions, username, password).await.unwrap_err();
            assert!(matches!(err, ApiError::Unauthorized(_)));
            assert_eq!(err.to_string(), "Credenciales inválidas");
        }
    }

    #[test]
    fn bearer_token_requires_the_scheme() {
        let token = Uuid::new_v4();
        let request = axum::http::Request::builder()
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(bearer_token(&parts), Some(token));

        let request = axum::http::Request::builder()
            .header(AUTHORIZATION, token.to_string())
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(bearer_token(&parts), None);
    }
}
