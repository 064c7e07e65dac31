use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use std::sync::Arc;
use thiserror::Error;

use crate::{
    util::random_string, Database, DatabaseError, NewSession, NewUser, SessionData, UpdatedUser,
    UserData, UserRole,
};

pub struct Auth<Db> {
    db: Arc<Db>,
    argon: Argon2<'static>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    const SESSION_DURATION_IN_DAYS: usize = 7;

    pub fn new(db: &Arc<Db>) -> Self {
        Self {
            db: db.clone(),
            argon: Argon2::default(),
        }
    }

    /// Logs in a user, returning a new session
    pub async fn login(&self, credentials: Credentials) -> Result<SessionData, AuthError> {
        self.clear_expired().await;

        let user = self
            .db
            .user_by_email(&credentials.email)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        let stored_password = PasswordHash::parse(&user.password, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(credentials.password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let expires_at = Utc::now() + Duration::days(Self::SESSION_DURATION_IN_DAYS as i64);

        let new_session = NewSession {
            token: random_string(32),
            user_id: user.id,
            expires_at,
        };

        let new_session = self
            .db
            .create_session(new_session)
            .await
            .map_err(AuthError::Db)?;

        Ok(new_session)
    }

    /// Deletes the associated session, if it exists
    pub async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        self.db.delete_session_by_token(token).await
    }

    /// Creates an account with a hashed password
    pub async fn register(&self, new_user: NewPlainUser) -> Result<UserData, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(new_user.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        self.db
            .create_user(NewUser {
                email: new_user.email,
                name: new_user.name,
                password: hashed_password,
                role: new_user.role,
            })
            .await
            .map_err(AuthError::Db)
    }

    /// Updates a user's profile. A new password is hashed before storage.
    pub async fn update_user(&self, mut updated_user: UpdatedUser) -> Result<UserData, AuthError> {
        if let Some(password) = updated_user.password.take() {
            let salt = SaltString::generate(&mut OsRng);
            let hashed = self
                .argon
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| AuthError::HashError(e.to_string()))?
                .to_string();

            updated_user.password = Some(hashed);
        }

        self.db.update_user(updated_user).await.map_err(AuthError::Db)
    }

    /// Returns a session if it exists
    pub async fn session(&self, token: &str) -> Result<SessionData, DatabaseError> {
        self.db.session_by_token(token).await
    }

    async fn clear_expired(&self) {
        if let Err(e) = self.db.clear_expired_sessions().await {
            log::warn!("Failed to clear expired sessions: {e}");
        }
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct NewPlainUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MemoryDatabase;

    fn auth() -> (Arc<MemoryDatabase>, Auth<MemoryDatabase>) {
        let db = Arc::new(MemoryDatabase::default());
        let auth = Auth::new(&db);

        (db, auth)
    }

    #[tokio::test]
    async fn register_then_login_round_trips() {
        let (_db, auth) = auth();

        let user = auth
            .register(NewPlainUser {
                email: "guest@example.com".to_string(),
                name: "guest".to_string(),
                password: "hunter2hunter2".to_string(),
                role: UserRole::Guest,
            })
            .await
            .expect("user is registered");

        assert_ne!(user.password, "hunter2hunter2");

        let session = auth
            .login(Credentials {
                email: "guest@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .expect("login succeeds");

        assert_eq!(session.user.id, user.id);

        let looked_up = auth.session(&session.token).await.expect("session exists");
        assert_eq!(looked_up.user.id, user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (_db, auth) = auth();

        auth.register(NewPlainUser {
            email: "guest@example.com".to_string(),
            name: "guest".to_string(),
            password: "correct-password".to_string(),
            role: UserRole::Guest,
        })
        .await
        .expect("user is registered");

        let result = auth
            .login(Credentials {
                email: "guest@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn logout_invalidates_the_session() {
        let (_db, auth) = auth();

        auth.register(NewPlainUser {
            email: "guest@example.com".to_string(),
            name: "guest".to_string(),
            password: "hunter2hunter2".to_string(),
            role: UserRole::Guest,
        })
        .await
        .expect("user is registered");

        let session = auth
            .login(Credentials {
                email: "guest@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .expect("login succeeds");

        auth.logout(&session.token).await.expect("logout succeeds");
        assert!(auth.session(&session.token).await.is_err());
    }
}
