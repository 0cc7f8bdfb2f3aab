use crate::error::{classify, Error};
use crate::security::storage::LocalStorage;
use crate::security::token_expired;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;

/// Local storage key holding the signed-in session
pub const SESSION_KEY: &str = "remindar.auth";

/// The signed-in caregiver as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(alias = "userId", alias = "sub")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token plus cached user, persisted under [`SESSION_KEY`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

/// Backend identity check used to validate a restored session
#[async_trait]
pub trait WhoAmI: Send + Sync {
    async fn whoami(&self, token: &str) -> Result<SessionUser>;
}

/// Explicit session holder injected into whatever needs the token
pub struct SessionStore {
    storage: LocalStorage,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
        }
    }

    pub fn open(path: &Path) -> Self {
        Self::new(LocalStorage::new(path))
    }

    /// Store a fresh session, in memory and on disk
    pub async fn login(&self, token: impl Into<String>, user: SessionUser) -> Result<()> {
        let session = Session {
            token: token.into(),
            user,
        };
        let value = serde_json::to_value(&session)
            .map_err(|e| Error::Serialization(format!("Failed to encode session: {}", e)))?;
        self.storage.set(SESSION_KEY, value).await?;

        info!("Signed in as {}", session.user.id);
        *self.current.write().await = Some(session);
        Ok(())
    }

    /// Forget the session, in memory and on disk
    pub async fn logout(&self) -> Result<()> {
        *self.current.write().await = None;
        self.storage.remove(SESSION_KEY).await?;
        info!("Signed out");
        Ok(())
    }

    /// Load the persisted session. Unreadable entries and JWTs that have
    /// already expired are cleared and yield `None`.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let value = match self.storage.get(SESSION_KEY).await? {
            Some(value) => value,
            None => return Ok(None),
        };

        let session: Session = match serde_json::from_value(value) {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding unreadable stored session: {}", e);
                self.logout().await?;
                return Ok(None);
            }
        };

        if token_expired(&session.token, Utc::now()) {
            warn!("Stored session for {} has expired", session.user.id);
            self.logout().await?;
            return Ok(None);
        }

        info!("Restored session for {}", session.user.id);
        *self.current.write().await = Some(session.clone());
        Ok(Some(session))
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|session| session.token.clone())
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Ask the backend who the token belongs to. A rejected token clears the
    /// session and returns [`Error::Authentication`]; the caller sends the user
    /// back to sign-in. Other failures leave the session alone.
    pub async fn verify<W>(&self, who: &W) -> Result<SessionUser>
    where
        W: WhoAmI + ?Sized,
    {
        let token = self
            .token()
            .await
            .ok_or_else(|| Error::Authentication("Not signed in".to_string()))?;

        match who.whoami(&token).await {
            Ok(user) => {
                self.login(token, user.clone()).await?;
                Ok(user)
            }
            Err(e) => {
                if classify(&e).map_or(false, Error::is_auth_failure) {
                    warn!("Session rejected by backend; signing out: {}", e);
                    self.logout().await?;
                }
                Err(e)
            }
        }
    }
}
