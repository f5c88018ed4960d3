use std::{
  fs,
  path::PathBuf,
  sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};

use crate::{ClientError, Result};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub email: String,
  pub full_name: Option<String>,
  pub bio: Option<String>,
  pub location: Option<String>,
  pub website: Option<String>,
  pub level: serde_json::Value,
  pub is_verified: bool,
  pub is_active: bool,
  pub is_superuser: bool,
  pub reputation_score: i64,
  pub contributions_count: i64,
  pub created_at: String,
  pub updated_at: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AuthResponse {
  pub access_token: String,
  pub refresh_token: String,
  pub token_type: String,
  pub user: User,
}

#[derive(Serialize, Debug, Clone)]
pub struct RegisterRequest {
  pub username: String,
  pub email: String,
  pub password: String,
  pub full_name: String,
}

/// Partial user update; absent fields are left untouched server-side. The
/// profile fields go through `/v1/users/me`, the moderation fields through
/// the admin-scoped by-id endpoint.
#[derive(Serialize, Debug, Clone, Default)]
pub struct UserUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub full_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bio: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub website: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub level: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_superuser: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct StoredCredentials {
  access_token: Option<String>,
  refresh_token: Option<String>,
}

/// Bearer credential holder, persisted to a credentials file between
/// invocations. Filesystem analog of the browser's localStorage: saved on
/// login, purged on logout and on any 401 anywhere.
#[derive(Clone)]
pub struct TokenStore {
  inner: Arc<Mutex<StoredCredentials>>,
  path: Option<PathBuf>,
}

impl TokenStore {
  /// In-memory only store seeded with a fixed token. Used when the token is
  /// supplied via flag or env.
  pub fn fixed(token: impl Into<String>) -> Self {
    Self {
      inner: Arc::new(Mutex::new(StoredCredentials {
        access_token: Some(token.into()),
        refresh_token: None,
      })),
      path: None,
    }
  }

  /// File-backed store. A missing or unreadable file simply means no
  /// credentials yet.
  pub fn open(path: PathBuf) -> Self {
    let stored = fs::read(&path)
      .ok()
      .and_then(|bytes| serde_json::from_slice(&bytes).ok())
      .unwrap_or_default();
    Self { inner: Arc::new(Mutex::new(stored)), path: Some(path) }
  }

  pub fn access_token(&self) -> Option<String> {
    self.inner.lock().expect("token store poisoned").access_token.clone()
  }

  pub fn save(&self, auth: &AuthResponse) -> Result<()> {
    let stored = StoredCredentials {
      access_token: Some(auth.access_token.clone()),
      refresh_token: Some(auth.refresh_token.clone()),
    };
    if let Some(path) = &self.path {
      if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::write(path, serde_json::to_vec(&stored).map_err(std::io::Error::other)?)?;
    }
    *self.inner.lock().expect("token store poisoned") = stored;
    Ok(())
  }

  /// Unconditional credential purge: memory and file. Invoked on logout and
  /// globally whenever the backend answers 401.
  pub fn purge(&self) {
    *self.inner.lock().expect("token store poisoned") = StoredCredentials::default();
    if let Some(path) = &self.path {
      let _ = fs::remove_file(path);
    }
  }

  pub fn require_token(&self) -> Result<String> {
    self.access_token().ok_or(ClientError::MissingCredentials)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("civicgit-test-{}-{}", std::process::id(), name))
  }

  fn auth_response(token: &str) -> AuthResponse {
    serde_json::from_value(serde_json::json!({
      "access_token": token,
      "refresh_token": "r1",
      "token_type": "bearer",
      "user": {
        "id": 1,
        "username": "ana",
        "email": "ana@example.org",
        "full_name": null,
        "bio": null,
        "location": null,
        "website": null,
        "level": "REGISTERED",
        "is_verified": true,
        "is_active": true,
        "is_superuser": false,
        "reputation_score": 0,
        "contributions_count": 0,
        "created_at": "2025-01-01T00:00:00",
        "updated_at": "2025-01-01T00:00:00"
      }
    }))
    .unwrap()
  }

  #[test]
  fn save_then_reopen_round_trips_the_token() {
    let path = temp_path("roundtrip");
    let store = TokenStore::open(path.clone());
    assert_eq!(store.access_token(), None);

    store.save(&auth_response("t-123")).unwrap();
    assert_eq!(store.access_token().as_deref(), Some("t-123"));

    let reopened = TokenStore::open(path.clone());
    assert_eq!(reopened.access_token().as_deref(), Some("t-123"));

    store.purge();
  }

  #[test]
  fn purge_clears_memory_and_file() {
    let path = temp_path("purge");
    let store = TokenStore::open(path.clone());
    store.save(&auth_response("t-456")).unwrap();

    store.purge();
    assert_eq!(store.access_token(), None);
    assert!(!path.exists());
    assert!(matches!(store.require_token(), Err(ClientError::MissingCredentials)));
  }

  #[test]
  fn fixed_store_never_touches_disk() {
    let store = TokenStore::fixed("env-token");
    assert_eq!(store.access_token().as_deref(), Some("env-token"));
    store.purge();
    assert_eq!(store.access_token(), None);
  }
}
