//! # Identity
//!
//! Who is signed in, and how that changes.
//!
//! ```text
//!            UserRestored / LoginSucceeded
//! Loading ─────────────────────────────────► Authenticated
//!    │  (nothing stored)                          │ LoggedOut
//!    ▼                                            ▼
//! Unauthenticated ──LoginStarted──► Loading ──LoginFailed──► Failed(msg)
//!        ▲                                                      │
//!        └──────────────────── ErrorCleared ────────────────────┘
//! ```
//!
//! The signed-in user is remembered in `<storage_dir>/user.json` so the next
//! launch can skip the login screen. Writes use atomic rename (`.tmp`, then
//! `rename()`).

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Storage key (and file stem) for the remembered user.
pub const STORE_KEY: &str = "user";

pub const MIN_USER_ID_LEN: usize = 4;
pub const MAX_USER_ID_LEN: usize = 20;

static USER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^TEST\d{3,}").expect("user id pattern"));

/// A signed-in farmer, as returned by the login endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub created_at: String,
}

impl UserRecord {
    /// Name for greetings; falls back to the user id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.user_id
        } else {
            &self.name
        }
    }
}

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum IdentityState {
    /// Checking storage, or a login request is in flight.
    Loading,
    Authenticated(UserRecord),
    Unauthenticated,
    /// Last login attempt failed. Nobody is signed in.
    Failed(String),
}

impl IdentityState {
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            IdentityState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, IdentityState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            IdentityState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdentityAction {
    LoginStarted,
    LoginSucceeded(UserRecord),
    LoginFailed(String),
    LoggedOut,
    ErrorCleared,
    UserRestored(UserRecord),
}

/// Pure transition function. Every action is valid from every state.
pub fn transition(state: &IdentityState, action: IdentityAction) -> IdentityState {
    let next = match action {
        IdentityAction::LoginStarted => IdentityState::Loading,
        IdentityAction::LoginSucceeded(user) | IdentityAction::UserRestored(user) => {
            IdentityState::Authenticated(user)
        }
        IdentityAction::LoginFailed(msg) => IdentityState::Failed(msg),
        IdentityAction::LoggedOut => IdentityState::Unauthenticated,
        IdentityAction::ErrorCleared => match state {
            IdentityState::Failed(_) => IdentityState::Unauthenticated,
            other => other.clone(),
        },
    };
    debug!("Identity: {:?} -> {:?}", state, next);
    next
}

// ============================================================================
// Validation
// ============================================================================

/// Every rule a user id broke, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.issues.join("\n"))
    }
}

impl std::error::Error for ValidationError {}

/// Normalize (trim + uppercase) and validate a user id.
pub fn validate_user_id(raw: &str) -> Result<String, ValidationError> {
    let id = raw.trim().to_uppercase();
    let len = id.chars().count();
    let mut issues = Vec::new();

    if len < MIN_USER_ID_LEN {
        issues.push(format!("User ID must be at least {MIN_USER_ID_LEN} characters"));
    }
    if len > MAX_USER_ID_LEN {
        issues.push(format!("Max {MAX_USER_ID_LEN} chars"));
    }
    if !USER_ID_PATTERN.is_match(&id) {
        issues.push("ID must start with TEST and digits".to_string());
    }

    if issues.is_empty() {
        Ok(id)
    } else {
        Err(ValidationError { issues })
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "user store I/O error: {e}"),
            StoreError::Parse(e) => write!(f, "user store parse error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Remembers the signed-in user between launches.
pub struct IdentityStore {
    dir: PathBuf,
}

impl IdentityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{STORE_KEY}.json"))
    }

    /// The remembered user, if any. A corrupt record counts as none.
    pub fn load(&self) -> Result<Option<UserRecord>, StoreError> {
        let path = self.path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };
        match serde_json::from_str(&contents) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("Ignoring unreadable user record {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, user: &UserRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(StoreError::Io)?;
        atomic_write_json(&self.path(), user)?;
        info!("Remembered user {}", user.user_id);
        Ok(())
    }

    /// Forget the user. Missing file is not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Startup check: the action that ends the initial `Loading` state.
    pub fn restore(&self) -> IdentityAction {
        match self.load() {
            Ok(Some(user)) => IdentityAction::UserRestored(user),
            Ok(None) => IdentityAction::LoggedOut,
            Err(e) => {
                warn!("Could not read stored user: {}", e);
                IdentityAction::LoggedOut
            }
        }
    }

    /// Forget the user and sign out. Storage failures are logged only.
    pub fn logout(&self) -> IdentityAction {
        if let Err(e) = self.clear() {
            warn!("Could not clear stored user: {}", e);
        }
        IdentityAction::LoggedOut
    }
}

fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data).map_err(StoreError::Parse)?;
    fs::write(&tmp_path, json).map_err(StoreError::Io)?;
    fs::rename(&tmp_path, path).map_err(StoreError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_user;

    #[test]
    fn initial_restore_paths() {
        let user = test_user();
        assert_eq!(
            transition(&IdentityState::Loading, IdentityAction::UserRestored(user.clone())),
            IdentityState::Authenticated(user)
        );
        assert_eq!(
            transition(&IdentityState::Loading, IdentityAction::LoggedOut),
            IdentityState::Unauthenticated
        );
    }

    #[test]
    fn failed_login_then_clear_error() {
        let started = transition(&IdentityState::Unauthenticated, IdentityAction::LoginStarted);
        assert!(started.is_loading());

        let failed = transition(&started, IdentityAction::LoginFailed("Login failed".into()));
        assert_eq!(failed.error(), Some("Login failed"));
        assert!(failed.user().is_none());

        let cleared = transition(&failed, IdentityAction::ErrorCleared);
        assert_eq!(cleared, IdentityState::Unauthenticated);
    }

    #[test]
    fn clear_error_keeps_authenticated_user() {
        let state = IdentityState::Authenticated(test_user());
        assert_eq!(transition(&state, IdentityAction::ErrorCleared), state);
    }

    #[test]
    fn logout_from_authenticated() {
        let state = IdentityState::Authenticated(test_user());
        assert_eq!(
            transition(&state, IdentityAction::LoggedOut),
            IdentityState::Unauthenticated
        );
    }

    #[test]
    fn valid_ids_are_normalized() {
        assert_eq!(validate_user_id("  test001 ").unwrap(), "TEST001");
        assert_eq!(validate_user_id("TEST12345").unwrap(), "TEST12345");
    }

    #[test]
    fn short_id_reports_every_issue() {
        let err = validate_user_id("ab").unwrap_err();
        assert_eq!(
            err.issues,
            vec![
                "User ID must be at least 4 characters".to_string(),
                "ID must start with TEST and digits".to_string(),
            ]
        );
        assert_eq!(
            err.to_string(),
            "User ID must be at least 4 characters\nID must start with TEST and digits"
        );
    }

    #[test]
    fn long_id_reports_max() {
        let err = validate_user_id("TEST12345678901234567890").unwrap_err();
        assert_eq!(err.issues, vec!["Max 20 chars".to_string()]);
    }

    #[test]
    fn prefix_needs_three_digits() {
        assert!(validate_user_id("TEST01").is_err());
        assert!(validate_user_id("FARM001").is_err());
    }

    #[test]
    fn store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::new(dir.path().join("storage"));
        assert_eq!(store.load().unwrap(), None);

        store.save(&test_user()).unwrap();
        assert_eq!(store.load().unwrap(), Some(test_user()));
        assert!(!store.path().with_extension("tmp").exists());

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_record_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.restore(), IdentityAction::LoggedOut);
    }

    #[test]
    fn restore_finds_saved_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::new(dir.path());
        store.save(&test_user()).unwrap();
        assert_eq!(store.restore(), IdentityAction::UserRestored(test_user()));
        assert_eq!(store.logout(), IdentityAction::LoggedOut);
        assert!(!store.path().exists());
    }

    #[test]
    fn record_accepts_missing_optional_fields() {
        let user: UserRecord =
            serde_json::from_str(r#"{"id":1,"user_id":"TEST001","name":""}"#).unwrap();
        assert_eq!(user.display_name(), "TEST001");
        assert!(user.role.is_empty());
    }
}
