//! Anti-forgery tokens for administrative actions
//!
//! A token is `nonce.tag`: a fresh random nonce plus a tag derived from a
//! per-installation secret, the action name, the current 12-hour window, and
//! that nonce. It is accepted during its own window and the next one, and
//! only once.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::AdminAction;
use crate::config::write_atomic;
use crate::error::AuthError;

/// File name of the token ledger, stored beside the settings file
pub const TOKEN_FILE: &str = "auth.json";

const WINDOW_SECONDS: i64 = 12 * 60 * 60;
const TAG_LEN: usize = 10;
const NONCE_LEN: usize = 8;

type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerState {
    #[serde(default)]
    secret: String,

    #[serde(default)]
    consumed: Vec<ConsumedToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConsumedToken {
    token: String,
    action: String,
    window: i64,
}

fn window(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(WINDOW_SECONDS)
}

fn compute_tag(secret: &str, action: AdminAction, window: i64, nonce: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b"|");
    hasher.update(action.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(window.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(nonce.as_bytes());

    let hex = format!("{:x}", hasher.finalize());
    hex[..TAG_LEN].to_string()
}

fn new_nonce() -> String {
    let mut nonce = uuid::Uuid::new_v4().simple().to_string();
    nonce.truncate(NONCE_LEN);
    nonce
}

/// Issues and verifies tokens, persisting the secret and consumed tokens
#[derive(Debug, Clone)]
pub struct TokenLedger {
    path: PathBuf,
}

impl TokenLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_state(&self) -> Result<LedgerState> {
        let mut state = match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Token ledger corrupt ({}), issuing a new secret", e);
                LedgerState::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerState::default(),
            Err(e) => return Err(AuthError::Store(e.to_string())),
        };

        if state.secret.is_empty() {
            state.secret = uuid::Uuid::new_v4().simple().to_string();
            state.consumed.clear();
            self.save_state(&state)?;
        }

        Ok(state)
    }

    fn save_state(&self, state: &LedgerState) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(state).map_err(|e| AuthError::Store(e.to_string()))?;
        write_atomic(&self.path, contents.as_bytes(), 0o600)
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    /// Issue a fresh token for `action` valid from `now`
    pub fn issue(&self, action: AdminAction, now: DateTime<Utc>) -> Result<String> {
        let state = self.load_state()?;
        let nonce = new_nonce();
        let tag = compute_tag(&state.secret, action, window(now), &nonce);
        Ok(format!("{}.{}", nonce, tag))
    }

    /// Verify and consume a token
    pub fn verify(&self, action: AdminAction, token: &str, now: DateTime<Utc>) -> Result<()> {
        let mut state = self.load_state()?;
        let current = window(now);
        let token = token.trim();

        let Some((nonce, tag)) = token.split_once('.') else {
            log::debug!("Rejected malformed token for {}", action.as_str());
            return Err(AuthError::InvalidToken);
        };

        let matched = [current, current - 1]
            .into_iter()
            .find(|w| compute_tag(&state.secret, action, *w, nonce) == tag);

        let Some(matched) = matched else {
            log::debug!("Rejected token for {}", action.as_str());
            return Err(AuthError::InvalidToken);
        };

        let reused = state
            .consumed
            .iter()
            .any(|c| c.token == token && c.action == action.as_str() && c.window == matched);
        if reused {
            log::debug!("Rejected reused token for {}", action.as_str());
            return Err(AuthError::InvalidToken);
        }

        state.consumed.retain(|c| c.window >= current - 1);
        state.consumed.push(ConsumedToken {
            token: token.to_string(),
            action: action.as_str().to_string(),
            window: matched,
        });
        self.save_state(&state)?;

        Ok(())
    }
}
