//! Authorization for administrative actions
//!
//! Saving settings and purging on demand require the `ManageOptions`
//! capability and a valid anti-forgery token for the specific action. A
//! failed check aborts the command before any state is written.

use chrono::{DateTime, Utc};

use crate::config::SettingsStore;
use crate::error::{AuthError, Result};

pub mod token;

pub use token::{TOKEN_FILE, TokenLedger};

/// Privileges a principal may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Change cache settings and purge on demand
    ManageOptions,
}

/// Whoever is invoking an administrative action
pub trait Principal {
    fn has_capability(&self, capability: Capability) -> bool;
}

/// The local operator running the CLI.
///
/// Holds `ManageOptions` unless the settings file exists and is read-only.
#[derive(Debug, Clone, Copy)]
pub struct LocalOperator {
    can_manage: bool,
}

impl LocalOperator {
    pub fn detect(store: &SettingsStore) -> Self {
        let read_only = std::fs::metadata(store.path())
            .map(|m| m.permissions().readonly())
            .unwrap_or(false);

        Self {
            can_manage: !read_only,
        }
    }
}

impl Principal for LocalOperator {
    fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageOptions => self.can_manage,
        }
    }
}

/// State-changing actions protected by anti-forgery tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AdminAction {
    /// Purge the entire cache for the current host
    PurgeEntireCache,
    /// Save cache settings
    SaveSettings,
}

impl AdminAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AdminAction::PurgeEntireCache => "purge-entire-cache",
            AdminAction::SaveSettings => "save-settings",
        }
    }
}

/// Checks privilege and anti-forgery tokens
pub struct AdminGuard {
    ledger: TokenLedger,
}

impl AdminGuard {
    pub fn new(ledger: TokenLedger) -> Self {
        Self { ledger }
    }

    /// Guard whose ledger lives beside the settings file
    pub fn for_store(store: &SettingsStore) -> Self {
        Self::new(TokenLedger::new(store.sibling(TOKEN_FILE)))
    }

    fn require(principal: &dyn Principal) -> Result<()> {
        if principal.has_capability(Capability::ManageOptions) {
            Ok(())
        } else {
            log::warn!("Administrative action denied: insufficient privilege");
            Err(AuthError::InsufficientPrivilege.into())
        }
    }

    /// Issue a token for `action`; requires privilege
    pub fn issue(
        &self,
        principal: &dyn Principal,
        action: AdminAction,
        now: DateTime<Utc>,
    ) -> Result<String> {
        Self::require(principal)?;
        Ok(self.ledger.issue(action, now)?)
    }

    /// Authorize `action`: privilege first, then the token
    pub fn authorize(
        &self,
        principal: &dyn Principal,
        action: AdminAction,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        Self::require(principal)?;

        let token = token.ok_or(AuthError::InvalidToken)?;
        self.ledger.verify(action, token, now)?;

        log::debug!("Authorized {}", action.as_str());
        Ok(())
    }
}
