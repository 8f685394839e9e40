//! Access gating: login, embed keys and the free-search quota
use crate::error::{AccessError, AuthFailure};
use crate::session::SessionState;
use clap::ValueEnum;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identity recorded for sessions unlocked through an embed key.
pub const EMBED_IDENTITY: &str = "embed";

pub const DEFAULT_INITIAL_LIMIT: u32 = 3;
pub const DEFAULT_REWARD_LIMIT: u32 = 5;

/// Lookup of a user's secret by identity.
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, identity: &str) -> Option<String>;
}

/// Fixed identity → secret table, typically the `[users]` config section.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.users.len()
    }
}

impl CredentialStore for StaticCredentials {
    fn lookup(&self, identity: &str) -> Option<String> {
        self.users.get(identity).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticCredentials {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            users: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Anyone may search.
    Open,
    /// One shared password unlocks the session.
    Password,
    /// Per-user id and password.
    Credentials,
    /// A matching embed key unlocks the session.
    Embed,
    /// Guests get a limited number of searches; logged-in users are unlimited.
    #[default]
    Quota,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Open => write!(f, "open"),
            AccessMode::Password => write!(f, "password"),
            AccessMode::Credentials => write!(f, "credentials"),
            AccessMode::Embed => write!(f, "embed"),
            AccessMode::Quota => write!(f, "quota"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSettings {
    pub initial_limit: u32,
    pub reward_limit: u32,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            initial_limit: DEFAULT_INITIAL_LIMIT,
            reward_limit: DEFAULT_REWARD_LIMIT,
        }
    }
}

/// Where a session stands with respect to the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    LoggedOut,
    LoggedIn,
    GuestWithQuota,
    GuestExhausted,
}

/// Decides whether a session may search, and computes the session that
/// results from each event.
///
/// Operations never modify the session they are given. On success they
/// return the next session; on error the caller keeps the one it had.
pub struct AccessPolicy {
    mode: AccessMode,
    quota: QuotaSettings,
    credentials: Option<Box<dyn CredentialStore>>,
    shared_password: Option<String>,
    embed_key: Option<String>,
}

impl AccessPolicy {
    pub fn new(mode: AccessMode) -> Self {
        Self {
            mode,
            quota: QuotaSettings::default(),
            credentials: None,
            shared_password: None,
            embed_key: None,
        }
    }

    pub fn with_quota(mut self, quota: QuotaSettings) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_credentials(mut self, store: impl CredentialStore + 'static) -> Self {
        self.credentials = Some(Box::new(store));
        self
    }

    pub fn with_shared_password(mut self, password: impl Into<String>) -> Self {
        self.shared_password = Some(password.into());
        self
    }

    pub fn with_embed_key(mut self, key: impl Into<String>) -> Self {
        self.embed_key = Some(key.into());
        self
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn quota(&self) -> QuotaSettings {
        self.quota
    }

    pub fn new_session(&self) -> SessionState {
        SessionState::new(self.quota.initial_limit)
    }

    pub fn state(&self, session: &SessionState) -> AccessState {
        if session.privileged {
            return AccessState::LoggedIn;
        }
        match self.mode {
            AccessMode::Quota if session.search_count >= session.search_limit => {
                AccessState::GuestExhausted
            }
            AccessMode::Quota => AccessState::GuestWithQuota,
            _ => AccessState::LoggedOut,
        }
    }

    pub fn login(
        &self,
        session: &SessionState,
        identity: &str,
        secret: &str,
    ) -> Result<SessionState, AccessError> {
        let expected = match self.mode {
            AccessMode::Password => self
                .shared_password
                .clone()
                .ok_or(AccessError::CredentialsUnavailable)?,
            _ => {
                let store = self
                    .credentials
                    .as_ref()
                    .ok_or(AccessError::CredentialsUnavailable)?;
                store.lookup(identity).ok_or_else(|| {
                    warn!("Login rejected: unknown id '{identity}'");
                    AccessError::Auth(AuthFailure::UnknownIdentity)
                })?
            }
        };

        if expected != secret {
            warn!("Login rejected: wrong password for '{identity}'");
            return Err(AuthFailure::WrongSecret.into());
        }

        info!("Login succeeded for '{identity}'");
        let mut next = session.clone();
        next.privileged = true;
        next.identity = identity.to_string();
        Ok(next)
    }

    pub fn authorize_embed(
        &self,
        session: &SessionState,
        key: &str,
    ) -> Result<SessionState, AccessError> {
        match &self.embed_key {
            Some(expected) if expected == key => {
                info!("Embed key accepted");
                let mut next = session.clone();
                next.privileged = true;
                next.identity = EMBED_IDENTITY.to_string();
                Ok(next)
            }
            _ => {
                warn!("Embed key rejected");
                Err(AccessError::InvalidEmbedKey)
            }
        }
    }

    pub fn logout(&self, session: &SessionState) -> SessionState {
        info!("Logout for '{}'", session.identity);
        let mut next = session.clone();
        next.privileged = false;
        next.identity.clear();
        next
    }

    /// Gate a query. An `Ok` means the matcher may run for `query`.
    pub fn submit_query(
        &self,
        session: &SessionState,
        query: &str,
    ) -> Result<SessionState, AccessError> {
        if query.is_empty() {
            return Ok(session.clone());
        }

        if session.privileged || self.mode == AccessMode::Open {
            let mut next = session.clone();
            next.last_query = query.to_string();
            return Ok(next);
        }

        if self.mode != AccessMode::Quota {
            return Err(AccessError::LoginRequired);
        }

        if query == session.last_query {
            debug!("Repeat of last query, not charged");
            return Ok(session.clone());
        }

        if session.search_count >= session.search_limit {
            warn!(
                "Quota exhausted ({}/{}), query denied",
                session.search_count, session.search_limit
            );
            return Err(AccessError::QuotaExceeded {
                limit: session.search_limit,
            });
        }

        let mut next = session.clone();
        next.search_count += 1;
        next.last_query = query.to_string();
        debug!(
            "Query charged ({}/{})",
            next.search_count, next.search_limit
        );
        Ok(next)
    }

    /// Raise the quota ceiling by one reward block.
    ///
    /// Every call grants a block; the caller is responsible for putting a
    /// confirmation step in front of it.
    pub fn claim_reward(&self, session: &SessionState) -> SessionState {
        let mut next = session.clone();
        next.search_limit = next.search_limit.saturating_add(self.quota.reward_limit);
        info!(
            "Reward claimed, search limit {} -> {}",
            session.search_limit, next.search_limit
        );
        next
    }

    /// Searches left before the quota runs out; `None` when unlimited.
    pub fn remaining_quota(&self, session: &SessionState) -> Option<u32> {
        if session.privileged || self.mode != AccessMode::Quota {
            return None;
        }
        Some(session.search_limit.saturating_sub(session.search_count))
    }

    pub fn is_privileged(&self, session: &SessionState) -> bool {
        session.privileged
    }

    /// Whether results for `query` can be shown again without charging.
    pub fn may_view(&self, session: &SessionState, query: &str) -> bool {
        if query.is_empty() {
            return false;
        }
        session.privileged
            || self.mode == AccessMode::Open
            || (self.mode == AccessMode::Quota && query == session.last_query)
    }
}

impl fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPolicy")
            .field("mode", &self.mode)
            .field("quota", &self.quota)
            .field("credentials", &self.credentials.is_some())
            .field("shared_password", &self.shared_password.is_some())
            .field("embed_key", &self.embed_key.is_some())
            .finish()
    }
}
