use crate::catalog::{CatalogCache, Record};
use crate::error::{AccessError, Result};
use crate::matcher::{search_with, MatchMode, Matcher};
use crate::policy::{AccessMode, AccessPolicy, AccessState};
use crate::session::SessionState;
use log::debug;

/// Result of a permitted query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub session: SessionState,
    pub matches: Vec<Record>,
}

/// Ties the policy, the cached catalog and the matcher together.
///
/// This is the surface a front end talks to: event handlers that turn one
/// session into the next, plus read-only accessors for rendering.
#[derive(Debug)]
pub struct SearchService {
    policy: AccessPolicy,
    catalog: CatalogCache,
    match_mode: MatchMode,
}

impl SearchService {
    pub fn new(policy: AccessPolicy, catalog: CatalogCache) -> Self {
        Self {
            policy,
            catalog,
            match_mode: MatchMode::default(),
        }
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn new_session(&self) -> SessionState {
        self.policy.new_session()
    }

    /// Handle a submitted query.
    ///
    /// The catalog is fetched and the query compiled before the policy is
    /// consulted, so a load failure or a bad pattern never costs quota.
    pub fn submit_query(&self, session: &SessionState, query: &str) -> Result<QueryOutcome> {
        let catalog = self.catalog.get()?;
        let matcher = Matcher::new(query, self.match_mode)?;
        let next = self.policy.submit_query(session, query)?;

        let matches = if query.is_empty() {
            Vec::new()
        } else {
            search_with(&catalog, &matcher).into_iter().cloned().collect()
        };
        debug!("Query '{}' -> {} matches", query, matches.len());

        Ok(QueryOutcome {
            session: next,
            matches,
        })
    }

    /// Matches to show for `query` on a re-render. Never charges quota.
    pub fn current_matches(&self, session: &SessionState, query: &str) -> Result<Vec<Record>> {
        if !self.policy.may_view(session, query) {
            return Ok(Vec::new());
        }
        let catalog = self.catalog.get()?;
        let matcher = Matcher::new(query, self.match_mode)?;
        Ok(search_with(&catalog, &matcher).into_iter().cloned().collect())
    }

    /// Leading rows of the catalog, shown when no query has been entered.
    ///
    /// Gated like a search in modes that require a login.
    pub fn preview(&self, session: &SessionState, limit: usize) -> Result<Vec<Record>> {
        if self.policy.state(session) == AccessState::LoggedOut
            && self.policy.mode() != AccessMode::Open
        {
            return Err(AccessError::LoginRequired.into());
        }
        let catalog = self.catalog.get()?;
        Ok(catalog.preview(limit).to_vec())
    }

    pub fn catalog_size(&self) -> Result<usize> {
        Ok(self.catalog.get()?.len())
    }

    pub fn login(&self, session: &SessionState, identity: &str, secret: &str) -> Result<SessionState> {
        Ok(self.policy.login(session, identity, secret)?)
    }

    pub fn authorize_embed(&self, session: &SessionState, key: &str) -> Result<SessionState> {
        Ok(self.policy.authorize_embed(session, key)?)
    }

    pub fn logout(&self, session: &SessionState) -> SessionState {
        self.policy.logout(session)
    }

    pub fn claim_reward(&self, session: &SessionState) -> SessionState {
        self.policy.claim_reward(session)
    }

    pub fn remaining_quota(&self, session: &SessionState) -> Option<u32> {
        self.policy.remaining_quota(session)
    }

    pub fn is_privileged(&self, session: &SessionState) -> bool {
        self.policy.is_privileged(session)
    }

    pub fn state(&self, session: &SessionState) -> AccessState {
        self.policy.state(session)
    }
}
