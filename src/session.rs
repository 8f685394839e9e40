use serde::{Deserialize, Serialize};

/// Per-user state read and rewritten by [`crate::policy::AccessPolicy`].
///
/// Values are replaced rather than edited in place: every policy operation
/// takes the current state and hands back the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub(crate) privileged: bool,
    pub(crate) identity: String,
    pub(crate) search_count: u32,
    pub(crate) search_limit: u32,
    pub(crate) last_query: String,
}

impl SessionState {
    pub fn new(initial_limit: u32) -> Self {
        Self {
            privileged: false,
            identity: String::new(),
            search_count: 0,
            search_limit: initial_limit,
            last_query: String::new(),
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn search_count(&self) -> u32 {
        self.search_count
    }

    pub fn search_limit(&self) -> u32 {
        self.search_limit
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }
}
