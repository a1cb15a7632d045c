use tracing::{info, warn};

use crate::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "authToken";
pub const USERNAME_KEY: &str = "authUsername";

/// Client-held authentication. Anonymous when there is no token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    username: Option<String>,
}

impl Session {
    pub fn restore(store: &dyn KeyValueStore) -> Self {
        let session = Self {
            token: store.get_item(TOKEN_KEY),
            username: store.get_item(USERNAME_KEY),
        };
        if let Some(name) = session.username.as_deref().filter(|_| session.is_authenticated()) {
            info!("Restored session for {}", name);
        }
        session
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Enter the authenticated state and persist it. Store failures are
    /// logged; the in-memory session is set either way.
    pub fn establish(&mut self, token: &str, username: &str, store: &mut dyn KeyValueStore) {
        self.token = Some(token.to_string());
        self.username = Some(username.to_string());
        if let Err(e) = store
            .set_item(TOKEN_KEY, token)
            .and_then(|_| store.set_item(USERNAME_KEY, username))
        {
            warn!("Failed to persist session: {:#}", e);
        }
    }

    /// Back to anonymous, in memory and in the store.
    pub fn clear(&mut self, store: &mut dyn KeyValueStore) {
        self.token = None;
        self.username = None;
        for key in [TOKEN_KEY, USERNAME_KEY] {
            if let Err(e) = store.remove_item(key) {
                warn!("Failed to remove {} from store: {:#}", key, e);
            }
        }
    }
}
