use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};

use crate::core::config::Config;
use crate::core::error::AuthError;
use crate::core::message::{RoomId, User, UserId};

/// The provisioned user table. Tokens are pre-issued; there is no
/// registration path. Resolving a token is a pure lookup with no side
/// effects, run to completion before any connection resources exist.
#[derive(Debug, Default)]
pub struct UserDirectory {
    by_token: HashMap<String, User>,
}

impl UserDirectory {
    /// Builds the table from config, rejecting empty tokens and duplicate
    /// user ids up front.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut by_token = HashMap::new();
        let mut seen_ids = HashSet::new();
        for (token, user) in &config.users {
            if token.is_empty() {
                bail!("user {} is provisioned with an empty token", user.id);
            }
            if !seen_ids.insert(user.id) {
                bail!("duplicate user id {} in user table", user.id);
            }
            by_token.insert(
                token.clone(),
                User {
                    id: UserId(user.id),
                    username: user.username.clone(),
                    token: token.clone(),
                    room_id: RoomId(user.room_id),
                },
            );
        }
        Ok(Self { by_token })
    }

    /// Builds the table from already-constructed records, keyed by token.
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        Self { by_token: users.into_iter().map(|u| (u.token.clone(), u)).collect() }
    }

    pub fn resolve(&self, token: &str) -> Result<&User, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        self.by_token.get(token).ok_or(AuthError::InvalidCredential)
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}
