//! Actor identity and its person projection

use crate::errors::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Activity-stream object type for every actor in the graph
pub const PERSON_OBJECT_TYPE: &str = "person";

const MAX_NICKNAME_LEN: usize = 64;

/// Opaque, stable actor identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        ActorId(id.into())
    }

    /// Identifier assigned to a locally registered nickname
    pub fn for_nickname(nickname: &str, hostname: &str) -> Self {
        ActorId(format!("acct:{}@{}", nickname, hostname))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered actor. Never mutated by the graph core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub nickname: String,
    pub display_name: String,
}

impl Actor {
    pub fn new(id: ActorId, nickname: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            display_name: display_name.into(),
        }
    }

    /// JSON person object as it appears in collections and activities
    pub fn to_person(&self) -> Person {
        Person {
            id: self.id.to_string(),
            object_type: PERSON_OBJECT_TYPE.to_string(),
            display_name: self.display_name.clone(),
            preferred_username: self.nickname.clone(),
        }
    }
}

/// Person object wire shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub object_type: String,
    pub display_name: String,
    pub preferred_username: String,
}

/// Nicknames appear in URL paths, so they are restricted to `[A-Za-z0-9_-]`.
pub fn validate_nickname(nickname: &str) -> GraphResult<()> {
    if nickname.is_empty() || nickname.len() > MAX_NICKNAME_LEN {
        return Err(GraphError::BadRequest(format!(
            "nickname must be between 1 and {} characters",
            MAX_NICKNAME_LEN
        )));
    }
    if !nickname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(GraphError::BadRequest(format!(
            "nickname contains invalid characters: {}",
            nickname
        )));
    }
    Ok(())
}
