//! Follow edge records

use super::actor::{Actor, ActorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directed edge meaning "source follows target"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub source: ActorId,
    pub target: ActorId,
    pub created_at: DateTime<Utc>,
    /// Store-assigned sequence; scan order follows it
    pub seq: u64,
}

/// Result of an edge insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// False when the edge already existed
    pub created: bool,
}

/// Which endpoint a scan is anchored on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeDirection {
    /// Actors following the anchor (anchor is the target)
    Followers,
    /// Actors the anchor follows (anchor is the source)
    Following,
}

impl EdgeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeDirection::Followers => "followers",
            EdgeDirection::Following => "following",
        }
    }
}

/// A consistent slice of one adjacency list: the total and the page were
/// read from the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePage {
    pub total: usize,
    pub actors: Vec<Actor>,
}
