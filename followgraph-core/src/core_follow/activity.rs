//! The follow activity posted to an actor's feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core_graph::{ActorId, Person, PERSON_OBJECT_TYPE};
use crate::errors::{GraphError, GraphResult};

/// The only verb the feed accepts
pub const FOLLOW_VERB: &str = "follow";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityObject {
    #[serde(rename = "objectType")]
    pub object_type: String,
    pub id: String,
}

/// Body of `POST /api/user/{nickname}/feed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRequest {
    pub verb: String,
    pub object: ActivityObject,
}

impl ActivityRequest {
    pub fn follow(target: &ActorId) -> Self {
        Self {
            verb: FOLLOW_VERB.to_string(),
            object: ActivityObject {
                object_type: PERSON_OBJECT_TYPE.to_string(),
                id: target.to_string(),
            },
        }
    }

    /// The person being followed, if this is a well-formed follow
    pub fn follow_target(&self) -> GraphResult<ActorId> {
        if self.verb != FOLLOW_VERB {
            return Err(GraphError::BadRequest(format!("Unsupported verb: {}", self.verb)));
        }
        if self.object.object_type != PERSON_OBJECT_TYPE {
            return Err(GraphError::BadRequest(format!(
                "Can only follow a person, not a {}",
                self.object.object_type
            )));
        }
        if self.object.id.is_empty() {
            return Err(GraphError::BadRequest("Object id is required".to_string()));
        }
        Ok(ActorId::new(self.object.id.clone()))
    }
}

/// The activity echoed back after a follow is applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub verb: String,
    pub actor: Person,
    pub object: Person,
    pub published: DateTime<Utc>,
}

impl Activity {
    pub(crate) fn follow(actor: Person, object: Person) -> Self {
        Self {
            id: format!("urn:uuid:{}", Uuid::new_v4()),
            verb: FOLLOW_VERB.to_string(),
            actor,
            object,
            published: Utc::now(),
        }
    }
}
