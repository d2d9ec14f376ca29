//! Follow graph: actors, directed follow edges, and the edge stores that
//! hold them.

pub mod actor;
pub mod edge;
pub mod store;

pub use actor::{validate_nickname, Actor, ActorId, Person, PERSON_OBJECT_TYPE};
pub use edge::{EdgeDirection, EdgePage, FollowEdge, InsertOutcome};
pub use store::{open_store, EdgeStore, MemoryEdgeStore, SqliteEdgeStore};
