//! Follow graph core
//!
//! Directed follow edges between actors, paginated follower/following
//! collections, credential gating, and a bounded-concurrency admission queue
//! for driving bulk graph mutations.

pub mod config;
pub mod core_access;
pub mod core_admission;
pub mod core_follow;
pub mod core_graph;
pub mod core_pagination;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod shutdown;
pub mod test_utils;

pub use core_access::{AccessGate, CallerContext, CredentialRegistry, Credentials};
pub use core_admission::{AdmissionError, AdmissionHandle, AdmissionQueue};
pub use core_follow::{Collection, CollectionKind, FollowCollectionService, FollowOutcome};
pub use core_graph::{Actor, ActorId, EdgeStore};
pub use core_pagination::{PageRequest, PaginationEngine};
pub use errors::{ErrorKind, GraphError, GraphResult};
pub use logging::{init_logging, LogLevel};
