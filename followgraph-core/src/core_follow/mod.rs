//! Followers/following collections and the follow activity

mod activity;
mod collection;
mod service;

pub use activity::{Activity, ActivityObject, ActivityRequest, FOLLOW_VERB};
pub use collection::{Collection, CollectionKind};
pub use service::{FollowCollectionService, FollowOutcome, ALLOWED_COLLECTION_METHODS};
