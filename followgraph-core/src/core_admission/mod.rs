//! Bounded-concurrency admission for bulk graph mutations
//!
//! Bulk drivers (many actors following one, one actor following many) push
//! each operation through an [`AdmissionQueue`] and fan back in over the
//! returned handles.

mod queue;

pub use queue::{AdmissionError, AdmissionHandle, AdmissionQueue};
