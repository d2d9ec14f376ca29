//! Credential gating for collection reads and feed writes
//!
//! The [`AccessGate`] turns presented [`Credentials`] into a
//! [`CallerContext`]. Whether a key or token is valid is decided by a
//! [`CredentialValidator`]; [`CredentialRegistry`] is the in-process one.

mod credentials;
mod gate;
mod registry;

pub use credentials::{Credentials, TokenCredentials};
pub use gate::{AccessGate, CallerContext, CredentialValidator, GateState, ValidationOutcome};
pub use registry::{ClientRegistration, CredentialRegistry, TokenPair, MIN_PASSWORD_LEN};
