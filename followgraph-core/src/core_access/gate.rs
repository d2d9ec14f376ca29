//! Access gate state machine

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::credentials::Credentials;
use crate::core_graph::Actor;
use crate::errors::{GraphError, GraphResult};
use crate::metrics;

/// What a validator concluded about a set of credentials
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationOutcome {
    pub consumer_valid: bool,
    /// Actor the token is bound to, when the token is valid
    pub actor: Option<Actor>,
    pub token_valid: bool,
}

/// Decides whether consumer keys and access tokens are genuine
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, credentials: &Credentials) -> GraphResult<ValidationOutcome>;
}

/// Who is calling, once the gate has let them through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerContext {
    /// Valid consumer, no token
    Consumer { client_id: String },
    /// Valid consumer plus a valid token for `actor`
    Actor { client_id: String, actor: Actor },
}

impl CallerContext {
    pub fn client_id(&self) -> &str {
        match self {
            CallerContext::Consumer { client_id } | CallerContext::Actor { client_id, .. } => {
                client_id
            }
        }
    }

    pub fn actor(&self) -> Option<&Actor> {
        match self {
            CallerContext::Consumer { .. } => None,
            CallerContext::Actor { actor, .. } => Some(actor),
        }
    }

    /// The token's actor, or `Unauthorized` for a consumer-only caller
    pub fn require_actor(&self) -> GraphResult<&Actor> {
        self.actor().ok_or_else(|| {
            GraphError::Unauthorized("This operation requires an actor access token".to_string())
        })
    }
}

/// Gate progression: `Unauthenticated -> ConsumerValidated ->
/// (TokenAbsent | TokenValidated)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unauthenticated,
    ConsumerValidated,
    TokenAbsent,
    TokenValidated,
}

/// Validates caller credentials before a read or write is permitted.
///
/// Has no side effects beyond producing the caller context.
#[derive(Clone)]
pub struct AccessGate {
    validator: Arc<dyn CredentialValidator>,
}

impl AccessGate {
    pub fn new(validator: Arc<dyn CredentialValidator>) -> Self {
        Self { validator }
    }

    pub async fn authorize(&self, credentials: Option<&Credentials>) -> GraphResult<CallerContext> {
        let mut state = GateState::Unauthenticated;

        let Some(credentials) = credentials else {
            return Err(reject(state, "missing_credentials", "No credentials supplied"));
        };

        let outcome = self.validator.validate(credentials).await?;
        if !outcome.consumer_valid {
            return Err(reject(state, "invalid_consumer", "Invalid consumer key or secret"));
        }
        state = GateState::ConsumerValidated;

        let client_id = credentials.consumer_key.clone();
        if !credentials.has_token() {
            state = GateState::TokenAbsent;
            debug!(?state, client_id = %client_id, "Consumer-scoped caller");
            return Ok(CallerContext::Consumer { client_id });
        }

        match (outcome.token_valid, outcome.actor) {
            (true, Some(actor)) => {
                state = GateState::TokenValidated;
                debug!(?state, client_id = %client_id, actor = %actor.id, "Actor-scoped caller");
                Ok(CallerContext::Actor { client_id, actor })
            }
            (true, None) => {
                warn!(client_id = %client_id, "Validator accepted a token without an actor");
                Err(reject(state, "invalid_token", "Token is not bound to an actor"))
            }
            (false, _) => Err(reject(state, "invalid_token", "Invalid access token or secret")),
        }
    }
}

fn reject(state: GateState, reason: &'static str, message: &str) -> GraphError {
    debug!(?state, reason, "Rejected credentials");
    metrics::record_access_rejection(reason);
    GraphError::Unauthorized(message.to_string())
}
