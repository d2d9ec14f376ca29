//! In-process client, account, and token registry

use std::collections::HashMap;
use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::credentials::Credentials;
use super::gate::{CredentialValidator, ValidationOutcome};
use crate::config::{AuthConfig, PasswordHashConfig};
use crate::core_graph::{validate_nickname, Actor, EdgeStore};
use crate::errors::{GraphError, GraphResult};

/// Shortest password accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// Response to a client association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: String,
    /// Seconds since epoch; 0 means the secret never expires
    pub expires_at: i64,
}

/// Access token and secret bound to one client and one actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub token: String,
    pub token_secret: String,
}

struct ClientRecord {
    secret: String,
    application_name: Option<String>,
}

struct AccountRecord {
    actor: Actor,
    password_hash: String,
}

struct TokenRecord {
    secret: String,
    client_id: String,
    actor: Actor,
}

#[derive(Default)]
struct RegistryState {
    clients: HashMap<String, ClientRecord>,
    accounts: HashMap<String, AccountRecord>,
    tokens: HashMap<String, TokenRecord>,
}

/// Issues and validates client credentials and actor tokens.
///
/// Actors are created in the edge store; the registry only keeps the
/// password hash and the tokens that point at them.
pub struct CredentialRegistry {
    store: Arc<dyn EdgeStore>,
    hasher: Argon2<'static>,
    state: RwLock<RegistryState>,
}

const SALT_LEN: usize = 16;

fn random_salt() -> GraphResult<SaltString> {
    let mut bytes = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut bytes);
    SaltString::encode_b64(&bytes)
        .map_err(|e| GraphError::Internal(format!("Salt encoding failed: {}", e)))
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn build_hasher(config: &PasswordHashConfig) -> GraphResult<Argon2<'static>> {
    let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
        .map_err(|e| GraphError::Internal(format!("Invalid password hash parameters: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

impl CredentialRegistry {
    /// Build a registry holding the configured seed clients
    pub fn new(store: Arc<dyn EdgeStore>, config: &AuthConfig) -> GraphResult<Self> {
        let mut state = RegistryState::default();
        for seed in &config.clients {
            state.clients.insert(
                seed.client_id.clone(),
                ClientRecord {
                    secret: seed.client_secret.clone(),
                    application_name: None,
                },
            );
        }
        if !state.clients.is_empty() {
            info!(count = state.clients.len(), "Loaded seed clients");
        }

        Ok(Self {
            store,
            hasher: build_hasher(&config.password_hash)?,
            state: RwLock::new(state),
        })
    }

    /// Associate a new client application
    pub async fn register_client(&self, application_name: Option<String>) -> ClientRegistration {
        let registration = ClientRegistration {
            client_id: random_hex(16),
            client_secret: random_hex(32),
            expires_at: 0,
        };

        info!(
            client_id = %registration.client_id,
            application = application_name.as_deref().unwrap_or("-"),
            "Registered client"
        );
        self.state.write().await.clients.insert(
            registration.client_id.clone(),
            ClientRecord {
                secret: registration.client_secret.clone(),
                application_name,
            },
        );
        registration
    }

    pub async fn application_name(&self, client_id: &str) -> Option<String> {
        self.state
            .read()
            .await
            .clients
            .get(client_id)
            .and_then(|c| c.application_name.clone())
    }

    /// Register an actor with a password and hand `client_id` a token for it
    pub async fn register_account(
        &self,
        client_id: &str,
        nickname: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> GraphResult<(Actor, TokenPair)> {
        validate_nickname(nickname)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(GraphError::BadRequest(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        self.require_client(client_id).await?;

        let password_hash = self.hash_password(password).await?;
        let actor = self
            .store
            .register_actor(nickname, display_name.unwrap_or(nickname))
            .await?;

        let pair = {
            let mut state = self.state.write().await;
            state.accounts.insert(
                nickname.to_string(),
                AccountRecord {
                    actor: actor.clone(),
                    password_hash,
                },
            );
            insert_token(&mut state, client_id, &actor)
        };

        info!(nickname, actor = %actor.id, "Registered account");
        Ok((actor, pair))
    }

    /// Exchange a nickname and password for a new token bound to `client_id`
    pub async fn issue_token(
        &self,
        client_id: &str,
        nickname: &str,
        password: &str,
    ) -> GraphResult<TokenPair> {
        self.require_client(client_id).await?;

        let (actor, password_hash) = {
            let state = self.state.read().await;
            let account = state
                .accounts
                .get(nickname)
                .ok_or_else(|| GraphError::Unauthorized("Invalid nickname or password".to_string()))?;
            (account.actor.clone(), account.password_hash.clone())
        };

        if !self.verify_password(password, password_hash).await? {
            debug!(nickname, "Password mismatch");
            return Err(GraphError::Unauthorized("Invalid nickname or password".to_string()));
        }

        let pair = insert_token(&mut *self.state.write().await, client_id, &actor);
        debug!(nickname, client_id, "Issued access token");
        Ok(pair)
    }

    async fn require_client(&self, client_id: &str) -> GraphResult<()> {
        if self.state.read().await.clients.contains_key(client_id) {
            Ok(())
        } else {
            Err(GraphError::Unauthorized(format!("Unknown client: {}", client_id)))
        }
    }

    async fn hash_password(&self, password: &str) -> GraphResult<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || -> GraphResult<String> {
            let salt = random_salt()?;
            hasher
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| GraphError::Internal(format!("Password hashing failed: {}", e)))
        })
        .await?
    }

    async fn verify_password(&self, password: &str, password_hash: String) -> GraphResult<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || -> GraphResult<bool> {
            let parsed = PasswordHash::new(&password_hash)
                .map_err(|e| GraphError::Internal(format!("Invalid password hash: {}", e)))?;
            Ok(hasher.verify_password(password.as_bytes(), &parsed).is_ok())
        })
        .await?
    }
}

fn insert_token(state: &mut RegistryState, client_id: &str, actor: &Actor) -> TokenPair {
    let pair = TokenPair {
        token: random_hex(16),
        token_secret: random_hex(32),
    };
    state.tokens.insert(
        pair.token.clone(),
        TokenRecord {
            secret: pair.token_secret.clone(),
            client_id: client_id.to_string(),
            actor: actor.clone(),
        },
    );
    pair
}

#[async_trait]
impl CredentialValidator for CredentialRegistry {
    async fn validate(&self, credentials: &Credentials) -> GraphResult<ValidationOutcome> {
        let state = self.state.read().await;

        let consumer_valid = state
            .clients
            .get(&credentials.consumer_key)
            .is_some_and(|client| client.secret == credentials.consumer_secret);

        let actor = credentials.token.as_ref().and_then(|presented| {
            state
                .tokens
                .get(&presented.token)
                .filter(|record| {
                    record.secret == presented.token_secret
                        && record.client_id == credentials.consumer_key
                })
                .map(|record| record.actor.clone())
        });

        Ok(ValidationOutcome {
            consumer_valid,
            token_valid: actor.is_some(),
            actor,
        })
    }
}
