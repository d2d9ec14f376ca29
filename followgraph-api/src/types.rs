//! Request and response bodies that are not core types

use followgraph_core::core_graph::Person;
use serde::{Deserialize, Serialize};

/// Error body: `{"error": <kind>, "message": <text>}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Raw paging parameters; parsed by the pagination engine so malformed
/// values get a proper error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<String>,
    pub count: Option<String>,
}

pub const CLIENT_ASSOCIATE: &str = "client_associate";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterClientRequest {
    #[serde(rename = "type")]
    pub registration_type: String,
    pub application_name: Option<String>,
    pub application_type: Option<String>,
    pub contacts: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub nickname: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub nickname: String,
    pub profile: Person,
    pub token: String,
    pub token_secret: String,
}
