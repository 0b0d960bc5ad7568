use serde::{Deserialize, Serialize};

/// Standardized API error payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
