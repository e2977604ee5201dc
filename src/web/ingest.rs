use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::app::AppState;
use super::error::ApiError;

/// Request body for `POST /messages`.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    pub content: String,
}

/// Credential carried on the query string, same convention as the socket
/// endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
}

/// `POST /messages?token=...` accepts a message for relay. 202 means the
/// broker accepted the envelope, not that anyone received it.
pub async fn submit_message(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    match state.ingest.submit(body.content, &query.token).await {
        Ok(_) => Ok((StatusCode::ACCEPTED, Json(SubmitResponse { status: "accepted" }))),
        Err(err) => {
            debug!(error=%err, "message submission rejected");
            Err(err.into())
        }
    }
}
