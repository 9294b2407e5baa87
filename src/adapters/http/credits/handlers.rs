//! HTTP handlers for credit queries.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::adapters::http::AppState;
use crate::application::{CreditSummary, GetCreditSummaryQuery};
use crate::domain::foundation::{DomainError, ErrorCode, OwnerId};

/// GET /api/credits/:owner_id
pub async fn get_credit_summary(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<CreditSummary>, CreditsApiError> {
    let owner_id = OwnerId::new(owner_id).map_err(DomainError::from)?;
    let summary = state
        .credit_summary_handler()
        .handle(GetCreditSummaryQuery { owner_id })
        .await?;
    Ok(Json(summary))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_code: String,
    message: String,
}

/// API error type that converts domain errors to HTTP responses.
pub struct CreditsApiError(DomainError);

impl From<DomainError> for CreditsApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CreditsApiError {
    fn into_response(self) -> Response {
        let status = match self.0.code {
            ErrorCode::OwnerNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationFailed | ErrorCode::InvalidAmount => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, "Credit summary failed");
            "Internal error".to_string()
        } else {
            self.0.message.clone()
        };

        let body = ErrorBody {
            error_code: self.0.code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
