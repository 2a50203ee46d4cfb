use crate::app::server::AppState;
use crate::domain::model::{BatchRequest, ResultSet};
use crate::utils::error::{LinkError, Result};
use crate::utils::validation::validate_batch;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// `POST /` with a JSON array of URLs; answers with a URL to body object.
pub async fn fetch_urls(State(state): State<AppState>, body: Bytes) -> Response {
    match run(&state, &body).await {
        Ok(results) => Json(results).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn run(state: &AppState, body: &[u8]) -> Result<ResultSet> {
    let request: BatchRequest = serde_json::from_slice(body)
        .map_err(|e| LinkError::invalid_work(format!("couldn't decode request: {}", e)))?;
    validate_batch(&request.urls, state.max_count_urls)?;

    // Parent for this request: shutdown after the grace period, or the
    // handler future being dropped when the client disconnects.
    let parent = state.batches.child_token();
    let _cancel_on_drop = parent.clone().drop_guard();

    tracing::debug!("fetching {} urls", request.len());
    let results = state.engine.run(request.urls, &parent).await?;
    Ok(results)
}

impl IntoResponse for LinkError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &self {
            LinkError::Fetch(_) => format!("url fetching failed: {}", self),
            _ => self.to_string(),
        };
        if status.is_server_error() {
            tracing::error!("{}", message);
        } else {
            tracing::debug!("request rejected: {}", message);
        }
        (status, message).into_response()
    }
}
