use crate::core::admission::AdmissionController;
use crate::utils::error::LinkError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Refuses the request with 429 once the admission cap is reached.
///
/// The guard lives as long as the inner future, so capacity comes back when
/// the response is produced or the client goes away.
pub async fn admission_gate(
    State(admission): State<Arc<AdmissionController>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(_admitted) = admission.admit() else {
        tracing::warn!(
            "rejecting {} {}: {} requests already in flight",
            request.method(),
            request.uri(),
            admission.capacity()
        );
        return LinkError::CapacityExceeded {
            cap: admission.capacity(),
        }
        .into_response();
    };

    next.run(request).await
}
