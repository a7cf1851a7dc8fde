// src/api/rejection.rs

use serde::Serialize;
use std::convert::Infallible;
use tracing::{error, warn};
use warp::{
    http::StatusCode,
    reject::{InvalidQuery, MethodNotAllowed, Reject},
    Rejection, Reply,
};

use crate::error::Error;

/// Library error carried through warp's rejection machinery.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl Reject for ApiError {}

pub fn reject(err: Error) -> Rejection {
    warp::reject::custom(ApiError(err))
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::UnknownField(_) | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
        Error::DataSource { .. } | Error::Validation { .. } | Error::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Turn every rejection into `{"detail": ...}` with a matching status.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if let Some(ApiError(e)) = err.find::<ApiError>() {
        let status = status_for(e);
        if status.is_server_error() {
            error!(%status, error = %e, "request failed");
        }
        (status, e.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(e) = err.find::<InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
    } else {
        warn!(?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { detail }),
        status,
    ))
}
