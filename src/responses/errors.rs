use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde::Serialize;
use tracing::{error, warn};

pub type ResultResp = Result<Response, ServerError>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    field: Option<&'a str>,
}

fn status_of(err: &ServerError) -> u16 {
    match err {
        ServerError::NotFound => 404,
        ServerError::BadRequest(_) | ServerError::Query(_) => 400,
        ServerError::Embedding(_) => 502,
        ServerError::Store(_) | ServerError::XlsxError(_) | ServerError::InternalError => 500,
    }
}

/// Convert a ServerError into a JSON error response: `{error, field}`.
pub fn error_to_response(err: ServerError) -> Response {
    let status = status_of(&err);
    if status >= 500 {
        error!(status, error = %err, "request failed");
    } else {
        warn!(status, error = %err, "request rejected");
    }

    let body = ErrorBody {
        error: err.to_string(),
        field: match &err {
            ServerError::Query(q) => Some(q.field),
            _ => None,
        },
    };
    let json = serde_json::to_vec(&body).unwrap_or_else(|_| b"{\"error\":\"internal\"}".to_vec());

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(json))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
