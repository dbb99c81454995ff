//! The hyper-facing request service: routing, body handling, dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use tracing::{debug, error, warn};

use wireline_json_rpc::{RequestContext, RequestDispatcher};

/// Handles one HTTP exchange end to end: route checks, body collection,
/// metadata extraction, dispatch, envelope serialization.
///
/// Cheap to clone; one instance is shared across all connections. Generic
/// over the body type so hybrid hosts and tests can call it without a
/// socket.
#[derive(Clone)]
pub struct RpcService {
    path: String,
    max_body_size: usize,
    dispatcher: Arc<RequestDispatcher>,
}

impl RpcService {
    pub fn new(
        path: impl Into<String>,
        max_body_size: usize,
        dispatcher: Arc<RequestDispatcher>,
    ) -> Self {
        Self {
            path: path.into(),
            max_body_size,
            dispatcher,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Handle a request. Infallible by contract: every failure becomes
    /// either a transport-level status or an error envelope.
    pub async fn call<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: http_body::Body,
        B::Error: std::fmt::Display,
    {
        if req.uri().path() != self.path {
            return plain(StatusCode::NOT_FOUND, "Not Found");
        }

        if req.method() != Method::POST {
            return Response::builder()
                .status(StatusCode::METHOD_NOT_ALLOWED)
                .header(ALLOW, "POST")
                .body(Full::new(Bytes::from("Method not allowed")))
                .unwrap();
        }

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("");
        if !content_type.starts_with("application/json") {
            warn!(content_type, "invalid content type");
            return plain(
                StatusCode::BAD_REQUEST,
                "Content-Type must be application/json",
            );
        }

        let metadata = metadata_from_headers(req.headers());

        let body_bytes = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                error!("failed to read request body: {}", err);
                return plain(StatusCode::BAD_REQUEST, "Failed to read request body");
            }
        };

        if body_bytes.len() > self.max_body_size {
            warn!(size = body_bytes.len(), "request body too large");
            return plain(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }

        let ctx = RequestContext::from_metadata(metadata);
        let message = self.dispatcher.dispatch(&body_bytes, ctx).await;

        match serde_json::to_vec(&message) {
            Ok(json) => {
                debug!("sending response envelope");
                Response::builder()
                    .status(StatusCode::OK)
                    .header(CONTENT_TYPE, "application/json")
                    .body(Full::new(Bytes::from(json)))
                    .unwrap()
            }
            Err(err) => {
                error!("failed to serialize response envelope: {}", err);
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

/// Lowercased header name → value map, the request context's metadata
/// source. Headers with non-UTF-8 values are skipped.
fn metadata_from_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn plain(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
