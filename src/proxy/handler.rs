use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::proxy::ProxyState;
use crate::types::RpcRequest;

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub async fn handle_rpc(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    if method != Method::POST {
        return error_body(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    let Ok(payload) = serde_json::from_slice::<Value>(&body) else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid JSON body");
    };

    let rpc_method = RpcRequest::method_of(&payload).map(str::to_string);
    if let Some(rpc_method) = rpc_method.as_deref() {
        if state.cache.is_cacheable(rpc_method) {
            let id = RpcRequest::id_of(&payload);
            if let Some(cached) = state.cache.get(rpc_method, id, Instant::now()) {
                debug!(method = rpc_method, "serving cached response");
                return Json(cached).into_response();
            }
        }
    }

    match state.transport.forward(&payload).await {
        Ok((status, response)) => {
            if let Some(rpc_method) = rpc_method.as_deref() {
                if status.is_success() {
                    state.cache.put(rpc_method, &response, Instant::now());
                }
            }
            debug!(method = ?rpc_method, %status, "forwarded rpc request");
            (status, Json(response)).into_response()
        }
        Err(err) => {
            error!(method = ?rpc_method, error = %err, "RPC proxy error");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

pub async fn cors(State(state): State<Arc<ProxyState>>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, state.allowed_origin.clone());
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}
