use std::collections::HashMap;

use anyhow::{anyhow, Result};
use http_body_util::{BodyExt, Full, Limited};
use hyper::{
    body::{Bytes, Incoming},
    header::{self, HeaderValue},
    Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::error;

pub type HttpResponse = Response<Full<Bytes>>;

const MAX_BODY_BYTES: usize = 1024 * 1024;

fn with_body(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> HttpResponse {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub fn json<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => with_body(status, "application/json", bytes),
        Err(e) => {
            error!("Failed to serialize response: {e}");
            with_body(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", "Internal error")
        }
    }
}

pub fn success(fields: Value) -> HttpResponse {
    let mut body = json!({ "success": true });
    if let (Some(body), Value::Object(fields)) = (body.as_object_mut(), fields) {
        body.extend(fields);
    }
    json(StatusCode::OK, &body)
}

pub fn failure(status: StatusCode, message: &str) -> HttpResponse {
    json(status, &json!({ "success": false, "error": message }))
}

pub fn text(status: StatusCode, message: &'static str) -> HttpResponse {
    with_body(status, "text/plain", message)
}

pub fn redirect(location: &str) -> HttpResponse {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::FOUND;
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(e) => {
            error!("Invalid redirect location: {e}");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect")
        }
    }
}

pub fn no_content() -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

pub fn with_cors(mut response: HttpResponse) -> HttpResponse {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Authorization, Content-Type"),
    );
    response
}

pub fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .unwrap_or("")
        .split('&')
        .filter_map(|kv| {
            let mut parts = kv.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next()?;
            let value = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
            Some((key.to_string(), value))
        })
        .collect()
}

pub async fn read_json<T: DeserializeOwned>(body: Incoming) -> Result<T> {
    let bytes = Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| anyhow!("Failed to read request body: {e}"))?
        .to_bytes();
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
