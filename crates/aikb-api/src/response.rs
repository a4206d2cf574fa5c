use aikb_foundry::UpstreamResponse;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{request::Parts, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

pub const THREAD_ID_HEADER: &str = "x-thread-id";
pub const RUN_ID_HEADER: &str = "x-run-id";

/// Upstream JSON relayed verbatim with the upstream status
#[derive(Debug)]
pub struct Relay {
    status: StatusCode,
    body: Value,
    headers: Vec<(&'static str, String)>,
}

impl Relay {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            headers: Vec::new(),
        }
    }

    pub fn thread_id(self, id: Option<&str>) -> Self {
        self.header(THREAD_ID_HEADER, id)
    }

    pub fn run_id(self, id: Option<&str>) -> Self {
        self.header(RUN_ID_HEADER, id)
    }

    fn header(mut self, name: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.headers.push((name, value.to_string()));
        }
        self
    }
}

impl From<UpstreamResponse> for Relay {
    fn from(response: UpstreamResponse) -> Self {
        Relay::new(response.status, response.body)
    }
}

impl IntoResponse for Relay {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            // ids that are not valid header values are left off
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(HeaderName::from_static(name), value);
            }
        }
        response
    }
}

/// JSON body extractor with the gateway's error envelope
///
/// An empty body reads as `{}`. Malformed JSON is a local failure (500);
/// well-formed JSON of the wrong shape is rejected with 400.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to read request body: {}", e)))?;

        parse_body(&bytes).map(JsonBody)
    }
}

fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ApiError::Internal(format!("invalid JSON body: {}", e)))?;
    let text = if text.trim().is_empty() { "{}" } else { text };

    serde_json::from_str(text).map_err(|e| {
        if e.is_data() {
            ApiError::BadRequest(format!("invalid JSON body: {}", e))
        } else {
            ApiError::Internal(format!("invalid JSON body: {}", e))
        }
    })
}

/// Query string extractor with the gateway's error envelope
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(rejected(rejection.status(), rejection.body_text())),
        }
    }
}

/// Path parameter extractor with the gateway's error envelope
pub struct PathParam<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(PathParam(value)),
            Err(rejection) => Err(rejected(rejection.status(), rejection.body_text())),
        }
    }
}

fn rejected(status: StatusCode, message: String) -> ApiError {
    if status.is_client_error() {
        ApiError::BadRequest(message)
    } else {
        ApiError::Internal(message)
    }
}
