//! # Edge Authorization Filter
//!
//! Admits a request only after the auth service has accepted its bearer
//! credential. The gateway never decodes the credential itself.
//!
//! 1. [`extract_bearer`] checks the `Authorization` header shape locally.
//!    A missing or malformed header is refused with 401 and no remote call.
//! 2. The header is forwarded verbatim to `GET {auth}/validate`.
//! 3. 2xx admits the request unchanged. Any other answer, an unreachable
//!    verifier, or a timeout refuses it with 401.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::error::GatewayError;

/// Why a header never reached the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerRejection {
    /// No `Authorization` header at all.
    Missing,
    /// Header bytes are not valid UTF-8.
    NotUtf8,
    /// Scheme is something other than `Bearer`.
    NotBearer,
    /// `Bearer` with nothing after it.
    EmptyToken,
}

impl BearerRejection {
    /// Reason recorded in the edge rejection log. Never sent to the client.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing authorization header",
            Self::NotUtf8 => "authorization header is not valid UTF-8",
            Self::NotBearer => "authorization header must use Bearer scheme",
            Self::EmptyToken => "bearer token is empty",
        }
    }
}

/// Return the full `Authorization` value when it carries a non-empty bearer
/// credential.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, BearerRejection> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(BearerRejection::Missing)?
        .to_str()
        .map_err(|_| BearerRejection::NotUtf8)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(BearerRejection::NotBearer)?;
    if token.trim().is_empty() {
        return Err(BearerRejection::EmptyToken);
    }
    Ok(value)
}

/// What the verifier said about one credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierAnswer {
    /// 2xx.
    Accepted,
    /// Any other status.
    Refused { status: u16 },
    /// No answer within the bound, or no connection.
    Unreachable(String),
}

/// Verifies a bearer credential on the filter's behalf.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// `authorization` is the caller's header value, forwarded unchanged.
    async fn validate(&self, authorization: &str) -> VerifierAnswer;
}

/// Calls the auth service's `/validate` endpoint.
#[derive(Debug, Clone)]
pub struct RemoteTokenValidator {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl RemoteTokenValidator {
    /// Build a validator for `{auth_url}/validate`.
    pub fn new(auth_url: &Url, timeout: Duration) -> Result<Self, GatewayError> {
        let raw = format!("{}/validate", auth_url.as_str().trim_end_matches('/'));
        let endpoint = Url::parse(&raw).map_err(|e| GatewayError::BadGateway(e.to_string()))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TokenValidator for RemoteTokenValidator {
    async fn validate(&self, authorization: &str) -> VerifierAnswer {
        let send = self
            .http
            .get(self.endpoint.clone())
            .header(header::AUTHORIZATION, authorization)
            .send();

        match tokio::time::timeout(self.timeout, send).await {
            Err(_) => VerifierAnswer::Unreachable(format!("no answer within {:?}", self.timeout)),
            Ok(Err(e)) => VerifierAnswer::Unreachable(e.to_string()),
            Ok(Ok(resp)) if resp.status().is_success() => VerifierAnswer::Accepted,
            Ok(Ok(resp)) => VerifierAnswer::Refused {
                status: resp.status().as_u16(),
            },
        }
    }
}

/// Shared validator handle used as middleware state.
pub type SharedValidator = Arc<dyn TokenValidator>;

/// Middleware enforcing the filter. Install with
/// `axum::middleware::from_fn_with_state(validator, require_bearer)`.
pub async fn require_bearer(
    State(validator): State<SharedValidator>,
    request: Request,
    next: Next,
) -> Response {
    let authorization = match extract_bearer(request.headers()) {
        Ok(value) => value.to_owned(),
        Err(rejection) => {
            return GatewayError::Unauthorized(rejection.as_str().into()).into_response();
        }
    };

    match validator.validate(&authorization).await {
        VerifierAnswer::Accepted => next.run(request).await,
        VerifierAnswer::Refused { status } => {
            GatewayError::Unauthorized(format!("verifier refused credential with {status}"))
                .into_response()
        }
        VerifierAnswer::Unreachable(reason) => {
            tracing::warn!(reason = %reason, "credential verifier unreachable, failing closed");
            GatewayError::Unauthorized("verifier unreachable".into()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Answers with a fixed verdict and counts calls.
    struct CountingValidator {
        answer: VerifierAnswer,
        calls: AtomicUsize,
    }

    impl CountingValidator {
        fn new(answer: VerifierAnswer) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenValidator for CountingValidator {
        async fn validate(&self, _authorization: &str) -> VerifierAnswer {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    fn test_app(validator: Arc<CountingValidator>) -> Router {
        Router::new()
            .route("/protected", get(|| async { "admitted" }))
            .route_layer(from_fn_with_state(
                validator as SharedValidator,
                require_bearer,
            ))
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn headers(value: HeaderValue) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, value);
        map
    }

    // ── extract_bearer ───────────────────────────────────────────

    #[test]
    fn extract_bearer_returns_full_header() {
        let map = headers(HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&map), Ok("Bearer abc.def.ghi"));
    }

    #[test]
    fn extract_bearer_rejections() {
        assert_eq!(
            extract_bearer(&HeaderMap::new()),
            Err(BearerRejection::Missing)
        );
        assert_eq!(
            extract_bearer(&headers(HeaderValue::from_static("Basic dXNlcjpwYXNz"))),
            Err(BearerRejection::NotBearer)
        );
        assert_eq!(
            extract_bearer(&headers(HeaderValue::from_static("bearer abc"))),
            Err(BearerRejection::NotBearer)
        );
        assert_eq!(
            extract_bearer(&headers(HeaderValue::from_static("Bearer "))),
            Err(BearerRejection::EmptyToken)
        );
        assert_eq!(
            extract_bearer(&headers(HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap())),
            Err(BearerRejection::NotUtf8)
        );
    }

    #[test]
    fn each_rejection_has_its_own_reason() {
        let reasons: std::collections::HashSet<_> = [
            BearerRejection::Missing,
            BearerRejection::NotUtf8,
            BearerRejection::NotBearer,
            BearerRejection::EmptyToken,
        ]
        .iter()
        .map(BearerRejection::as_str)
        .collect();
        assert_eq!(reasons.len(), 4);
        assert!(!reasons.contains(""));
    }

    // ── middleware ───────────────────────────────────────────────

    #[tokio::test]
    async fn malformed_headers_never_reach_verifier() {
        let validator = CountingValidator::new(VerifierAnswer::Accepted);
        let app = test_app(validator.clone());

        for value in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer "), Some("Token abc")] {
            let response = app.clone().oneshot(request(value)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value:?}");
        }
        assert_eq!(validator.calls(), 0);
    }

    #[tokio::test]
    async fn accepted_credential_is_admitted() {
        let validator = CountingValidator::new(VerifierAnswer::Accepted);
        let response = test_app(validator.clone())
            .oneshot(request(Some("Bearer abc")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"admitted");
        assert_eq!(validator.calls(), 1);
    }

    #[tokio::test]
    async fn refused_credential_stops_chain() {
        let validator = CountingValidator::new(VerifierAnswer::Refused { status: 401 });
        let response = test_app(validator.clone())
            .oneshot(request(Some("Bearer abc")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["error"]["code"], "UNAUTHORIZED");
        assert_eq!(validator.calls(), 1);
    }

    #[tokio::test]
    async fn unreachable_verifier_fails_closed() {
        let validator =
            CountingValidator::new(VerifierAnswer::Unreachable("connection refused".into()));
        let response = test_app(validator)
            .oneshot(request(Some("Bearer abc")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn remote_validator_endpoint_appends_validate() {
        let validator = RemoteTokenValidator::new(
            &"http://auth:4005/".parse().unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(validator.endpoint().as_str(), "http://auth:4005/validate");
    }
}
