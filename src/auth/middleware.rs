//! Gate for the protected route prefix.
//!
//! [`RequireAuth`] verifies the session token on every request it wraps and
//! stores an [`AuthenticatedUser`] in the request extensions. Handlers behind
//! it take `AuthenticatedUser` as an extractor argument.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, ResponseError};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::token::TokenCodec;
use crate::error::{AppError, AuthError};

/// Identity of the caller, valid for the current request only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .copied()
                .ok_or_else(|| AuthError::MissingToken.into()),
        )
    }
}

/// Pulls the token out of the `Authorization` header.
///
/// Accepts `Bearer <token>` with any casing of the scheme, or a bare token.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?
        .trim();

    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => return Err(AuthError::InvalidToken),
        None if value.eq_ignore_ascii_case("bearer") => "",
        None => value,
    };

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

pub struct RequireAuth {
    tokens: Arc<TokenCodec>,
}

impl RequireAuth {
    pub fn new(tokens: Arc<TokenCodec>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthMiddleware {
            service,
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct RequireAuthMiddleware<S> {
    service: S,
    tokens: Arc<TokenCodec>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verified = extract_token(req.headers()).and_then(|token| self.tokens.verify(token));

        match verified {
            Ok(user_id) => {
                debug!("Authenticated user {} for {}", user_id, req.path());
                req.extensions_mut().insert(AuthenticatedUser { user_id });
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(e) => {
                warn!("Rejected request to {}: {:?}", req.path(), e);
                let response = AppError::from(e).error_response();
                Box::pin(ready(Ok(req.into_response(response).map_into_right_body())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[actix_web::test]
    async fn test_identity_extractor_reads_extensions() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthenticatedUser { user_id: 3 });

        let user = AuthenticatedUser::extract(&req).await.unwrap();
        assert_eq!(user, AuthenticatedUser { user_id: 3 });
    }

    #[actix_web::test]
    async fn test_identity_extractor_without_gate_is_unauthorized() {
        let req = actix_web::test::TestRequest::default().to_http_request();

        let err = AuthenticatedUser::extract(&req).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::MissingToken)));
        assert_eq!(err.status_code(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(extract_token(&headers("bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_extract_bare_token() {
        assert_eq!(extract_token(&headers("abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_extract_rejects_missing_or_malformed() {
        assert_eq!(extract_token(&HeaderMap::new()), Err(AuthError::MissingToken));
        assert_eq!(extract_token(&headers("Bearer ")), Err(AuthError::MissingToken));
        assert_eq!(extract_token(&headers("Basic dXNlcjpwYXNz")), Err(AuthError::InvalidToken));
    }
}
