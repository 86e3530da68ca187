use std::sync::Arc;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::OwnerId, services::IdentityResolver};

/// Resolves a `Bearer` credential and stores the owner in request extensions
///
/// Requests without a usable credential pass through untouched; routes that
/// need an owner reject them through [`AuthUser`].
pub async fn identity_middleware(
    State(resolver): State<Arc<dyn IdentityResolver>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned);

    if let Some(token) = token {
        if let Some(owner) = resolver.resolve(&token).await {
            request.extensions_mut().insert(owner);
        }
    }

    next.run(request).await
}

/// The owner resolved for this request
#[derive(Debug, Clone)]
pub struct AuthUser(pub OwnerId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OwnerId>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthenticated)
    }
}
