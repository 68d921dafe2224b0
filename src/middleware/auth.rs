/// Global authentication middleware.
///
/// Intercepts every request before routing. Requests whose path is on
/// the public allow-list pass through untouched; every other request
/// must carry a valid, non-expired bearer token. The middleware only
/// answers "is this a recognized caller at all"; role enforcement
/// stays with the per-route gates in `auth::authorize`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::collections::HashSet;
use std::rc::Rc;

use crate::auth::authenticate;
use crate::configuration::JwtSettings;

/// Paths reachable without a token.
///
/// Built once at startup and never mutated; must be kept in sync with
/// route registration or new public endpoints get silently blocked.
#[derive(Debug, Clone)]
pub struct PublicPaths {
    exact: HashSet<&'static str>,
    prefixes: Vec<&'static str>,
}

impl PublicPaths {
    /// The allow-list for this service: login, signup, refresh, the
    /// liveness probe, and the interactive docs endpoints.
    pub fn standard() -> Self {
        Self {
            exact: HashSet::from([
                "/auth/login",
                "/auth/signup",
                "/auth/refresh",
                "/health_check",
                "/openapi.json",
            ]),
            prefixes: vec!["/docs"],
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.exact.contains(path) || self.prefixes.iter().any(|p| path.starts_with(p))
    }
}

pub struct AuthMiddleware {
    jwt_config: JwtSettings,
    public_paths: Rc<PublicPaths>,
}

impl AuthMiddleware {
    pub fn new(jwt_config: JwtSettings, public_paths: PublicPaths) -> Self {
        Self {
            jwt_config,
            public_paths: Rc::new(public_paths),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
            public_paths: self.public_paths.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
    public_paths: Rc<PublicPaths>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.public_paths.is_public(req.path()) {
            let service = self.service.clone();
            return Box::pin(async move { service.call(req).await });
        }

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        match authenticate(header, &self.jwt_config) {
            Ok(identity) => {
                tracing::debug!(email = %identity.email, role = %identity.role, "caller authenticated");
                req.extensions_mut().insert(identity);
                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(reason) => {
                tracing::warn!(path = %req.path(), error = %reason, "request rejected");
                let response = HttpResponse::Unauthorized().json(serde_json::json!({
                    "message": reason.to_string(),
                }));
                Box::pin(async move {
                    Err(actix_web::error::InternalError::from_response(reason, response).into())
                })
            }
        }
    }
}
