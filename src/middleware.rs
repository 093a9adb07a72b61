use std::any::Any;
use std::future::{Ready, ready};
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use actix_cors::Cors;
use actix_web::{
    Error,
    dev::{self, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    http::header::{CONTENT_ENCODING, HeaderValue},
};
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;

use crate::models::config::{CorsConfig, GzipConfig};

fn allows_any(values: &[String]) -> bool {
    values.is_empty() || values.iter().any(|v| v == "*")
}

/// Cross-origin policy built from [`CorsConfig`]. Empty lists, or lists
/// containing `*`, allow anything.
pub fn cors(config: &CorsConfig) -> Cors {
    let mut cors = Cors::default();

    cors = if allows_any(&config.allow_origins) {
        cors.allow_any_origin()
    } else {
        config
            .allow_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    };

    cors = if allows_any(&config.allow_methods) {
        cors.allow_any_method()
    } else {
        cors.allowed_methods(config.allow_methods.iter().map(String::as_str))
    };

    cors = if allows_any(&config.allow_headers) {
        cors.allow_any_header()
    } else {
        cors.allowed_headers(config.allow_headers.iter().map(String::as_str))
    };

    if config.allow_credentials {
        cors = cors.supports_credentials();
    }

    cors.max_age(config.max_age_secs())
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn recovered(path: &str, panic: &(dyn Any + Send)) -> Error {
    log::error!("Recovered from panic in {}: {}", path, panic_message(panic));
    ErrorInternalServerError("internal server error")
}

/// Answers `500 Internal Server Error` when a handler panics instead of
/// dropping the connection.
///
/// No `HttpRequest` clone may be held across the inner call: routing needs
/// exclusive access to the request.
pub struct RecoverPanic;

impl<S, B> Transform<S, ServiceRequest> for RecoverPanic
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RecoverPanicMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RecoverPanicMiddleware { service }))
    }
}

pub struct RecoverPanicMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RecoverPanicMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_owned();
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| self.service.call(req))) {
            Ok(fut) => fut,
            Err(panic) => {
                let err = recovered(&path, panic.as_ref());
                return Box::pin(ready(Err(err)));
            }
        };

        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(res) => res,
                Err(panic) => Err(recovered(&path, panic.as_ref())),
            }
        })
    }
}

/// Marks responses for excluded paths as `Content-Encoding: identity` so an
/// outer `Compress` leaves them untouched. Must be registered before
/// `Compress`.
pub struct GzipExclusion {
    gzip: Rc<GzipConfig>,
}

impl GzipExclusion {
    pub fn new(gzip: GzipConfig) -> Self {
        Self { gzip: Rc::new(gzip) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for GzipExclusion
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = GzipExclusionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(GzipExclusionMiddleware {
            service,
            gzip: Rc::clone(&self.gzip),
        }))
    }
}

pub struct GzipExclusionMiddleware<S> {
    service: S,
    gzip: Rc<GzipConfig>,
}

impl<S, B> Service<ServiceRequest> for GzipExclusionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let excluded = self.gzip.is_excluded(req.path());
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            if excluded {
                res.headers_mut()
                    .insert(CONTENT_ENCODING, HeaderValue::from_static("identity"));
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_and_empty_lists_allow_any() {
        assert!(allows_any(&[]));
        assert!(allows_any(&["https://a.example".to_string(), "*".to_string()]));
        assert!(!allows_any(&["https://a.example".to_string()]));
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        let literal: Box<dyn Any + Send> = Box::new("literal");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(literal.as_ref()), "literal");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
