use crate::constants::DEFAULT_CONFIG;
use crate::core::config::ConfigurationBuilder;
use crate::core::directives::Family;
use crate::core::registry::Registry;
use crate::error::SecureHeadersError;
use crate::headers::{CookieConfig, RequestScheme};
use crate::monitoring::stats::HeaderStats;
use crate::security::nonce::NonceGenerator;
use crate::useragent::classify;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderMap, HeaderName, HeaderValue},
    web::{Data, ServiceConfig},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::{rc::Rc, sync::Arc};

/// Request-scoped secure headers state, stored in the request extensions while the
/// request is handled.
pub struct RequestSecureHeaders {
    pub(crate) builder: ConfigurationBuilder,
    pub(crate) registry: Arc<Registry>,
    pub(crate) nonces: Arc<NonceGenerator>,
    pub(crate) family: Family,
    pub(crate) scheme: RequestScheme,
    pub(crate) overrides: usize,
}

impl RequestSecureHeaders {
    #[inline]
    pub fn family(&self) -> Family {
        self.family
    }

    #[inline]
    pub fn scheme(&self) -> RequestScheme {
        self.scheme
    }

    #[inline]
    pub fn configuration(&self) -> &ConfigurationBuilder {
        &self.builder
    }
}

/// Adds the registry's default headers to every response, honouring the overrides
/// handlers made through [`SecureHeadersExt`](crate::middleware::SecureHeadersExt).
#[derive(Clone)]
pub struct SecureHeaders {
    registry: Arc<Registry>,
    nonces: Arc<NonceGenerator>,
    stats: Option<Arc<HeaderStats>>,
}

impl SecureHeaders {
    #[inline]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            nonces: Arc::new(NonceGenerator::default()),
            stats: None,
        }
    }

    #[inline]
    pub fn with_stats(mut self, stats: Arc<HeaderStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    #[inline]
    pub fn with_nonce_length(mut self, length: usize) -> Self {
        self.nonces = Arc::new(NonceGenerator::new(length));
        self
    }

    #[inline]
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    #[inline]
    pub fn stats(&self) -> Option<Arc<HeaderStats>> {
        self.stats.clone()
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecureHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SecureHeadersService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecureHeadersService {
            service: Rc::new(service),
            registry: self.registry.clone(),
            nonces: self.nonces.clone(),
            stats: self.stats.clone(),
        }))
    }
}

pub struct SecureHeadersService<S> {
    service: Rc<S>,
    registry: Arc<Registry>,
    nonces: Arc<NonceGenerator>,
    stats: Option<Arc<HeaderStats>>,
}

impl<S, B> Service<ServiceRequest> for SecureHeadersService<S>
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
        let service = self.service.clone();
        let registry = self.registry.clone();
        let nonces = self.nonces.clone();
        let stats = self.stats.clone();

        Box::pin(async move {
            let family = req
                .headers()
                .get(header::USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map_or(Family::Other, classify);
            let scheme = RequestScheme::from_scheme(req.connection_info().scheme());
            let builder = registry
                .duplicate(DEFAULT_CONFIG)
                .map_err(SecureHeadersError::from)?;

            req.extensions_mut().insert(RequestSecureHeaders {
                builder,
                registry,
                nonces,
                family,
                scheme,
                overrides: 0,
            });

            let mut res = service.call(req).await?;

            let state = res
                .request()
                .extensions_mut()
                .remove::<RequestSecureHeaders>();
            let state = match state {
                Some(state) => state,
                None => return Ok(res),
            };

            let resolved = state.builder.resolve_for(state.family, state.scheme);
            if let Some(stats) = &stats {
                stats.record_request(resolved.rendered());
                for _ in 0..state.overrides {
                    stats.increment_override_count();
                }
            }

            let headers = res.headers_mut();
            for rendered in resolved {
                let name = match HeaderName::from_bytes(rendered.name.as_bytes()) {
                    Ok(name) => name,
                    Err(err) => {
                        log::warn!("Skipping header {}: {}", rendered.name, err);
                        continue;
                    }
                };
                // Headers set by the handler win.
                if headers.contains_key(&name) {
                    continue;
                }
                match HeaderValue::from_str(&rendered.value) {
                    Ok(value) => {
                        headers.insert(name, value);
                    }
                    Err(err) => {
                        log::warn!("Skipping {} with invalid value: {}", rendered.name, err)
                    }
                }
            }

            if let Some(cookies) = state.builder.headers().cookies.as_configured() {
                secure_cookies(headers, cookies, state.scheme == RequestScheme::Https);
            }

            Ok(res)
        })
    }
}

fn secure_cookies(headers: &mut HeaderMap, cookies: &CookieConfig, https: bool) {
    let rewritten: Vec<HeaderValue> = headers
        .get_all(header::SET_COOKIE)
        .map(|value| {
            value
                .to_str()
                .ok()
                .map(|cookie| cookies.apply(cookie, https))
                .and_then(|cookie| HeaderValue::from_str(&cookie).ok())
                .unwrap_or_else(|| value.clone())
        })
        .collect();
    if rewritten.is_empty() {
        return;
    }

    headers.remove(header::SET_COOKIE);
    for value in rewritten {
        headers.append(header::SET_COOKIE, value);
    }
}

#[inline]
pub fn secure_headers(registry: Arc<Registry>) -> SecureHeaders {
    SecureHeaders::new(registry)
}

/// Shares `registry` with handlers as `Data<Registry>`.
pub fn configure_secure_headers(registry: Arc<Registry>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(Data::from(registry));
    }
}
