//! HTTP asset resolver
//!
//! `GET /asset-detail?id=<assetId>` and `POST /asset-detail` (id in the
//! query, a JSON body or a form body) answer with a read-only summary of
//! the asset. The resolver reads on behalf of a single configured tenant:
//!
//! | Outcome                              | Status |
//! |--------------------------------------|--------|
//! | No id                                | 400    |
//! | Malformed, unknown or foreign id     | 404    |
//! | Store failure                        | 500    |

use crate::render::render_asset_page;
use custodian_kernel::{ConfigError, InventoryConfig, InventoryHandle};
use custodian_model::{
    AssetId, InventoryError, RequesterContext, TenantId, UserId, ASSET_DETAIL_PATH,
};
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::{header, HeaderValue, StatusCode};
use warp::hyper::body::Bytes;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

/// Largest request body accepted on POST
pub const BODY_LIMIT: u64 = 16 * 1024;

/// Service account name the resolver reads as
const RESOLVER_USER: &str = "resolver";

/// Resolver errors
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("invalid cache-control value {0:?}")]
    CacheControl(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind resolver: {0}")]
    Bind(String),
}

/// Shared state behind the routes
#[derive(Debug)]
pub struct ResolverState {
    handle: Arc<InventoryHandle>,
    requester: RequesterContext,
    cache_control: HeaderValue,
}

impl ResolverState {
    /// Resolver serving `tenant` from `handle`
    ///
    /// # Errors
    /// [`ResolverError::CacheControl`] if the value is not a valid header.
    pub fn new(
        handle: Arc<InventoryHandle>,
        tenant: TenantId,
        cache_control: &str,
    ) -> Result<Self, ResolverError> {
        let cache_control = HeaderValue::from_str(cache_control)
            .map_err(|_| ResolverError::CacheControl(cache_control.to_string()))?;
        Ok(Self {
            handle,
            requester: RequesterContext::user(tenant, UserId::new(RESOLVER_USER), RESOLVER_USER),
            cache_control,
        })
    }

    /// Wire store, codec and resolver settings from `config`
    ///
    /// # Errors
    /// Configuration or store failures.
    pub async fn from_config(config: &InventoryConfig) -> Result<Self, ResolverError> {
        let handle = config.build_handle().await?;
        Self::new(
            Arc::new(handle),
            config.resolver_tenant(),
            &config.resolver.cache_control,
        )
    }

    /// Inventory handle the resolver reads through
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &Arc<InventoryHandle> {
        &self.handle
    }

    /// Answer a lookup for `id`
    pub async fn respond(&self, id: Option<&str>) -> Response {
        let Some(raw) = id.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return plain(StatusCode::BAD_REQUEST, "Missing id query param");
        };
        let Ok(id) = raw.parse::<AssetId>() else {
            tracing::debug!("Resolver got malformed id {raw:?}");
            return plain(StatusCode::NOT_FOUND, "Asset not found");
        };

        match self.handle.get_asset(&self.requester, id).await {
            Ok(asset) => {
                let page = warp::reply::html(render_asset_page(&asset));
                let mut response = page.into_response();
                response
                    .headers_mut()
                    .insert(header::CACHE_CONTROL, self.cache_control.clone());
                response
            }
            Err(InventoryError::NotFound(_) | InventoryError::AccessDenied(_)) => {
                plain(StatusCode::NOT_FOUND, "Asset not found")
            }
            Err(e) => {
                tracing::error!("Resolver failed for {id}: {e}");
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

fn plain(status: StatusCode, message: &'static str) -> Response {
    warp::reply::with_status(message, status).into_response()
}

/// Extract `id` from a POST body
///
/// JSON when the content type says so or the body looks like an object,
/// form-encoded otherwise.
fn id_from_body(content_type: Option<&str>, body: &[u8]) -> Option<String> {
    let looks_json = content_type.is_some_and(|ct| ct.contains("json"))
        || body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{');
    if looks_json {
        let value: serde_json::Value = serde_json::from_slice(body).ok()?;
        return match value.get("id")? {
            serde_json::Value::String(id) => Some(id.clone()),
            _ => None,
        };
    }
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
}

fn with_state(
    state: Arc<ResolverState>,
) -> impl Filter<Extract = (Arc<ResolverState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn resolve(id: Option<String>, state: Arc<ResolverState>) -> Result<Response, Infallible> {
    Ok(state.respond(id.as_deref()).await)
}

/// Resolver routes
pub fn routes(
    state: Arc<ResolverState>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let detail = warp::path(ASSET_DETAIL_PATH)
        .and(warp::path::end())
        .and(warp::query::<HashMap<String, String>>());

    let get = detail
        .clone()
        .and(warp::get())
        .map(|mut query: HashMap<String, String>| query.remove("id"));

    let post = detail
        .and(warp::post())
        .and(warp::header::optional::<String>("content-type"))
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::bytes())
        .map(
            |mut query: HashMap<String, String>, content_type: Option<String>, body: Bytes| {
                query
                    .remove("id")
                    .or_else(|| id_from_body(content_type.as_deref(), &body))
            },
        );

    get.or(post)
        .unify()
        .and(with_state(state))
        .and_then(resolve)
}

/// Serve the resolver on `addr` until `shutdown` completes
///
/// # Errors
/// [`ResolverError::Bind`] if the address cannot be bound.
pub async fn serve(
    state: Arc<ResolverState>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ResolverError> {
    let backend = state.handle().backend_name();
    let routes = routes(state).with(warp::trace::request());
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| ResolverError::Bind(e.to_string()))?;
    tracing::info!("Resolver listening on http://{bound}/{ASSET_DETAIL_PATH} ({backend} store)");
    server.await;
    tracing::info!("Resolver stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_id_from_json() {
        assert_eq!(
            id_from_body(Some("application/json"), br#"{"id":"abc"}"#),
            Some("abc".into())
        );
        assert_eq!(id_from_body(None, br#"  {"id":"abc"}"#), Some("abc".into()));
        assert_eq!(id_from_body(Some("application/json"), br#"{"id":7}"#), None);
        assert_eq!(id_from_body(Some("application/json"), b"not json"), None);
    }

    #[test]
    fn body_id_from_form() {
        assert_eq!(
            id_from_body(
                Some("application/x-www-form-urlencoded"),
                b"foo=1&id=a%2Db"
            ),
            Some("a-b".into())
        );
        assert_eq!(id_from_body(None, b""), None);
    }
}
