//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Build the Axum app around the ordered route table
//! - Wire up middleware (tracing, request IDs)
//! - Enforce per-route body-size limits before bodies are buffered
//! - Authorize requests against each binding's access policy
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - One dispatch handler scans the route table; first match wins, the
//!   catch-all guarantees a match
//! - Identities resolve lazily, at most once per request
//! - Internal failures are logged server-side; clients get generic messages

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{DefaultBodyLimit, FromRequestParts, Request, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::http::downloads::{forward_snapshot, stream_file, ForwardClient};
use crate::http::middleware::{auth, cors};
use crate::http::{api, assets, channel, uploads};
use crate::observability::metrics;
use crate::routing::{RouteHandler, RouteTable};
use crate::ui::composer;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
    pub table: Arc<RouteTable>,
    pub api: Router,
    pub client: ForwardClient,
}

/// HTTP server for the control panel.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over the given context and route table.
    pub fn new(ctx: Arc<AppContext>, table: Arc<RouteTable>) -> Self {
        let client: ForwardClient =
            Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let state = AppState {
            api: api::api_app(ctx.clone()),
            ctx,
            table,
            client,
        };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router: every path funnels through the table dispatch.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .with_state(state)
            // Body limits come from the route table, not the extractor default.
            .layer(DefaultBodyLimit::disable())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled router; integration tests drive it directly.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main dispatch handler: scan the route table and execute the matched
/// binding.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(matched) = state.table.match_request(&method, &path) else {
        // The catch-all makes this unreachable for any path, but a method
        // mismatch on every binding still ends up here.
        metrics::record_request(method.as_str(), 404, "none", start);
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };
    let binding = matched.binding;
    let captures = matched.captures;

    // Reject oversized bodies before anything buffers them.
    let max_body = state.table.max_body_size(&method, &path);
    if let Some(declared) = content_length(&request) {
        if declared > max_body as u64 {
            metrics::record_request(method.as_str(), 413, &binding.name, start);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    }

    // Identity resolves lazily: only bindings whose policy needs one pay
    // for the lookup.
    if binding.access.needs_identity() {
        let identity = auth::resolve_identity(&state.ctx, request.headers());
        if let Err(rejection) = auth::authorize(binding.access, &identity) {
            tracing::debug!(route = %binding.name, "Request rejected by access policy");
            metrics::record_request(method.as_str(), rejection.status().as_u16(), &binding.name, start);
            return rejection;
        }
    }

    let request_headers = request.headers().clone();

    let mut response = match &binding.handler {
        RouteHandler::Index => render_index(&state.ctx, &request),
        RouteHandler::Robots => assets::robots(),
        RouteHandler::Channel => {
            let (mut parts, _body) = request.into_parts();
            match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
                Ok(ws) => channel::upgrade(ws, state.ctx.clone()),
                Err(rejection) => rejection.into_response(),
            }
        }
        RouteHandler::PluginAsset => {
            let (name, rel_path) = (&captures[0], &captures[1]);
            assets::serve_plugin_asset(&state.ctx, name, rel_path).await
        }
        RouteHandler::FileDownload {
            root,
            as_attachment,
        } => stream_file(root, &captures[0], *as_attachment).await,
        RouteHandler::Snapshot { url } => forward_snapshot(&state.client, url.as_deref()).await,
        RouteHandler::PluginRoutes { name, router } => {
            forward_to_plugin(name, router.clone(), request, max_body).await
        }
        RouteHandler::Fallback => {
            uploads::intercept_or_forward(
                &state.ctx.config.server.uploads,
                state.api.clone(),
                request,
                max_body,
            )
            .await
        }
    };

    if binding.cors {
        cors::apply(&mut response, &request_headers);
    }

    metrics::record_request(
        method.as_str(),
        response.status().as_u16(),
        &binding.name,
        start,
    );
    response
}

fn content_length(request: &Request<Body>) -> Option<u64> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Render the composed root page.
fn render_index(ctx: &AppContext, request: &Request<Body>) -> Response {
    let explicit_locale = query_param(request.uri(), "l10n");
    let accept_language = request
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());
    let locale = ctx
        .locales
        .negotiate(explicit_locale.as_deref(), accept_language);

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok());

    let context = composer::compose(ctx, host, &locale);
    match ctx.templates.render_index(&context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Root page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Forward a request into an extension router, stripping the mount prefix.
async fn forward_to_plugin(
    name: &str,
    router: Router,
    request: Request<Body>,
    max_body: usize,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let prefix = format!("/plugin/{name}");
    let stripped = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .strip_prefix(&prefix)
        .filter(|rest| !rest.is_empty())
        .unwrap_or("/")
        .to_string();

    match stripped.parse::<Uri>() {
        Ok(uri) => parts.uri = uri,
        Err(_) => return (StatusCode::BAD_REQUEST, "Bad request").into_response(),
    }

    let request = Request::from_parts(parts, uploads::limit_body(body, max_body));
    match router.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}
