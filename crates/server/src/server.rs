use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{IdentityProvider, RealtimeHub, custody, events, families, realtime, swap_requests, tasks};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub identity: Arc<dyn IdentityProvider>,
    pub hub: Arc<RealtimeHub>,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Bearer>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = auth_header.token();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let identity = match state.identity.verify(token).await {
        Some(identity) => identity,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub(crate) fn router(state: ServerState) -> Router {
    Router::new()
        .route("/families", post(families::create))
        .route("/families/{family_id}", get(families::get))
        .route(
            "/families/{family_id}/members",
            get(families::list_members).post(families::add_member),
        )
        .route(
            "/families/{family_id}/events",
            get(events::list).post(events::create),
        )
        .route(
            "/events/{id}",
            patch(events::update).delete(events::delete),
        )
        .route(
            "/families/{family_id}/tasks",
            get(tasks::list).post(tasks::create),
        )
        .route("/tasks/{id}", patch(tasks::update).delete(tasks::delete))
        .route(
            "/families/{family_id}/swaps",
            get(swap_requests::list).post(swap_requests::create),
        )
        .route("/swaps/{id}", get(swap_requests::get))
        .route("/swaps/{id}/counter", post(swap_requests::counter))
        .route(
            "/swaps/{id}/counter/accept",
            post(swap_requests::accept_counter),
        )
        .route(
            "/swaps/{id}/counter/reject",
            post(swap_requests::reject_counter),
        )
        .route("/swaps/{id}/respond", post(swap_requests::respond))
        .route("/swaps/{id}/cancel", post(swap_requests::cancel))
        .route(
            "/families/{family_id}/custody-schedule",
            get(custody::get).put(custody::save),
        )
        .route(
            "/families/{family_id}/custody-schedule/respond",
            post(custody::respond),
        )
        .route(
            "/families/{family_id}/custody-schedule/pending",
            delete(custody::cancel_pending),
        )
        .route("/families/{family_id}/stream", get(realtime::stream))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, identity: Arc<dyn IdentityProvider>, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, identity, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    identity: Arc<dyn IdentityProvider>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        identity,
        hub: Arc::new(RealtimeHub::new()),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    identity: Arc<dyn IdentityProvider>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, identity, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
