use crate::catalog::{MovieCatalog, ProviderOffer};
use crate::render::{render_movie_modal, render_page};
use crate::tmdb::{MovieId, TmdbApi, TmdbClient};
use crate::view::{card_view, detail_view, CardView, DetailView};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::{env, net::SocketAddr, sync::Arc};
use tracing::{error, info, warn};

const DEFAULT_ADDR: &str = "0.0.0.0:3146";

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<MovieCatalog>,
}

/// `details` is index-aligned with `movies`; a movie whose detail fetch
/// failed has a `null` slot.
#[derive(Debug, Serialize)]
pub struct MoviesPayload {
    pub movies: Vec<CardView>,
    pub details: Vec<Option<DetailView>>,
    pub providers: Vec<ProviderOffer>,
}

pub async fn run_server() -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_env()?);
    let catalog = MovieCatalog::load(tmdb.as_ref()).await;
    if catalog.is_empty() {
        warn!("Catalog is empty, serving an empty page");
    }

    let state = AppState {
        catalog: Arc::new(catalog),
    };
    let app = build_router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = bind_addr()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn bind_addr() -> Result<SocketAddr> {
    let raw = env::var("MOVIEFINDER_ADDR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    raw.parse()
        .with_context(|| format!("Invalid MOVIEFINDER_ADDR '{raw}'"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/movies/:id", get(movie_modal))
        .route("/api/movies", get(movies_json))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.catalog))
}

async fn movie_modal(State(state): State<AppState>, Path(id): Path<MovieId>) -> Response {
    match render_movie_modal(&state.catalog, id) {
        Some(html) => Html(html).into_response(),
        None => {
            warn!("No detail record for movie {}", id);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn movies_json(State(state): State<AppState>) -> Json<MoviesPayload> {
    let catalog = &state.catalog;
    Json(MoviesPayload {
        movies: catalog.movies.iter().map(card_view).collect(),
        details: catalog
            .details
            .iter()
            .map(|d| d.as_ref().map(|d| detail_view(d, &catalog.certifications)))
            .collect(),
        providers: catalog.providers.clone(),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
