//! Fetch the four TMDB resources for one movie and print the formatted views.
//! Usage:
//!   cargo run --bin tmdb_props -- <tmdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use moviefinder::catalog::{region_certification, region_providers, ProviderOffer, REGION};
use moviefinder::tmdb::{MovieId, TmdbApi, TmdbClient};
use moviefinder::view::{detail_view, group_providers, provider_logo};
use serde_json::json;
use std::collections::HashMap;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let id: MovieId = env::args()
        .nth(1)
        .context("usage: tmdb_props <tmdb_id>")?
        .parse()
        .context("tmdb_id must be a number")?;

    let client = TmdbClient::from_env()?;
    let (detail, releases, providers) = tokio::join!(
        client.movie_detail(id),
        client.release_dates(id),
        client.watch_providers(id),
    );

    let certification = region_certification(&releases, REGION);
    let offer = ProviderOffer::new(id, region_providers(providers, REGION));
    let certs = HashMap::from([(id, certification.clone())]);
    let view = detail.data.as_ref().map(|d| detail_view(d, &certs));

    let out = json!({
        "detail_status": detail.status,
        "certification": certification,
        "detail": view,
        "rating": view.as_ref().and_then(|v| v.rating()),
        "duration": view.as_ref().and_then(|v| v.duration()),
        "providers": group_providers(Some(&offer), provider_logo),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
