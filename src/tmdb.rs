use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use tracing::{debug, warn};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";

pub type MovieId = i32;

/// Outcome of a single upstream call. Failures never escape the client; they
/// arrive here as `Status::Error` with an empty payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub status: Status,
    pub data: T,
    pub code: u16,
}

impl<T: Default> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: Status::Ok,
            data,
            code: 200,
        }
    }

    pub fn error() -> Self {
        Self {
            status: Status::Error,
            data: T::default(),
            code: 500,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn discover_movies(&self) -> Envelope<Vec<CatalogEntry>>;
    async fn movie_detail(&self, id: MovieId) -> Envelope<Option<MovieDetail>>;
    async fn release_dates(&self, id: MovieId) -> Envelope<Vec<ReleaseRegion>>;
    async fn watch_providers(&self, id: MovieId) -> Envelope<HashMap<String, ProviderBuckets>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let user_agent = format!("moviefinder/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let api_key = required_key(env::var("TMDB_API_KEY").ok())?;
        let base_url = env::var("TMDB_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| TMDB_BASE.to_string());
        Self::new(api_key, base_url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "TMDB request");
        let res = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {} {}", path, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

fn required_key(raw: Option<String>) -> Result<String> {
    raw.map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .context("Missing required environment variable: TMDB_API_KEY")
}

fn settle<T: Default>(endpoint: &str, result: Result<T>) -> Envelope<T> {
    match result {
        Ok(data) => Envelope::ok(data),
        Err(e) => {
            warn!("TMDB {} request failed: {:#}", endpoint, e);
            Envelope::error()
        }
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn discover_movies(&self) -> Envelope<Vec<CatalogEntry>> {
        let res = self
            .get_json::<ListResults<CatalogEntry>>("/discover/movie")
            .await
            .map(|r| r.results);
        settle("discover", res)
    }

    async fn movie_detail(&self, id: MovieId) -> Envelope<Option<MovieDetail>> {
        let res = self
            .get_json::<MovieDetail>(&format!("/movie/{id}"))
            .await
            .map(Some);
        settle("movie detail", res)
    }

    async fn release_dates(&self, id: MovieId) -> Envelope<Vec<ReleaseRegion>> {
        let res = self
            .get_json::<ListResults<ReleaseRegion>>(&format!("/movie/{id}/release_dates"))
            .await
            .map(|r| r.results);
        settle("release dates", res)
    }

    async fn watch_providers(&self, id: MovieId) -> Envelope<HashMap<String, ProviderBuckets>> {
        let res = self
            .get_json::<Results<HashMap<String, ProviderBuckets>>>(&format!(
                "/movie/{id}/watch/providers"
            ))
            .await
            .map(|r| r.results);
        settle("watch providers", res)
    }
}

#[derive(Debug, Deserialize)]
struct Results<T> {
    #[serde(default)]
    results: T,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ListResults<T> {
    #[serde(default, deserialize_with = "lenient_list")]
    results: Vec<T>,
}

/// Decodes each array element on its own and drops the ones that do not fit,
/// so one malformed item never costs the rest of the list. `null` reads as
/// an empty list.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(keep_valid(raw.unwrap_or_default()))
}

fn lenient_opt_list<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(raw.map(keep_valid))
}

fn keep_valid<T: DeserializeOwned>(raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping malformed TMDB list item: {}", e);
                None
            }
        })
        .collect()
}

/// Entries without an `id` are dropped by the surrounding list decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: MovieId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: MovieId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_list")]
    pub genres: Option<Vec<Genre>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReleaseRegion {
    #[serde(default)]
    pub iso_3166_1: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub release_dates: Vec<ReleaseCert>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReleaseCert {
    #[serde(default)]
    pub certification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRef {
    #[serde(default)]
    pub provider_id: i32,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
}

/// Buy/rent/subscription offers for one region. A bucket TMDB leaves out
/// decodes as an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderBuckets {
    #[serde(default, deserialize_with = "lenient_list")]
    pub buy: Vec<ProviderRef>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub rent: Vec<ProviderRef>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub flatrate: Vec<ProviderRef>,
}
