//! Builds the in-memory movie catalog from the four TMDB resources.
//!
//! Loading happens once: the discover list is fetched, then details,
//! certifications and watch providers are fetched in three concurrent
//! batches, each awaited in full before the next one starts.
use crate::tmdb::{
    CatalogEntry, Envelope, MovieDetail, MovieId, ProviderBuckets, ProviderRef, ReleaseRegion,
    TmdbApi,
};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const REGION: &str = "AU";
pub const NOT_RATED: &str = "NR";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderOffer {
    pub id: MovieId,
    pub buy: Vec<ProviderRef>,
    pub rent: Vec<ProviderRef>,
    pub flatrate: Vec<ProviderRef>,
}

impl ProviderOffer {
    pub fn new(id: MovieId, buckets: ProviderBuckets) -> Self {
        Self {
            id,
            buy: buckets.buy,
            rent: buckets.rent,
            flatrate: buckets.flatrate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty() && self.rent.is_empty() && self.flatrate.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MovieCatalog {
    pub movies: Vec<CatalogEntry>,
    /// Same order as `movies`; `None` where the detail fetch failed.
    pub details: Vec<Option<MovieDetail>>,
    pub certifications: HashMap<MovieId, String>,
    pub providers: Vec<ProviderOffer>,
}

impl MovieCatalog {
    pub async fn load(api: &dyn TmdbApi) -> Self {
        let started = Instant::now();
        let discovered = api.discover_movies().await;
        if !discovered.is_ok() {
            warn!("Discover failed, leaving catalog empty");
            return Self::default();
        }
        let movies = discovered.data;
        if movies.is_empty() {
            info!("Discover returned no movies, leaving catalog empty");
            return Self::default();
        }

        let ids: Vec<MovieId> = movies.iter().map(|m| m.id).collect();
        info!("Discovered {} movies", ids.len());

        let details = fetch_details(api, &ids).await;
        debug!(
            fetched = details.iter().filter(|d| d.is_some()).count(),
            "Detail stage complete"
        );

        let certifications = fetch_certifications(api, &ids).await;
        debug!(count = certifications.len(), "Certification stage complete");

        let providers = fetch_providers(api, &ids).await;
        debug!(count = providers.len(), "Provider stage complete");

        info!(
            "Catalog loaded: {} movies in {:?}",
            movies.len(),
            started.elapsed()
        );
        Self {
            movies,
            details,
            certifications,
            providers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn detail(&self, id: MovieId) -> Option<&MovieDetail> {
        self.details.iter().flatten().find(|d| d.id == id)
    }

    pub fn certification(&self, id: MovieId) -> &str {
        self.certifications
            .get(&id)
            .map(String::as_str)
            .unwrap_or(NOT_RATED)
    }

    pub fn providers(&self, id: MovieId) -> Option<&ProviderOffer> {
        self.providers.iter().find(|p| p.id == id)
    }
}

async fn fetch_details(api: &dyn TmdbApi, ids: &[MovieId]) -> Vec<Option<MovieDetail>> {
    join_all(ids.iter().map(|&id| api.movie_detail(id)))
        .await
        .into_iter()
        .map(|env| env.data)
        .collect()
}

async fn fetch_certifications(api: &dyn TmdbApi, ids: &[MovieId]) -> HashMap<MovieId, String> {
    let results = join_all(ids.iter().map(|&id| async move {
        let env = api.release_dates(id).await;
        (id, region_certification(&env, REGION))
    }))
    .await;
    results.into_iter().collect()
}

async fn fetch_providers(api: &dyn TmdbApi, ids: &[MovieId]) -> Vec<ProviderOffer> {
    join_all(ids.iter().map(|&id| async move {
        let env = api.watch_providers(id).await;
        ProviderOffer::new(id, region_providers(env, REGION))
    }))
    .await
}

/// First non-empty certification of the region's release record, `"NR"` when
/// the call failed or nothing qualifies.
pub fn region_certification(env: &Envelope<Vec<ReleaseRegion>>, region: &str) -> String {
    if !env.is_ok() {
        return NOT_RATED.to_string();
    }
    env.data
        .iter()
        .find(|r| r.iso_3166_1 == region)
        .and_then(|r| {
            r.release_dates
                .iter()
                .filter_map(|rd| rd.certification.as_deref())
                .find(|c| !c.is_empty())
        })
        .map(|c| c.to_string())
        .unwrap_or_else(|| NOT_RATED.to_string())
}

pub fn region_providers(
    env: Envelope<HashMap<String, ProviderBuckets>>,
    region: &str,
) -> ProviderBuckets {
    let mut data = env.data;
    data.remove(region).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmdb::ReleaseCert;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn release(region: &str, certs: &[&str]) -> ReleaseRegion {
        ReleaseRegion {
            iso_3166_1: region.to_string(),
            release_dates: certs
                .iter()
                .map(|c| ReleaseCert {
                    certification: Some(c.to_string()),
                })
                .collect(),
        }
    }

    fn provider(id: i32, name: &str) -> ProviderRef {
        ProviderRef {
            provider_id: id,
            provider_name: name.to_string(),
            logo_path: Some(format!("/{id}.jpg")),
        }
    }

    fn entry(id: MovieId) -> CatalogEntry {
        CatalogEntry {
            id,
            title: Some(format!("Movie {id}")),
            overview: None,
            release_date: None,
            poster_path: None,
        }
    }

    fn detail(id: MovieId) -> MovieDetail {
        MovieDetail {
            id,
            title: Some(format!("Movie {id}")),
            tagline: None,
            overview: None,
            release_date: None,
            backdrop_path: None,
            poster_path: None,
            runtime: Some(90),
            vote_average: Some(6.0),
            status: None,
            genres: None,
        }
    }

    /// Detail for id 2 fails, release dates for id 3 fail, only id 1 has AU
    /// providers. Lower ids respond slower so completion order is reversed.
    struct FakeTmdb {
        movies: Vec<CatalogEntry>,
        discover_fails: bool,
        calls: AtomicUsize,
    }

    impl FakeTmdb {
        fn new(ids: &[MovieId]) -> Self {
            Self {
                movies: ids.iter().copied().map(entry).collect(),
                discover_fails: false,
                calls: AtomicUsize::new(0),
            }
        }

        async fn stagger(&self, id: MovieId) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = 30u64.saturating_sub(id as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    #[async_trait]
    impl TmdbApi for FakeTmdb {
        async fn discover_movies(&self) -> Envelope<Vec<CatalogEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.discover_fails {
                return Envelope::error();
            }
            Envelope::ok(self.movies.clone())
        }

        async fn movie_detail(&self, id: MovieId) -> Envelope<Option<MovieDetail>> {
            self.stagger(id).await;
            if id == 2 {
                return Envelope::error();
            }
            Envelope::ok(Some(detail(id)))
        }

        async fn release_dates(&self, id: MovieId) -> Envelope<Vec<ReleaseRegion>> {
            self.stagger(id).await;
            match id {
                1 => Envelope::ok(vec![release("US", &["PG-13"]), release("AU", &["", "M"])]),
                2 => Envelope::ok(vec![release("US", &["R"])]),
                _ => Envelope::error(),
            }
        }

        async fn watch_providers(
            &self,
            id: MovieId,
        ) -> Envelope<HashMap<String, ProviderBuckets>> {
            self.stagger(id).await;
            if id != 1 {
                return Envelope::ok(HashMap::new());
            }
            let buckets = ProviderBuckets {
                buy: vec![provider(2, "Apple TV")],
                rent: vec![],
                flatrate: vec![provider(8, "Netflix")],
            };
            Envelope::ok(HashMap::from([(REGION.to_string(), buckets)]))
        }
    }

    #[tokio::test]
    async fn load_joins_every_stage_in_catalog_order() {
        let api = FakeTmdb::new(&[1, 2, 3]);
        let catalog = MovieCatalog::load(&api).await;

        assert_eq!(catalog.movies.len(), 3);
        let detail_ids: Vec<Option<MovieId>> =
            catalog.details.iter().map(|d| d.as_ref().map(|d| d.id)).collect();
        assert_eq!(detail_ids, vec![Some(1), None, Some(3)]);

        let provider_ids: Vec<MovieId> = catalog.providers.iter().map(|p| p.id).collect();
        assert_eq!(provider_ids, vec![1, 2, 3]);
        // 1 discover + 3 stages x 3 movies
        assert_eq!(api.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn every_movie_gets_a_certification() {
        let catalog = MovieCatalog::load(&FakeTmdb::new(&[1, 2, 3])).await;
        assert_eq!(catalog.certification(1), "M");
        assert_eq!(catalog.certification(2), NOT_RATED);
        assert_eq!(catalog.certification(3), NOT_RATED);
        for movie in &catalog.movies {
            let cert = catalog.certifications.get(&movie.id).unwrap();
            assert!(!cert.is_empty());
        }
    }

    #[tokio::test]
    async fn missing_region_providers_default_to_empty_buckets() {
        let catalog = MovieCatalog::load(&FakeTmdb::new(&[1, 2])).await;
        let first = catalog.providers(1).unwrap();
        assert_eq!(first.buy.len(), 1);
        assert!(first.rent.is_empty());
        let second = catalog.providers(2).unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn empty_discover_short_circuits() {
        let api = FakeTmdb::new(&[]);
        let catalog = MovieCatalog::load(&api).await;
        assert!(catalog.is_empty());
        assert!(catalog.details.is_empty());
        assert!(catalog.certifications.is_empty());
        assert!(catalog.providers.is_empty());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_discover_leaves_catalog_empty() {
        let api = FakeTmdb {
            discover_fails: true,
            ..FakeTmdb::new(&[1, 2, 3])
        };
        let catalog = MovieCatalog::load(&api).await;
        assert!(catalog.is_empty());
        assert!(catalog.details.is_empty());
        assert!(catalog.certifications.is_empty());
        assert!(catalog.providers.is_empty());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn certification_skips_blank_entries_and_other_regions() {
        let env = Envelope::ok(vec![release("US", &["R"]), release("AU", &["", "MA15+"])]);
        assert_eq!(region_certification(&env, "AU"), "MA15+");
        let blank = Envelope::ok(vec![release("AU", &["", ""])]);
        assert_eq!(region_certification(&blank, "AU"), NOT_RATED);
    }

    #[test]
    fn certification_of_error_envelope_is_not_rated() {
        let env: Envelope<Vec<ReleaseRegion>> = Envelope::error();
        assert_eq!(region_certification(&env, "AU"), NOT_RATED);
    }

    #[test]
    fn lookup_of_unknown_movie_falls_back() {
        let catalog = MovieCatalog::default();
        assert_eq!(catalog.certification(99), NOT_RATED);
        assert!(catalog.detail(99).is_none());
        assert!(catalog.providers(99).is_none());
    }
}
