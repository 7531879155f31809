use crate::catalog::{ProviderOffer, NOT_RATED};
use crate::tmdb::{CatalogEntry, Genre, MovieDetail, MovieId, ProviderRef};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const POSTER_SIZE: &str = "w500";
const BACKDROP_SIZE: &str = "w780";
const LOGO_SIZE: &str = "w500";

pub const UNAVAILABLE_MESSAGE: &str =
    "This movie is currently not available on any streaming platform.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: MovieId,
    pub image: Option<String>,
    pub title: String,
    pub content: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreView {
    pub id: i32,
    pub category: String,
}

/// Modal view of one movie. Optional fields are passed through from TMDB
/// untouched; the renderer decides what to do when they are missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    pub id: MovieId,
    pub background_img: Option<String>,
    pub image: Option<String>,
    pub certification: String,
    pub content: Option<String>,
    pub date: Option<String>,
    pub genres: Vec<GenreView>,
    pub release_status: Option<String>,
    pub reviews: Option<f64>,
    pub movie_time: Option<u32>,
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub vote: Option<f64>,
}

impl DetailView {
    pub fn rating(&self) -> Option<String> {
        self.reviews.and_then(|r| format_rating(&Value::from(r)))
    }

    pub fn duration(&self) -> Option<String> {
        self.movie_time
            .and_then(|m| format_runtime(&Value::from(m)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderLogo {
    pub logo: Option<String>,
    pub id: i32,
    pub provider_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderGroup {
    pub label: &'static str,
    pub providers: Vec<ProviderLogo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSection {
    Groups(Vec<ProviderGroup>),
    Unavailable(&'static str),
}

fn image_url(size: &str, path: Option<&str>) -> Option<String> {
    path.map(|p| format!("{IMAGE_BASE}/{size}{p}"))
}

pub fn card_view(movie: &CatalogEntry) -> CardView {
    CardView {
        id: movie.id,
        image: image_url(POSTER_SIZE, movie.poster_path.as_deref()),
        title: text_or(movie.title.as_deref(), "Title"),
        content: text_or(movie.overview.as_deref(), "Text Content"),
        date: text_or(movie.release_date.as_deref(), "Release Date"),
    }
}

fn text_or(value: Option<&str>, placeholder: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(placeholder)
        .to_string()
}

pub fn detail_view(movie: &MovieDetail, certifications: &HashMap<MovieId, String>) -> DetailView {
    DetailView {
        id: movie.id,
        background_img: image_url(BACKDROP_SIZE, movie.backdrop_path.as_deref()),
        image: image_url(POSTER_SIZE, movie.poster_path.as_deref()),
        certification: certifications
            .get(&movie.id)
            .filter(|c| !c.is_empty())
            .cloned()
            .unwrap_or_else(|| NOT_RATED.to_string()),
        content: movie.overview.clone(),
        date: movie.release_date.clone(),
        genres: genre_list(movie.genres.as_deref()),
        release_status: movie.status.clone(),
        reviews: movie.vote_average,
        movie_time: movie.runtime,
        title: movie.title.clone(),
        tagline: movie.tagline.clone(),
        vote: movie.vote_average,
    }
}

pub fn genre_list(genres: Option<&[Genre]>) -> Vec<GenreView> {
    genres
        .unwrap_or_default()
        .iter()
        .map(|g| GenreView {
            id: g.id,
            category: g.name.clone(),
        })
        .collect()
}

pub fn provider_logo(provider: &ProviderRef) -> ProviderLogo {
    ProviderLogo {
        logo: image_url(LOGO_SIZE, provider.logo_path.as_deref()),
        id: provider.provider_id,
        provider_name: provider.provider_name.clone(),
    }
}

pub fn categories(detail: &DetailView) -> Vec<String> {
    detail.genres.iter().map(|g| g.category.clone()).collect()
}

/// Converts a 0-10 vote average to a 0-5 score with one decimal. Values of 5
/// or below are assumed to be on the 0-5 scale already. Ties round half up
/// (`8.5` -> `4.3`), not to even.
fn rating_out_of_five(score: f64) -> String {
    let scaled = if score > 5.0 { score / 2.0 } else { score };
    let rounded = (scaled * 10.0).round() / 10.0;
    format!("{rounded:.1}")
}

pub fn format_rating(value: &Value) -> Option<String> {
    as_number(value).map(rating_out_of_five)
}

fn runtime_label(minutes: u64) -> String {
    if minutes == 0 {
        return String::new();
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// `105` -> `1h 45m`, `0` -> `""`. Negative values count as not numeric and
/// fractional minutes are floored.
pub fn format_runtime(value: &Value) -> Option<String> {
    let minutes = as_number(value).filter(|m| *m >= 0.0)?;
    Some(runtime_label(minutes.floor() as u64))
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

pub fn group_providers<F>(offer: Option<&ProviderOffer>, to_logo: F) -> ProviderSection
where
    F: Fn(&ProviderRef) -> ProviderLogo,
{
    let Some(offer) = offer else {
        return ProviderSection::Unavailable(UNAVAILABLE_MESSAGE);
    };
    let groups: Vec<ProviderGroup> = [
        ("Rent:", &offer.rent),
        ("Buy:", &offer.buy),
        ("Watch in:", &offer.flatrate),
    ]
    .into_iter()
    .filter(|(_, list)| !list.is_empty())
    .map(|(label, list)| ProviderGroup {
        label,
        providers: list.iter().map(&to_logo).collect(),
    })
    .collect();

    if groups.is_empty() {
        ProviderSection::Unavailable(UNAVAILABLE_MESSAGE)
    } else {
        ProviderSection::Groups(groups)
    }
}
