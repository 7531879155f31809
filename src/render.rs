//! HTML markup for the card grid and the movie modal.
use crate::catalog::{MovieCatalog, ProviderOffer};
use crate::tmdb::MovieId;
use crate::view::{
    card_view, categories, detail_view, group_providers, provider_logo, CardView, DetailView,
    ProviderLogo, ProviderSection,
};
use chrono::NaiveDate;

const CARD_TEXT_WORDS: usize = 15;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Keeps the first `max_words` space-separated words, appending `...` when
/// anything was cut.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    if max_words == 0 {
        return text.to_string();
    }
    let words: Vec<&str> = text.split(' ').collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    format!("{}...", words[..max_words].join(" "))
}

/// `2024-05-01` -> `01 / 05 / 2024`. Anything that is not a date is returned
/// as is.
pub fn display_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%d / %m / %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn release_year(raw: &str) -> &str {
    raw.split('-').next().unwrap_or(raw)
}

pub fn render_card(card: &CardView) -> String {
    let title = escape_html(&card.title);
    let anchor = urlencoding::encode(&card.title);
    let image = card
        .image
        .as_deref()
        .map(|src| {
            format!(
                r#"<img src="{}" class="card-img-top movie-img" alt="{title}" loading="lazy">"#,
                escape_html(src)
            )
        })
        .unwrap_or_default();
    format!(
        r##"<div class="col mb-5">
    <div class="card shadow movie-card-wrapper h-100" data-id="{id}">
        <a href="#{anchor}" class="movie-img-link" data-movie-id="{id}">
            <figure>{image}</figure>
        </a>
        <div class="card-body movie-content">
            <a href="#{anchor}" class="movie-img-link text-bg-light" data-movie-id="{id}">
                <h5 class="card-title movie-title">{title}</h5>
            </a>
            <p class="card-text movie-text">{content}</p>
            <p class="card-text text-secondary movie-date"><span>Release date:</span> {date}</p>
        </div>
    </div>
</div>
"##,
        id = card.id,
        content = escape_html(&truncate_words(&card.content, CARD_TEXT_WORDS)),
        date = escape_html(&display_date(&card.date)),
    )
}

pub fn render_cards(cards: &[CardView]) -> String {
    cards.iter().map(render_card).collect()
}

fn render_logos(logos: &[ProviderLogo]) -> String {
    logos
        .iter()
        .filter_map(|p| {
            p.logo.as_deref().map(|src| {
                format!(
                    r#"<img src="{}" class="movie-modal__img-provider rounded" alt="{}" loading="lazy">"#,
                    escape_html(src),
                    escape_html(&p.provider_name)
                )
            })
        })
        .collect()
}

pub fn render_providers(section: &ProviderSection) -> String {
    match section {
        ProviderSection::Unavailable(message) => format!("<p>{}</p>", escape_html(message)),
        ProviderSection::Groups(groups) => groups
            .iter()
            .map(|g| {
                let class = g.label.trim_end_matches(':').to_lowercase().replace(' ', "-");
                format!(
                    r#"<div class="{class}-wrapper logo-provider-content col-12 col-md-4 col-lg-3 mb-4"><h3>{}</h3><div class="logo-providers-content">{}</div></div>"#,
                    escape_html(g.label),
                    render_logos(&g.providers)
                )
            })
            .collect(),
    }
}

pub fn render_modal(detail: &DetailView, offer: Option<&ProviderOffer>) -> String {
    let title = escape_html(detail.title.as_deref().unwrap_or_default());
    let raw_date = detail.date.as_deref().unwrap_or_default();
    let background = detail
        .background_img
        .as_deref()
        .map(|src| format!(r#" style="background: url({}) no-repeat top center;""#, escape_html(src)))
        .unwrap_or_default();
    let poster = detail
        .image
        .as_deref()
        .map(|src| {
            format!(
                r#"<img src="{}" class="card-img-top movie-modal__img rounded" alt="{title}" loading="lazy">"#,
                escape_html(src)
            )
        })
        .unwrap_or_default();
    let duration = detail
        .duration()
        .filter(|d| !d.is_empty())
        .map(|d| format!(r#"<span class="movie-modal__duration facts">{d}</span>"#))
        .unwrap_or_default();
    let rating = detail
        .rating()
        .map(|r| {
            format!(
                r#"<div class="movie-modal-reviews-stars" style="--rating: {r};" aria-label="Rating of this movie is {r} out of 5."><span class="review-count">({r})</span></div>"#
            )
        })
        .unwrap_or_default();
    let providers = render_providers(&group_providers(offer, provider_logo));

    format!(
        r#"<div class="modal-content movie-modal-content"{background}>
    <div class="movie-modal-content__overlay">
        <figure class="m-0">{poster}</figure>
        <div class="movie-modal-header">
            <h2 class="movie-modal__title">{title} <span class="movie-modal__year">({year})</span></h2>
            <div class="movie-modal__facts">
                <span class="movie-modal__cert">{cert}</span>
                <span class="movie-modal__date facts">{date}</span>
                <span class="movie-modal__categories facts">{categories}</span>
                {duration}
            </div>
            <div class="movie-modal-reviews-wrapper">{rating}</div>
        </div>
        <div class="movie-modal-body">
            <h2 class="movie-modal__title">Overview</h2>
            <p>{tagline}</p>
            <p class="movie-modal__text">{content}</p>
        </div>
        <div class="movie-modal-footer">
            <h2 class="movie-modal__title">Where To Watch</h2>
            <div class="provider-logo-container">{providers}</div>
        </div>
    </div>
</div>
"#,
        year = escape_html(release_year(raw_date)),
        cert = escape_html(&detail.certification),
        date = escape_html(&display_date(raw_date)),
        categories = escape_html(&categories(detail).join(", ")),
        tagline = escape_html(detail.tagline.as_deref().unwrap_or_default()),
        content = escape_html(detail.content.as_deref().unwrap_or_default()),
    )
}

/// Modal for one movie, `None` when its detail record never arrived.
pub fn render_movie_modal(catalog: &MovieCatalog, id: MovieId) -> Option<String> {
    let detail = detail_view(catalog.detail(id)?, &catalog.certifications);
    Some(render_modal(&detail, catalog.providers(id)))
}

pub fn render_page(catalog: &MovieCatalog) -> String {
    let cards: Vec<CardView> = catalog.movies.iter().map(card_view).collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Movie Finder</title>
</head>
<body>
    <main class="movies-main-container container">
        <div class="row">
{}        </div>
    </main>
    <div class="movie-modal-wrapper"><div class="movie-modal-container"></div></div>
</body>
</html>
"#,
        render_cards(&cards)
    )
}
