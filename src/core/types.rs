use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Content filter applied to a catalog query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    All,
    Music,
    Software,
    EBooks,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::All,
        Category::Music,
        Category::Software,
        Category::EBooks,
    ];

    /// Provider `entity` keyword. Empty for [`Category::All`], which sends no filter.
    pub fn entity_keyword(self) -> &'static str {
        match self {
            Category::All => "",
            Category::Music => "musicTrack",
            Category::Software => "software",
            Category::EBooks => "ebook",
        }
    }

    /// Maps the position of a segmented filter control (0..=3) to a category.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Music => "music",
            Category::Software => "software",
            Category::EBooks => "ebooks",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}' (expected all, music, software or ebooks)")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Category::All),
            "music" => Ok(Category::Music),
            "software" => Ok(Category::Software),
            "ebooks" | "ebook" => Ok(Category::EBooks),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// One catalog entry, normalized from the provider's record shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub name: String,
    /// Empty when the provider omits the artist.
    pub artist: String,
    /// Raw provider kind, e.g. `song` or `software`.
    pub kind: String,
    /// Human-readable kind, e.g. `Song` or `App`.
    pub kind_label: String,
    pub image_small: String,
    pub image_large: String,
    pub store_url: String,
    pub price: f64,
    pub currency: String,
    pub genre: String,
}

impl SearchResult {
    /// Secondary line shown under the name in result lists.
    pub fn artist_label(&self) -> String {
        if self.artist.is_empty() {
            "Unknown".to_string()
        } else {
            format!("{} ({})", self.artist, self.kind_label)
        }
    }
}

/// Display name for a provider kind. Unknown kinds are shown verbatim.
pub fn kind_display_name(kind: &str) -> String {
    match kind {
        "album" => "Album",
        "audiobook" => "Audio Book",
        "book" => "Book",
        "ebook" => "E-Book",
        "feature-movie" => "Movie",
        "music-video" => "Music Video",
        "podcast" => "Podcast",
        "software" => "App",
        "song" => "Song",
        "tv-episode" => "TV Episode",
        other => other,
    }
    .to_string()
}

/// Catalog ordering: name ascending ignoring case, then artist.
///
/// Exact-case comparison only decides between entries that are otherwise equal,
/// so the order never depends on the provider's response order.
pub fn compare_results(a: &SearchResult, b: &SearchResult) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.artist.to_lowercase().cmp(&b.artist.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.artist.cmp(&b.artist))
}

pub fn sort_results(results: &mut [SearchResult]) {
    results.sort_by(compare_results);
}

/// Record shape returned by the catalog endpoint.
///
/// `artworkUrl60`, `artworkUrl100` and `currency` are required; every other
/// field may be absent depending on the entity kind.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    #[serde(default)]
    pub wrapper_type: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub track_name: Option<String>,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(rename = "artworkUrl60")]
    pub artwork_url_60: String,
    #[serde(rename = "artworkUrl100")]
    pub artwork_url_100: String,
    #[serde(default)]
    pub track_view_url: Option<String>,
    #[serde(default)]
    pub collection_view_url: Option<String>,
    #[serde(default)]
    pub track_price: Option<f64>,
    #[serde(default)]
    pub collection_price: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    pub currency: String,
    #[serde(default)]
    pub primary_genre_name: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
}

impl From<CatalogRecord> for SearchResult {
    fn from(r: CatalogRecord) -> Self {
        let kind = r.kind.or(r.wrapper_type).unwrap_or_default();
        let genre = r
            .primary_genre_name
            .or_else(|| r.genres.filter(|g| !g.is_empty()).map(|g| g.join(", ")))
            .unwrap_or_default();

        SearchResult {
            name: r.track_name.or(r.collection_name).unwrap_or_default(),
            artist: r.artist_name.unwrap_or_default(),
            kind_label: kind_display_name(&kind),
            kind,
            image_small: r.artwork_url_60,
            image_large: r.artwork_url_100,
            store_url: r
                .track_view_url
                .or(r.collection_view_url)
                .unwrap_or_default(),
            price: r
                .track_price
                .or(r.collection_price)
                .or(r.price)
                .unwrap_or(0.0),
            currency: r.currency,
            genre,
        }
    }
}

/// `{ "results": [ ... ] }` envelope.
#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    pub results: Vec<CatalogRecord>,
}

/// Observable lifecycle of a search session. Exactly one variant is active.
#[derive(Debug, Clone, Default)]
pub enum SearchState {
    #[default]
    NotSearchedYet,
    Loading,
    NoResults,
    Results(Arc<[SearchResult]>),
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Loading)
    }

    /// Sorted results, or an empty slice for every other state.
    pub fn results(&self) -> &[SearchResult] {
        match self {
            SearchState::Results(list) => &list[..],
            _ => &[],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchState::NotSearchedYet => "not_searched_yet",
            SearchState::Loading => "loading",
            SearchState::NoResults => "no_results",
            SearchState::Results(_) => "results",
        }
    }
}
