//! Domain models for the album catalog
//!
//! An [`Album`] owns exactly one [`Artist`] and any number of [`Track`]s.
//! Children refer back to their album by [`AlbumId`] value only.
//!
//! Inputs are split from outputs: [`NewAlbum`] creates a full graph,
//! [`AlbumChanges`] updates the album's own fields, [`Album`] is what reads
//! return.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const ARTIST_NAME_MAX: usize = 40;
const BIRTH_DATE_MAX: usize = 40;
const TRACK_TITLE_MAX: usize = 32;
const TRACK_DURATION_MAX: usize = 10;
const FEATURED_ARTIST_MAX: usize = 32;

static ARTIST_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w").expect("static regex"));

// =============================================================================
// ID Types
// =============================================================================

/// Storage-assigned album identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub i64);

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AlbumId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

// =============================================================================
// Album
// =============================================================================

/// Recording type of an album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlbumType {
    Studio,
    Live,
}

impl AlbumType {
    /// Value stored in the `album_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumType::Studio => "STUDIO",
            AlbumType::Live => "LIVE",
        }
    }
}

impl FromStr for AlbumType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDIO" => Ok(AlbumType::Studio),
            "LIVE" => Ok(AlbumType::Live),
            other => Err(format!("Unknown album type '{}'", other)),
        }
    }
}

/// The album's own attributes, shared by create input and read output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumDetails {
    /// EAN-8 or EAN-13, unique across the catalog
    pub ean: String,
    /// 0 to 5 stars
    pub rating: Option<i32>,
    pub album_type: Option<AlbumType>,
    pub title: String,
    pub price: f64,
    /// Fraction between 0 and 1
    pub discount: Option<f64>,
    #[serde(default)]
    pub available: bool,
    /// ISO-8601 date, e.g. `2019-04-19`
    pub release_date: Option<String>,
    pub homepage: Option<String>,
    /// Unique, order-insensitive tags such as `POP`
    #[serde(default)]
    pub genres: Vec<String>,
}

impl AlbumDetails {
    /// Minimal details with every optional attribute unset
    pub fn new(ean: impl Into<String>, title: impl Into<String>, price: f64) -> Self {
        Self {
            ean: ean.into(),
            rating: None,
            album_type: None,
            title: title.into(),
            price,
            discount: None,
            available: false,
            release_date: None,
            homepage: None,
            genres: Vec::new(),
        }
    }

    /// Validate every attribute
    pub fn validate(&self) -> Result<(), String> {
        check_ean(&self.ean)?;
        check_title(&self.title)?;
        check_price(self.price)?;
        if let Some(rating) = self.rating {
            check_rating(rating)?;
        }
        if let Some(discount) = self.discount {
            check_discount(discount)?;
        }
        if let Some(date) = &self.release_date {
            check_release_date(date)?;
        }
        if let Some(homepage) = &self.homepage {
            check_homepage(homepage)?;
        }
        check_genres(&self.genres)
    }
}

/// Album as read from the catalog, with its artist and tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    /// Optimistic concurrency counter, 0 after creation
    pub version: i64,
    #[serde(flatten)]
    pub details: AlbumDetails,
    pub artist: Artist,
    /// Empty in list results; populated when fetched by id
    pub tracks: Vec<Track>,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub updated_at: i64,
}

impl Album {
    /// Merge `changes` onto this album. Artist and tracks are left alone.
    pub fn apply(&mut self, changes: AlbumChanges) {
        let details = &mut self.details;
        details.ean = changes.ean;
        details.title = changes.title;
        details.price = changes.price;

        if let Some(rating) = changes.rating {
            details.rating = rating;
        }
        if let Some(album_type) = changes.album_type {
            details.album_type = album_type;
        }
        if let Some(discount) = changes.discount {
            details.discount = discount;
        }
        if let Some(available) = changes.available {
            details.available = available;
        }
        if let Some(release_date) = changes.release_date {
            details.release_date = release_date;
        }
        if let Some(homepage) = changes.homepage {
            details.homepage = homepage;
        }
        if let Some(genres) = changes.genres {
            details.genres = genres;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.details.validate()
    }
}

/// Album to be created together with its artist and tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlbum {
    #[serde(flatten)]
    pub details: AlbumDetails,
    pub artist: NewArtist,
    #[serde(default)]
    pub tracks: Vec<NewTrack>,
}

impl NewAlbum {
    pub fn new(details: AlbumDetails, artist: NewArtist) -> Self {
        Self {
            details,
            artist,
            tracks: Vec::new(),
        }
    }

    pub fn with_track(mut self, track: NewTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.details.validate()?;
        self.artist.validate()?;
        for track in &self.tracks {
            track.validate()?;
        }
        Ok(())
    }
}

/// Update input for an album's own attributes.
///
/// `ean`, `title` and `price` are always replaced. Nullable fields take three
/// states: `None` keeps the stored value, `Some(None)` clears it and
/// `Some(Some(v))` sets it. In JSON an absent key keeps and `null` clears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumChanges {
    pub ean: String,
    pub title: String,
    pub price: f64,
    #[serde(default, deserialize_with = "patch_field", skip_serializing_if = "Option::is_none")]
    pub rating: Option<Option<i32>>,
    #[serde(default, deserialize_with = "patch_field", skip_serializing_if = "Option::is_none")]
    pub album_type: Option<Option<AlbumType>>,
    #[serde(default, deserialize_with = "patch_field", skip_serializing_if = "Option::is_none")]
    pub discount: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, deserialize_with = "patch_field", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field", skip_serializing_if = "Option::is_none")]
    pub homepage: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
}

/// A present key (even `null`) becomes `Some`; `default` covers absence
fn patch_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl AlbumChanges {
    pub fn new(ean: impl Into<String>, title: impl Into<String>, price: f64) -> Self {
        Self {
            ean: ean.into(),
            title: title.into(),
            price,
            rating: None,
            album_type: None,
            discount: None,
            available: None,
            release_date: None,
            homepage: None,
            genres: None,
        }
    }

    /// Changes that leave `album` as it is
    pub fn from_album(album: &Album) -> Self {
        Self::new(
            album.details.ean.clone(),
            album.details.title.clone(),
            album.details.price,
        )
    }

    /// Validate the supplied values
    pub fn validate(&self) -> Result<(), String> {
        check_ean(&self.ean)?;
        check_title(&self.title)?;
        check_price(self.price)?;
        if let Some(Some(rating)) = self.rating {
            check_rating(rating)?;
        }
        if let Some(Some(discount)) = self.discount {
            check_discount(discount)?;
        }
        if let Some(Some(date)) = &self.release_date {
            check_release_date(date)?;
        }
        if let Some(Some(homepage)) = &self.homepage {
            check_homepage(homepage)?;
        }
        if let Some(genres) = &self.genres {
            check_genres(genres)?;
        }
        Ok(())
    }
}

// =============================================================================
// Artist
// =============================================================================

/// The single artist of an album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub album_id: AlbumId,
    pub name: String,
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArtist {
    pub name: String,
    pub birth_date: Option<String>,
}

impl NewArtist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            birth_date: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !ARTIST_NAME.is_match(&self.name) {
            return Err("Artist name must start with a word character".to_string());
        }

        if self.name.chars().count() > ARTIST_NAME_MAX {
            return Err(format!(
                "Artist name exceeds {} characters",
                ARTIST_NAME_MAX
            ));
        }

        if let Some(birth_date) = &self.birth_date {
            if birth_date.chars().count() > BIRTH_DATE_MAX {
                return Err(format!(
                    "Artist birth date exceeds {} characters",
                    BIRTH_DATE_MAX
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Track
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub album_id: AlbumId,
    pub title: String,
    /// Display duration such as `3:25`
    pub duration: Option<String>,
    pub featured_artist: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrack {
    pub title: String,
    pub duration: Option<String>,
    pub featured_artist: Option<String>,
}

impl NewTrack {
    pub fn new(title: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            duration: Some(duration.into()),
            featured_artist: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Track title cannot be empty".to_string());
        }

        if self.title.chars().count() > TRACK_TITLE_MAX {
            return Err(format!(
                "Track title '{}' exceeds {} characters",
                self.title, TRACK_TITLE_MAX
            ));
        }

        if let Some(duration) = &self.duration {
            if duration.chars().count() > TRACK_DURATION_MAX {
                return Err(format!(
                    "Track duration '{}' exceeds {} characters",
                    duration, TRACK_DURATION_MAX
                ));
            }
        }

        if let Some(featured) = &self.featured_artist {
            if featured.chars().count() > FEATURED_ARTIST_MAX {
                return Err(format!(
                    "Featured artist exceeds {} characters",
                    FEATURED_ARTIST_MAX
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Field rules
// =============================================================================

/// Check an EAN-8 or EAN-13 code including its check digit
pub fn is_valid_ean(ean: &str) -> bool {
    if !(ean.len() == 8 || ean.len() == 13) || !ean.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = ean.bytes().map(|b| u32::from(b - b'0')).collect();
    let (payload, check) = digits.split_at(digits.len() - 1);

    // Weights alternate 3,1 starting next to the check digit
    let sum: u32 = payload
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();

    (10 - sum % 10) % 10 == check[0]
}

fn has_at_most_decimals(value: f64, places: i32) -> bool {
    let scaled = value * 10f64.powi(places);
    (scaled - scaled.round()).abs() < 1e-6
}

fn check_ean(ean: &str) -> Result<(), String> {
    if is_valid_ean(ean) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid EAN-8 or EAN-13", ean))
    }
}

fn check_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Album title cannot be empty".to_string());
    }
    Ok(())
}

fn check_rating(rating: i32) -> Result<(), String> {
    if !(0..=5).contains(&rating) {
        return Err(format!("Rating {} is out of range 0..=5", rating));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price <= 0.0 {
        return Err(format!("Price {} must be positive", price));
    }
    if !has_at_most_decimals(price, 2) {
        return Err(format!("Price {} has more than 2 decimal places", price));
    }
    Ok(())
}

fn check_discount(discount: f64) -> Result<(), String> {
    if !(0.0..=1.0).contains(&discount) {
        return Err(format!("Discount {} is out of range 0..=1", discount));
    }
    if !has_at_most_decimals(discount, 3) {
        return Err(format!(
            "Discount {} has more than 3 decimal places",
            discount
        ));
    }
    Ok(())
}

fn check_release_date(date: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("Release date '{}' is not an ISO-8601 date", date))
}

fn check_homepage(homepage: &str) -> Result<(), String> {
    url::Url::parse(homepage)
        .map(|_| ())
        .map_err(|e| format!("Homepage '{}' is not a valid URL: {}", homepage, e))
}

fn check_genres(genres: &[String]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for genre in genres {
        // Compared as stored
        let genre = genre.trim();
        if genre.is_empty() {
            return Err("Genre cannot be empty".to_string());
        }
        // Stored comma-joined
        if genre.contains(',') {
            return Err(format!("Genre '{}' must not contain ','", genre));
        }
        if !seen.insert(genre) {
            return Err(format!("Genre '{}' is listed twice", genre));
        }
    }
    Ok(())
}

/// Join trimmed genres for the `genres` column; an empty list is stored as NULL
pub fn genres_to_column(genres: &[String]) -> Option<String> {
    if genres.is_empty() {
        None
    } else {
        Some(
            genres
                .iter()
                .map(|g| g.trim())
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// Split the `genres` column; NULL reads as an empty list
pub fn genres_from_column(column: Option<&str>) -> Vec<String> {
    column
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
