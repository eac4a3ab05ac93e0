use chrono::{Datelike, NaiveDate};
use cinescout_api::TmdbMovie;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::genres;
use crate::{Error, Result};

/// Identifier of a favorite - TMDB hands out integers, but anything with a
/// stable string id can be favorited too
///
/// `5` and `"5"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FavoriteId {
    Int(i64),
    Text(String),
}

impl FavoriteId {
    /// A usable id: any integer, or a string with something other than whitespace in it
    pub fn is_valid(&self) -> bool {
        match self {
            FavoriteId::Int(_) => true,
            FavoriteId::Text(s) => !s.trim().is_empty(),
        }
    }
}

impl fmt::Display for FavoriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FavoriteId::Int(n) => write!(f, "{}", n),
            FavoriteId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for FavoriteId {
    type Err = std::convert::Infallible;

    /// Numeric-looking input becomes an integer id, anything else stays text
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i64>() {
            Ok(n) => FavoriteId::Int(n),
            Err(_) => FavoriteId::Text(s.to_string()),
        })
    }
}

impl From<i64> for FavoriteId {
    fn from(n: i64) -> Self {
        FavoriteId::Int(n)
    }
}

impl From<i32> for FavoriteId {
    fn from(n: i32) -> Self {
        FavoriteId::Int(n.into())
    }
}

impl From<&str> for FavoriteId {
    fn from(s: &str) -> Self {
        FavoriteId::Text(s.to_string())
    }
}

impl From<String> for FavoriteId {
    fn from(s: String) -> Self {
        FavoriteId::Text(s)
    }
}

/// A primitive display value attached to a favorite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(n) => Some(*n as f64),
            FieldValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Convert a JSON value, refusing arrays and objects
    fn from_json(value: serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Bool(b)),
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Int)
                .or_else(|| n.as_f64().map(FieldValue::Float)),
            Value::String(s) => Some(FieldValue::Text(s)),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Int(n.into())
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Field name taken by the item's own id; never stored as a display field
pub const ID_KEY: &str = "id";

/// Something the user has favorited
///
/// The store only cares about `id`. Everything else rides along untouched
/// and comes back exactly as it went in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub id: FavoriteId,
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl FavoriteItem {
    pub fn new(id: impl Into<FavoriteId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter. `"id"` is reserved and gets ignored.
    pub fn with_field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        if key == ID_KEY {
            debug!("Ignoring display field named {:?} on favorite {}", ID_KEY, self.id);
            return self;
        }
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Check the item survives a trip through the persisted JSON unchanged
    ///
    /// The id must be usable, no display field may shadow it, and floats
    /// must be finite (JSON has no NaN or infinity).
    pub fn validate(&self) -> Result<()> {
        if !self.id.is_valid() {
            return Err(Error::InvalidItem(format!("unusable id {:?}", self.id)));
        }
        if self.fields.contains_key(ID_KEY) {
            return Err(Error::InvalidItem(format!(
                "favorite {} has a display field named {:?}",
                self.id, ID_KEY
            )));
        }
        for (key, value) in &self.fields {
            if let FieldValue::Float(x) = value {
                if !x.is_finite() {
                    return Err(Error::InvalidItem(format!(
                        "field {:?} on favorite {} is not a finite number",
                        key, self.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Display title, whichever of `title`/`name` is present
    pub fn title(&self) -> Option<&str> {
        self.field("title")
            .and_then(FieldValue::as_str)
            .or_else(|| self.field("name").and_then(FieldValue::as_str))
    }

    /// Build an item from a loosely-typed JSON object
    ///
    /// The id must be an integer or a non-blank string. Nested arrays and
    /// objects are dropped since the item only carries primitives.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(Error::InvalidItem("expected a JSON object".into()));
        };

        let mut id = None;
        let mut fields = BTreeMap::new();

        for (key, value) in map {
            if key == "id" {
                id = match value {
                    serde_json::Value::Number(n) => n.as_i64().map(FavoriteId::Int),
                    serde_json::Value::String(s) => Some(FavoriteId::Text(s)),
                    _ => None,
                };
            } else if let Some(field) = FieldValue::from_json(value) {
                fields.insert(key, field);
            }
        }

        let id = id
            .filter(FavoriteId::is_valid)
            .ok_or_else(|| Error::InvalidItem("missing or unusable id".into()))?;

        Ok(Self { id, fields })
    }
}

/// Whether a catalog entry is a film or a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

/// A catalog entry as the rest of the app sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    /// `YYYY-MM-DD` as TMDB sends it (release date or first air date)
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub genre_ids: Vec<u32>,
    pub popularity: Option<f64>,
}

impl Movie {
    pub fn release_year(&self) -> Option<i32> {
        let date = self.release_date.as_deref()?;

        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(|d| d.year())
            .ok()
            .or_else(|| date.get(..4).and_then(|y| y.parse().ok()))
    }

    /// Average rating with one decimal, e.g. "8.4"
    pub fn rating_label(&self) -> Option<String> {
        self.vote_average.map(|r| format!("{:.1}", r))
    }

    pub fn poster_url(&self, image_base: &str) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|p| format!("{}{}", image_base, p))
    }

    /// Wide image for cards and the detail view: backdrop, falling back to poster
    pub fn hero_image_url(&self, image_base: &str) -> Option<String> {
        self.backdrop_path
            .as_deref()
            .or(self.poster_path.as_deref())
            .map(|p| format!("{}{}", image_base, p))
    }

    pub fn genre_names(&self) -> String {
        genres::names_for(&self.genre_ids)
    }

    /// Id as the favorites store keys it; `None` if it doesn't fit an i64
    pub fn favorite_id(&self) -> Option<FavoriteId> {
        i64::try_from(self.id).ok().map(FavoriteId::Int)
    }

    /// Snapshot of the display fields, ready for the favorites store
    pub fn to_favorite(&self) -> Result<FavoriteItem> {
        let id = self
            .favorite_id()
            .ok_or_else(|| Error::InvalidItem(format!("id {} is out of range", self.id)))?;
        let mut item = FavoriteItem::new(id).with_field("title", self.title.as_str());

        let optional_text = [
            ("overview", &self.overview),
            ("poster_path", &self.poster_path),
            ("backdrop_path", &self.backdrop_path),
            ("release_date", &self.release_date),
        ];
        for (key, value) in optional_text {
            if let Some(v) = value {
                item = item.with_field(key, v.as_str());
            }
        }

        if let Some(rating) = self.vote_average {
            item = item.with_field("vote_average", rating);
        }
        if let Some(popularity) = self.popularity {
            item = item.with_field("popularity", popularity);
        }

        Ok(item)
    }
}

impl From<TmdbMovie> for Movie {
    fn from(raw: TmdbMovie) -> Self {
        let media_type = if raw.title.is_none() && raw.name.is_some() {
            MediaType::Tv
        } else {
            MediaType::Movie
        };

        Movie {
            id: raw.id,
            media_type,
            title: raw
                .title
                .or(raw.name)
                .unwrap_or_else(|| "Untitled".to_string()),
            overview: raw.overview.filter(|o| !o.is_empty()),
            poster_path: raw.poster_path,
            backdrop_path: raw.backdrop_path,
            release_date: raw
                .release_date
                .or(raw.first_air_date)
                .filter(|d| !d.is_empty()),
            vote_average: raw.vote_average,
            genre_ids: raw.genre_ids,
            popularity: raw.popularity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_movie() -> TmdbMovie {
        TmdbMovie {
            id: 550,
            title: Some("Fight Club".into()),
            name: None,
            overview: Some("An insomniac office worker...".into()),
            poster_path: Some("/poster.jpg".into()),
            backdrop_path: None,
            release_date: Some("1999-10-15".into()),
            first_air_date: None,
            vote_average: Some(8.433),
            genre_ids: vec![18, 53],
            popularity: Some(61.4),
        }
    }

    #[test]
    fn test_favorite_id_validity() {
        assert!(FavoriteId::Int(0).is_valid());
        assert!(FavoriteId::Int(-3).is_valid());
        assert!(FavoriteId::from("tt0137523").is_valid());
        assert!(!FavoriteId::from("").is_valid());
        assert!(!FavoriteId::from("   ").is_valid());
    }

    #[test]
    fn test_favorite_id_from_str() {
        assert_eq!("42".parse::<FavoriteId>().unwrap(), FavoriteId::Int(42));
        assert_eq!(
            "tt42".parse::<FavoriteId>().unwrap(),
            FavoriteId::Text("tt42".into())
        );
    }

    #[test]
    fn test_item_serializes_flat() {
        let item = FavoriteItem::new(1)
            .with_field("title", "A")
            .with_field("vote_average", 7.5);

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({"id": 1, "title": "A", "vote_average": 7.5}));
    }

    #[test]
    fn test_item_fields_keep_their_types() {
        let raw = r#"{"id":"abc","rating":8.0,"votes":120,"adult":false,"poster_path":null}"#;
        let item: FavoriteItem = serde_json::from_str(raw).unwrap();

        assert_eq!(item.id, FavoriteId::Text("abc".into()));
        assert_eq!(item.field("rating"), Some(&FieldValue::Float(8.0)));
        assert_eq!(item.field("votes"), Some(&FieldValue::Int(120)));
        assert_eq!(item.field("adult"), Some(&FieldValue::Bool(false)));
        assert_eq!(item.field("poster_path"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_from_json_drops_nested_values() {
        let item = FavoriteItem::from_json(json!({
            "id": 7,
            "title": "Seven",
            "genre_ids": [80, 9648]
        }))
        .unwrap();

        assert_eq!(item.id, FavoriteId::Int(7));
        assert_eq!(item.title(), Some("Seven"));
        assert!(item.field("genre_ids").is_none());
    }

    #[test]
    fn test_from_json_rejects_missing_id() {
        assert!(matches!(
            FavoriteItem::from_json(json!({"title": "No id"})),
            Err(Error::InvalidItem(_))
        ));
        assert!(matches!(
            FavoriteItem::from_json(json!({"id": "  "})),
            Err(Error::InvalidItem(_))
        ));
        assert!(matches!(
            FavoriteItem::from_json(json!({"id": 1.5})),
            Err(Error::InvalidItem(_))
        ));
        assert!(matches!(
            FavoriteItem::from_json(json!([1, 2])),
            Err(Error::InvalidItem(_))
        ));
    }

    #[test]
    fn test_movie_from_tmdb() {
        let movie = Movie::from(raw_movie());
        assert_eq!(movie.media_type, MediaType::Movie);
        assert_eq!(movie.title, "Fight Club");
        assert_eq!(movie.release_year(), Some(1999));
        assert_eq!(movie.rating_label().as_deref(), Some("8.4"));
        assert_eq!(movie.genre_names(), "Drama, Thriller");
    }

    #[test]
    fn test_tv_show_uses_name_and_air_date() {
        let raw = TmdbMovie {
            title: None,
            name: Some("Severance".into()),
            release_date: None,
            first_air_date: Some("2022-02-17".into()),
            ..raw_movie()
        };

        let show = Movie::from(raw);
        assert_eq!(show.media_type, MediaType::Tv);
        assert_eq!(show.title, "Severance");
        assert_eq!(show.release_year(), Some(2022));
    }

    #[test]
    fn test_release_year_tolerates_partial_dates() {
        let mut movie = Movie::from(raw_movie());
        movie.release_date = Some("2024".into());
        assert_eq!(movie.release_year(), Some(2024));

        movie.release_date = None;
        assert_eq!(movie.release_year(), None);
    }

    #[test]
    fn test_image_urls_prefer_backdrop_for_hero() {
        let base = "https://image.tmdb.org/t/p/w500";
        let mut movie = Movie::from(raw_movie());

        assert_eq!(
            movie.hero_image_url(base).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );

        movie.backdrop_path = Some("/backdrop.jpg".into());
        assert_eq!(
            movie.hero_image_url(base).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/backdrop.jpg")
        );
        assert_eq!(
            movie.poster_url(base).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
    }

    #[test]
    fn test_to_favorite_carries_display_fields() {
        let item = Movie::from(raw_movie()).to_favorite().unwrap();

        assert_eq!(item.id, FavoriteId::Int(550));
        assert_eq!(item.title(), Some("Fight Club"));
        assert_eq!(item.field("release_date").and_then(FieldValue::as_str), Some("1999-10-15"));
        assert_eq!(item.field("vote_average").and_then(FieldValue::as_f64), Some(8.433));
        assert!(item.field("backdrop_path").is_none());
    }

    #[test]
    fn test_id_is_not_a_display_field() {
        let item = FavoriteItem::new(1).with_field("id", 2).with_field("title", "One");

        assert_eq!(item.id, FavoriteId::Int(1));
        assert!(item.field("id").is_none());
        assert!(item.validate().is_ok());

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({"id": 1, "title": "One"}));
    }

    #[test]
    fn test_validate_rejects_non_finite_floats() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let item = FavoriteItem::new(1).with_field("vote_average", bad);
            assert!(matches!(item.validate(), Err(Error::InvalidItem(_))));
        }

        let fine = FavoriteItem::new(1).with_field("vote_average", 7.25);
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        assert!(matches!(
            FavoriteItem::new("  ").validate(),
            Err(Error::InvalidItem(_))
        ));
    }

    #[test]
    fn test_out_of_range_id_cannot_be_favorited() {
        let mut movie = Movie::from(raw_movie());
        movie.id = u64::MAX;

        assert_eq!(movie.favorite_id(), None);
        assert!(matches!(movie.to_favorite(), Err(Error::InvalidItem(_))));

        movie.id = i64::MAX as u64;
        assert_eq!(movie.favorite_id(), Some(FavoriteId::Int(i64::MAX)));
    }
}
