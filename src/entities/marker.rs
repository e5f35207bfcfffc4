use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entities::Coordinates;
use crate::error::{validation_error, Error};

pub const DEFAULT_TITLE: &str = "Without title";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Restaurant,
    Parc,
    Museum,
    Subway,
    Airport,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Restaurant,
        Category::Parc,
        Category::Museum,
        Category::Subway,
        Category::Airport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restaurant => "Restaurant",
            Self::Parc => "Parc",
            Self::Museum => "Museum",
            Self::Subway => "Subway",
            Self::Airport => "Airport",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| validation_error(format!("invalid category: {:?}", s)))
    }
}

/// Category projection used by the marker list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(Category),
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self::All
    }
}

impl CategoryFilter {
    pub fn matches(&self, marker: &Marker) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => marker.category == *category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "All" => Ok(Self::All),
            _ => Ok(Self::Only(s.parse()?)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    pub category: Category,
}

impl Marker {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Unvalidated marker as submitted by the placement form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarkerDraft {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
}

impl MarkerDraft {
    #[tracing::instrument]
    pub fn validate(self) -> Result<NewMarker, Error> {
        let category: Category = self.category.parse()?;
        Coordinates::new(self.lat, self.lng).validate()?;

        let title = match self.title.trim() {
            "" => DEFAULT_TITLE.to_string(),
            title => title.to_string(),
        };

        Ok(NewMarker {
            lat: self.lat,
            lng: self.lng,
            title,
            category,
        })
    }
}

/// A validated marker that has not been assigned an id yet. This is also the
/// document body kept by the stores, which never carries the id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewMarker {
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    pub category: Category,
}

impl NewMarker {
    pub fn with_id(self, id: String) -> Marker {
        Marker {
            id,
            lat: self.lat,
            lng: self.lng,
            title: self.title,
            category: self.category,
        }
    }
}

impl From<&Marker> for NewMarker {
    fn from(marker: &Marker) -> Self {
        Self {
            lat: marker.lat,
            lng: marker.lng,
            title: marker.title.clone(),
            category: marker.category,
        }
    }
}

#[test]
fn draft_with_known_category_validates() {
    let draft = MarkerDraft {
        lat: 40.4168,
        lng: -3.7038,
        title: "  Prado  ".into(),
        category: "Museum".into(),
    };

    let marker = draft.validate().unwrap();
    assert_eq!(marker.category, Category::Museum);
    assert_eq!(marker.title, "Prado");
}

#[test]
fn draft_with_unknown_category_is_rejected() {
    use crate::error::ErrorKind;

    for category in ["", "museum", "Beach", " Parc"] {
        let draft = MarkerDraft {
            lat: 0.0,
            lng: 0.0,
            title: "x".into(),
            category: category.into(),
        };

        assert_eq!(draft.validate().unwrap_err().kind(), ErrorKind::Validation);
    }
}

#[test]
fn blank_title_falls_back_to_default() {
    let draft = MarkerDraft {
        lat: 0.0,
        lng: 0.0,
        title: "   ".into(),
        category: "Parc".into(),
    };

    assert_eq!(draft.validate().unwrap().title, DEFAULT_TITLE);
}

#[test]
fn document_body_never_carries_id() {
    let marker = Marker {
        id: "abc".into(),
        lat: 1.0,
        lng: 2.0,
        title: "Gate".into(),
        category: Category::Airport,
    };

    let document = serde_json::to_value(NewMarker::from(&marker)).unwrap();
    assert!(document.get("id").is_none());
    assert_eq!(document["category"], "Airport");
}

#[test]
fn unknown_category_does_not_deserialize() {
    let raw = r#"{"id":"a","lat":1.0,"lng":2.0,"title":"t","category":"Beach"}"#;
    assert!(serde_json::from_str::<Marker>(raw).is_err());
}

#[test]
fn filter_parses_all_and_categories() {
    assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
    assert_eq!(
        "Subway".parse::<CategoryFilter>().unwrap(),
        CategoryFilter::Only(Category::Subway)
    );
    assert!("Beach".parse::<CategoryFilter>().is_err());
}
