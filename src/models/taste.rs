use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Taste dimension the planner gathers recommendations for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TasteCategory {
    Music,
    Movie,
    Fashion,
}

impl TasteCategory {
    pub const ALL: [TasteCategory; 3] = [
        TasteCategory::Music,
        TasteCategory::Movie,
        TasteCategory::Fashion,
    ];

    /// Entity type filter used when searching by name
    pub fn entity_type(&self) -> &'static str {
        match self {
            TasteCategory::Music => "urn:entity:artist",
            TasteCategory::Movie => "urn:entity:movie",
            TasteCategory::Fashion => "urn:entity:brand",
        }
    }

    /// Path segment of the recommendations endpoint
    pub fn domain(&self) -> &'static str {
        match self {
            TasteCategory::Music => "music",
            TasteCategory::Movie => "movies",
            TasteCategory::Fashion => "fashion",
        }
    }

    /// Heading used when the category is written into a prompt
    pub fn label(&self) -> &'static str {
        match self {
            TasteCategory::Music => "Music",
            TasteCategory::Movie => "Film",
            TasteCategory::Fashion => "Fashion",
        }
    }
}

/// A single name to resolve against the taste graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasteQuery {
    pub name: String,
    pub category: TasteCategory,
}

impl TasteQuery {
    pub fn new(name: impl Into<String>, category: TasteCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

/// Opaque identifier returned by the recommendation service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered display names recommended for one category. Empty is a valid result.
pub type RecommendationSet = Vec<String>;

/// The user's stated taste, one value per category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TastePreferences {
    pub music: String,
    pub movie: String,
    pub fashion: String,
}

impl TastePreferences {
    pub fn get(&self, category: TasteCategory) -> &str {
        match category {
            TasteCategory::Music => &self.music,
            TasteCategory::Movie => &self.movie,
            TasteCategory::Fashion => &self.fashion,
        }
    }

    pub fn query(&self, category: TasteCategory) -> TasteQuery {
        TasteQuery::new(self.get(category), category)
    }
}

/// Recommendations gathered for every category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub music: RecommendationSet,
    pub movie: RecommendationSet,
    pub fashion: RecommendationSet,
}

impl Recommendations {
    pub fn get(&self, category: TasteCategory) -> &[String] {
        match category {
            TasteCategory::Music => &self.music,
            TasteCategory::Movie => &self.movie,
            TasteCategory::Fashion => &self.fashion,
        }
    }
}

/// Structured parameters inferred from the user's free text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripParameters {
    #[serde(flatten)]
    pub preferences: TastePreferences,
    pub destination: String,
    pub days: u32,
}
