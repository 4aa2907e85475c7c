use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A book summary record as served by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub sub_title: String,
    #[serde(default)]
    pub image_link: String,
    #[serde(default)]
    pub audio_link: String,
    #[serde(default)]
    pub total_rating: f64,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub key_ideas: u32,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub subscription_required: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub book_description: String,
    #[serde(default)]
    pub author_description: String,
}

impl Book {
    pub fn to_summary(&self) -> BookSummary {
        BookSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            image_link: self.image_link.clone(),
            sub_title: self.sub_title.clone(),
        }
    }

    /// Whether the record carries an audio track.
    pub fn has_audio(&self) -> bool {
        !self.audio_link.is_empty()
    }
}

/// Search result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub image_link: String,
    #[serde(default)]
    pub sub_title: String,
}

/// Home page shelves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Selected,
    Recommended,
    Suggested,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [
        BookStatus::Selected,
        BookStatus::Recommended,
        BookStatus::Suggested,
    ];

    /// Query parameter value for the shelf endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Selected => "selected",
            BookStatus::Recommended => "recommended",
            BookStatus::Suggested => "suggested",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            BookStatus::Selected => "Selected just for you",
            BookStatus::Recommended => "Recommended for you",
            BookStatus::Suggested => "Suggested books",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "selected" => Ok(BookStatus::Selected),
            "recommended" => Ok(BookStatus::Recommended),
            "suggested" => Ok(BookStatus::Suggested),
            other => Err(format!("unknown shelf '{}'", other)),
        }
    }
}
