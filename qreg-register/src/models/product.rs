//! Wire types for the analysis and catalog collaborators
//!
//! Field names mirror the backend JSON exactly (snake_case), so these
//! structs serialize/deserialize without rename attributes.

use serde::{Deserialize, Serialize};

/// Placeholder name used when registering without per-field extraction
pub const PLACEHOLDER_NAME: &str = "신규 제품";
/// Placeholder category used when registering without per-field extraction
pub const PLACEHOLDER_CATEGORY: &str = "미분류";
/// Maximum characters of AI analysis text carried into the description
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// One catalog item proposed as a match for the captured image
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CandidateProduct {
    /// Catalog identifier
    pub id: i64,
    /// Human-facing product code (unique, immutable once assigned)
    pub qcode: String,
    pub name: String,
    pub description: String,
    /// Backend-computed similarity percentage in [0, 100]; never recomputed
    /// client-side
    pub similarity: f64,
    pub purchase_count: u32,
    pub average_rating: f64,
    pub last_price: f64,
}

/// Response of `POST /api/analyze-image`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisResult {
    /// Free-text AI description of the photographed item
    pub ai_analysis: String,
    /// Server-side storage reference for the uploaded image; echoed back to
    /// registration
    pub image_path: String,
    /// Candidates ordered by descending similarity; may be empty
    #[serde(default)]
    pub similar_products: Vec<CandidateProduct>,
}

/// Response of `POST /api/products`
///
/// The backend guarantees at least `qcode`; the submitted attributes may be
/// echoed back.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisteredProduct {
    /// Newly assigned Q-CODE
    pub qcode: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// Form body of `POST /api/products`
#[derive(Debug, Clone, Serialize)]
pub struct NewProductRequest {
    pub name: String,
    pub category: String,
    pub description: String,
    pub image_path: String,
}

impl NewProductRequest {
    /// Build a registration request from an analysis result
    ///
    /// No per-field extraction UI exists, so name and category are fixed
    /// placeholders; the description carries the first
    /// [`DESCRIPTION_MAX_CHARS`] characters of the AI analysis and the
    /// server-side image path is echoed back unchanged.
    pub fn from_analysis(result: &AnalysisResult) -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            category: PLACEHOLDER_CATEGORY.to_string(),
            description: truncate_chars(&result.ai_analysis, DESCRIPTION_MAX_CHARS),
            image_path: result.image_path.clone(),
        }
    }
}

/// Stock record for confirming a capture against an existing product
/// (`POST /api/inventory/record`)
#[derive(Debug, Clone, Serialize)]
pub struct StockRecord {
    /// Q-CODE of the matched catalog product
    pub qcode: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Take at most `max` characters of `text`
///
/// Counted in characters, not bytes: the analysis text is typically Korean
/// and a byte cut could split a character.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
