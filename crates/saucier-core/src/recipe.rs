//! Recipe domain types.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};

/// A recipe mapped from a backend record.
///
/// Ingredients and instructions are `None` until a detail fetch populates
/// them; populating produces a new value instead of mutating in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub instructions: Option<Vec<Instruction>>,
}

impl Recipe {
    /// Returns a copy with the lazy child lists populated.
    #[must_use]
    pub fn with_details(&self, ingredients: Vec<Ingredient>, instructions: Vec<Instruction>) -> Self {
        Self {
            ingredients: Some(ingredients),
            instructions: Some(instructions),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub id: String,
    pub raw_value: String,
}

/// A recipe step. `index` is the explicit ordering key; it need not be
/// contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub id: String,
    pub raw_value: String,
    pub index: i64,
}

/// An image attached to a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeImage {
    pub id: String,
    /// Decoded JPEG bytes, `None` when the record carried no usable data.
    pub data: Option<Vec<u8>>,
}

impl RecipeImage {
    /// `data:` URI suitable for an `<img src>`.
    pub fn data_uri(&self) -> Option<String> {
        self.data
            .as_ref()
            .map(|bytes| format!("data:image/jpeg;base64,{}", BASE64.encode(bytes)))
    }
}

/// A recipe with its children loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub images: Vec<RecipeImage>,
}

impl RecipeDetail {
    pub fn ingredients(&self) -> &[Ingredient] {
        self.recipe.ingredients.as_deref().unwrap_or_default()
    }

    pub fn instructions(&self) -> &[Instruction] {
        self.recipe.instructions.as_deref().unwrap_or_default()
    }

    /// First image with data, used as the cover.
    pub fn cover_image(&self) -> Option<&RecipeImage> {
        self.images.iter().find(|image| image.data.is_some())
    }
}
