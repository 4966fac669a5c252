//! Raw record to domain mapping.

use std::collections::HashSet;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;
use serde_json::Value;

use super::api::{RawRecord, schema};
use crate::recipe::{Ingredient, Instruction, Recipe, RecipeImage};

/// Length of the id prefix used in placeholder names.
const PLACEHOLDER_ID_CHARS: usize = 8;

pub fn recipe_from_record(record: &RawRecord) -> Recipe {
    let name = schema::RECIPE_NAME_FIELDS
        .iter()
        .find_map(|field| record.string_field(field))
        .map_or_else(|| placeholder_name(&record.record_name), str::to_string);

    let url = schema::RECIPE_URL_FIELDS
        .iter()
        .find_map(|field| record.string_field(field))
        .map(str::to_string);

    let created_at = record
        .created
        .and_then(|created| DateTime::from_timestamp_millis(created.timestamp));

    Recipe {
        id: record.record_name.clone(),
        name,
        url,
        created_at,
        ingredients: None,
        instructions: None,
    }
}

/// `"Recipe "` followed by the first eight characters of the id.
pub fn placeholder_name(id: &str) -> String {
    let prefix: String = id.chars().take(PLACEHOLDER_ID_CHARS).collect();
    format!("Recipe {prefix}")
}

pub fn ingredient_from_record(record: &RawRecord) -> Ingredient {
    Ingredient {
        id: record.record_name.clone(),
        raw_value: text_field(record, schema::INGREDIENT_TEXT),
    }
}

pub fn instruction_from_record(record: &RawRecord) -> Instruction {
    let index = record
        .field(schema::INSTRUCTION_INDEX)
        .and_then(parse_index)
        .unwrap_or_else(|| {
            tracing::warn!(record = %record.record_name, "instruction without a usable index");
            i64::MAX
        });

    Instruction {
        id: record.record_name.clone(),
        raw_value: text_field(record, schema::INSTRUCTION_TEXT),
        index,
    }
}

pub fn image_from_record(record: &RawRecord) -> RecipeImage {
    let data = record
        .field(schema::IMAGE_DATA)
        .and_then(Value::as_str)
        .and_then(|encoded| match BASE64.decode(encoded.trim()) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::warn!(record = %record.record_name, "undecodable image data: {err}");
                None
            }
        });

    RecipeImage {
        id: record.record_name.clone(),
        data,
    }
}

/// Sorts ascending by index. Stable, so unindexed steps keep backend order.
pub fn sort_instructions(instructions: &mut [Instruction]) {
    instructions.sort_by_key(|instruction| instruction.index);
}

/// Keeps the first occurrence of every id.
pub fn dedupe_by_id<T>(items: Vec<T>, id: impl Fn(&T) -> &str) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(id(item).to_string()))
        .collect()
}

fn text_field(record: &RawRecord, name: &str) -> String {
    match record.field(name) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn parse_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
