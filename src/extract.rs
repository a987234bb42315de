//! Turning free-form generator text into a validated [`Recipe`].
//!
//! The generator is asked for a bare JSON object but routinely wraps it in
//! prose or markdown fences, so the object is located structurally before
//! it is parsed.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::catalog::RecipeOption;
use crate::recipe::{Recipe, RecipeKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no JSON object found in response")]
    NoJsonObject,
    #[error("response JSON did not parse: {0}")]
    InvalidJson(String),
    #[error("invalid recipe structure: {0}")]
    InvalidStructure(&'static str),
}

/// Locates the JSON object in `text`.
///
/// The first `{` is scanned to its matching `}` while skipping braces inside
/// string literals. When the scan never closes, the greedy slice from the
/// first `{` to the last `}` is returned instead.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    if let Some(end) = scan_balanced_object(&text[start..]) {
        return Some(&text[start..start + end]);
    }
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Length in bytes of the balanced object at the start of `s`, if it closes.
fn scan_balanced_object(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in s.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedRecipe {
    name: String,
    #[serde(default)]
    description: Option<String>,
    ingredients: Vec<String>,
    #[serde(default)]
    instructions: Option<Vec<String>>,
    #[serde(default)]
    servings: Option<Value>,
    #[serde(default)]
    prep_time: Option<String>,
    #[serde(default)]
    cuisine: Option<String>,
    #[serde(default)]
    hidden_veggies: Option<Vec<String>>,
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extracts, parses and validates a recipe from raw generator output.
///
/// The category always follows `option` and `servings` is pinned to
/// `family_size`; `prepTime` and `cuisine` are taken as given.
pub fn parse_recipe_response(
    raw: &str,
    option: &RecipeOption,
    family_size: u32,
) -> Result<Recipe, ExtractError> {
    let json_str = extract_json_object(raw).ok_or(ExtractError::NoJsonObject)?;
    let value: Value =
        serde_json::from_str(json_str).map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

    let obj = value
        .as_object()
        .ok_or(ExtractError::InvalidStructure("top level is not an object"))?;
    match obj.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => {}
        _ => return Err(ExtractError::InvalidStructure("missing name")),
    }
    if !obj.get("ingredients").is_some_and(Value::is_array) {
        return Err(ExtractError::InvalidStructure("ingredients is not an array"));
    }

    let generated: GeneratedRecipe = serde_json::from_value(value)
        .map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

    let ingredients = non_blank(generated.ingredients);
    if ingredients.is_empty() {
        return Err(ExtractError::InvalidStructure("no ingredients"));
    }
    let instructions = non_blank(generated.instructions.unwrap_or_default());
    if instructions.is_empty() {
        return Err(ExtractError::InvalidStructure("no instructions"));
    }

    if let Some(servings) = &generated.servings {
        if servings.as_u64() != Some(u64::from(family_size)) {
            warn!(
                requested = family_size,
                returned = %servings,
                "generator ignored requested servings, pinning"
            );
        }
    }

    Ok(Recipe {
        name: generated.name.trim().to_string(),
        description: generated.description.unwrap_or_default(),
        ingredients,
        instructions,
        servings: family_size,
        prep_time: generated.prep_time.unwrap_or_default(),
        cuisine: generated.cuisine.unwrap_or_else(|| option.id.clone()),
        kind: RecipeKind::for_category(
            option.category,
            non_blank(generated.hidden_veggies.unwrap_or_default()),
        ),
    })
}
