use serde::{Deserialize, Serialize};

use crate::catalog::Category;

/// A generated recipe, validated and ready to be shown or added to the plan.
///
/// The wire shape keeps the field names the generator is prompted with
/// (`prepTime`, `type`, `hiddenVeggies`), so a stored plan and an API
/// response look the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub servings: u32,
    pub prep_time: String,
    pub cuisine: String,
    #[serde(flatten)]
    pub kind: RecipeKind,
}

/// Category discriminant. Hidden vegetables only exist on the variant that
/// can carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecipeKind {
    HiddenVeggies {
        #[serde(rename = "hiddenVeggies", default)]
        hidden_veggies: Vec<String>,
    },
    Gourmet,
}

impl RecipeKind {
    /// Builds the kind for `category`. `hidden_veggies` is dropped for gourmet.
    pub fn for_category(category: Category, hidden_veggies: Vec<String>) -> Self {
        match category {
            Category::HiddenVeggies => RecipeKind::HiddenVeggies { hidden_veggies },
            Category::Gourmet => RecipeKind::Gourmet,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            RecipeKind::HiddenVeggies { .. } => Category::HiddenVeggies,
            RecipeKind::Gourmet => Category::Gourmet,
        }
    }
}

impl Recipe {
    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn hidden_veggies(&self) -> Option<&[String]> {
        match &self.kind {
            RecipeKind::HiddenVeggies { hidden_veggies } => Some(hidden_veggies),
            RecipeKind::Gourmet => None,
        }
    }
}
