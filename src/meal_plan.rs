//! The meal plan: an ordered list of meals, persisted to a blob store after
//! every change and rehydrated once on open.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::catalog::Category;
use crate::error::{PersistenceError, PlanError};
use crate::recipe::{Recipe, RecipeKind};
use crate::shopping::derive_shopping_list;
use crate::store::BlobStore;
use crate::validation::{sanitize_input, validate_ingredient, validate_meal_name, ValidationError};

/// Blob key the plan is stored under.
pub const MEAL_PLAN_KEY: &str = "meals";
/// A stored plan that cannot be read is copied here before it is replaced.
pub const UNREADABLE_PLAN_KEY: &str = "meals.unreadable";
pub const MEAL_PLAN_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredMeal")]
pub struct Meal {
    pub name: String,
    pub ingredients: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
    #[serde(rename = "type")]
    pub category: Category,
}

impl Meal {
    /// A hand-entered meal. Manual meals are filed as gourmet.
    pub fn manual(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ingredients: Vec::new(),
            recipe: None,
            category: Category::Gourmet,
        }
    }

    /// A meal taken over verbatim from an accepted suggestion.
    pub fn from_recipe(recipe: Recipe) -> Self {
        Self {
            name: recipe.name.clone(),
            ingredients: recipe.ingredients.clone(),
            category: recipe.category(),
            recipe: Some(recipe),
        }
    }
}

/// On-disk shape of a meal as any version of the app may have written it.
///
/// Older plans stored the generator's object as-is, so a recipe is read
/// field by field with defaults rather than through [`Recipe`]'s strict
/// shape.
#[derive(Deserialize)]
struct StoredMeal {
    name: String,
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default)]
    recipe: Option<Value>,
    #[serde(rename = "type", default)]
    category: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecipe {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    ingredients: Option<Vec<String>>,
    #[serde(default)]
    instructions: Option<Vec<String>>,
    #[serde(default)]
    servings: Option<Value>,
    #[serde(default)]
    prep_time: Option<String>,
    #[serde(default)]
    cuisine: Option<String>,
    #[serde(rename = "type", default)]
    category: Option<String>,
    #[serde(default)]
    hidden_veggies: Option<Vec<String>>,
}

fn servings_from(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok()
}

impl StoredRecipe {
    fn into_recipe(self, meal_name: &str, fallback: Category) -> Recipe {
        let category = self
            .category
            .as_deref()
            .and_then(Category::parse)
            .unwrap_or(fallback);
        Recipe {
            name: self
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| meal_name.to_string()),
            description: self.description.unwrap_or_default(),
            ingredients: self.ingredients.unwrap_or_default(),
            instructions: self.instructions.unwrap_or_default(),
            servings: self.servings.as_ref().and_then(servings_from).unwrap_or(0),
            prep_time: self.prep_time.unwrap_or_default(),
            cuisine: self.cuisine.unwrap_or_default(),
            kind: RecipeKind::for_category(category, self.hidden_veggies.unwrap_or_default()),
        }
    }
}

impl From<StoredMeal> for Meal {
    fn from(stored: StoredMeal) -> Self {
        let StoredMeal {
            name,
            ingredients,
            recipe,
            category,
        } = stored;
        let fallback = category
            .as_deref()
            .and_then(Category::parse)
            .unwrap_or(Category::Gourmet);
        let recipe = recipe.filter(|v| !v.is_null()).and_then(|value| {
            match serde_json::from_value::<StoredRecipe>(value) {
                Ok(stored) => Some(stored.into_recipe(&name, fallback)),
                Err(e) => {
                    warn!(meal = %name, error = %e, "dropping unreadable recipe from stored meal");
                    None
                }
            }
        });
        // An attached recipe decides the category.
        let category = recipe.as_ref().map_or(fallback, Recipe::category);
        Meal {
            name,
            ingredients,
            recipe,
            category,
        }
    }
}

#[derive(Serialize)]
struct StoredPlanRef<'a> {
    version: u32,
    meals: &'a [Meal],
}

#[derive(Deserialize)]
struct StoredPlan {
    version: u32,
    meals: Vec<Meal>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFormat {
    Versioned(StoredPlan),
    // Plans written before the version envelope were a bare array.
    Legacy(Vec<Meal>),
}

pub fn serialize_plan(meals: &[Meal]) -> Result<String, PersistenceError> {
    let stored = StoredPlanRef {
        version: MEAL_PLAN_VERSION,
        meals,
    };
    Ok(serde_json::to_string(&stored)?)
}

pub fn deserialize_plan(raw: &str) -> Result<Vec<Meal>, PersistenceError> {
    match serde_json::from_str::<StoredFormat>(raw)? {
        StoredFormat::Versioned(plan) if plan.version == MEAL_PLAN_VERSION => Ok(plan.meals),
        StoredFormat::Versioned(plan) => Err(PersistenceError::UnsupportedVersion(plan.version)),
        StoredFormat::Legacy(meals) => Ok(meals),
    }
}

/// Owns the in-memory plan and its durable copy.
///
/// The in-memory plan is authoritative: a failed write is logged while the
/// mutation stands. A stored plan that cannot be parsed is copied to
/// [`UNREADABLE_PLAN_KEY`] before anything overwrites it. When the stored
/// plan cannot be read or copied at all, nothing is written this session.
pub struct MealPlanStore<S: BlobStore> {
    meals: Vec<Meal>,
    store: S,
    writable: bool,
}

impl<S: BlobStore> MealPlanStore<S> {
    pub fn open(mut store: S) -> Self {
        let (meals, writable) = match store.get(MEAL_PLAN_KEY) {
            Ok(Some(raw)) => match deserialize_plan(&raw) {
                Ok(meals) => (meals, true),
                Err(e) => {
                    warn!(error = %e, "stored meal plan unreadable, starting empty");
                    (Vec::new(), set_aside(&mut store, &raw))
                }
            },
            Ok(None) => (Vec::new(), true),
            Err(e) => {
                error!(error = %e, "could not read meal plan, changes will not be saved");
                (Vec::new(), false)
            }
        };
        info!(meals = meals.len(), writable, "meal plan loaded");
        Self {
            meals,
            store,
            writable,
        }
    }

    /// `false` when changes stay in memory because the stored plan could
    /// not be read or set aside.
    pub fn is_persisting(&self) -> bool {
        self.writable
    }

    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    pub fn add_meal(&mut self, name: &str) -> Result<(), ValidationError> {
        let name = sanitize_input(name);
        validate_meal_name(&name)?;
        self.meals.push(Meal::manual(name));
        self.persist();
        Ok(())
    }

    /// Removes the meal at `index`; out of range is a no-op.
    pub fn delete_meal(&mut self, index: usize) -> Option<Meal> {
        if index >= self.meals.len() {
            return None;
        }
        let removed = self.meals.remove(index);
        self.persist();
        Some(removed)
    }

    /// `false` when the text is rejected or the meal does not exist.
    pub fn add_ingredient(&mut self, meal_index: usize, text: &str) -> bool {
        self.try_add_ingredient(meal_index, text).is_ok()
    }

    pub fn try_add_ingredient(&mut self, meal_index: usize, text: &str) -> Result<(), PlanError> {
        let ingredient = sanitize_input(text);
        validate_ingredient(&ingredient)?;
        let meal = self
            .meals
            .get_mut(meal_index)
            .ok_or(PlanError::MealNotFound(meal_index))?;
        meal.ingredients.push(ingredient);
        self.persist();
        Ok(())
    }

    pub fn delete_ingredient(&mut self, meal_index: usize, ingredient_index: usize) -> Option<String> {
        let meal = self.meals.get_mut(meal_index)?;
        if ingredient_index >= meal.ingredients.len() {
            return None;
        }
        let removed = meal.ingredients.remove(ingredient_index);
        self.persist();
        Some(removed)
    }

    /// Ingredients are generator output that already passed structural
    /// checks, so they are not run through the ingredient validator.
    pub fn add_recipe_as_meal(&mut self, recipe: Recipe) {
        self.meals.push(Meal::from_recipe(recipe));
        self.persist();
    }

    /// Always derived from the current plan, so it can never go stale.
    pub fn shopping_list(&self) -> Vec<String> {
        derive_shopping_list(&self.meals)
    }

    fn persist(&mut self) {
        if !self.writable {
            debug!("meal plan persistence disabled, change kept in memory");
            return;
        }
        let result = serialize_plan(&self.meals)
            .and_then(|raw| self.store.put(MEAL_PLAN_KEY, &raw));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist meal plan, keeping in-memory copy");
        }
    }
}

fn set_aside<S: BlobStore>(store: &mut S, raw: &str) -> bool {
    match store.put(UNREADABLE_PLAN_KEY, raw) {
        Ok(()) => {
            warn!(key = UNREADABLE_PLAN_KEY, "unreadable meal plan copied aside");
            true
        }
        Err(e) => {
            error!(error = %e, "could not copy unreadable meal plan aside, changes will not be saved");
            false
        }
    }
}
