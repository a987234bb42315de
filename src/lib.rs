pub mod api_connection;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod generator;
pub mod meal_plan;
pub mod prompt;
pub mod recipe;
pub mod server;
pub mod shopping;
pub mod store;
pub mod suggest;
pub mod validation;

pub use catalog::{Category, RecipeOption};
pub use error::{PersistenceError, PlanError, SuggestionError};
pub use meal_plan::{Meal, MealPlanStore};
pub use recipe::{Recipe, RecipeKind};
pub use suggest::RecipeService;
