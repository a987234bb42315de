use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about = "Weekly meal planner with AI recipe suggestions", long_about = None)]
pub struct Cli {
    /// Directory the meal plan is stored in (overrides MEAL_PLANNER_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Environment variable holding the model API key
    #[arg(long, global = true)]
    pub api_key_env: Option<String>,

    /// Model id sent to the chat-completion endpoint (overrides MEAL_PLANNER_MODEL)
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// List the recipe options
    Options,
    /// Ask the model for a recipe
    Suggest {
        /// Option id, e.g. `swedish` or `hidden_veggies`
        option: String,
        /// Number of people to cook for (1-20)
        #[arg(short, long, default_value_t = 4)]
        family_size: i64,
        /// Add the suggestion to the meal plan
        #[arg(long)]
        add: bool,
    },
    /// Meal plan management
    Meals {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Ingredients of a meal
    Ingredient {
        #[command(subcommand)]
        command: IngredientCommands,
    },
    /// Print the shopping list for the whole plan
    ShoppingList,
}

#[derive(Subcommand, Debug)]
pub enum MealCommands {
    /// Show every meal with its ingredients
    List,
    /// Add a meal by name
    Add { name: String },
    /// Delete the meal at a position (as shown by `meals list`)
    Delete { index: usize },
}

#[derive(Subcommand, Debug)]
pub enum IngredientCommands {
    /// Append an ingredient to a meal
    Add { meal: usize, ingredient: String },
    /// Delete an ingredient by position
    Delete { meal: usize, index: usize },
}

impl Cli {
    /// Lays CLI flags over settings resolved from the environment.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(var) = &self.api_key_env {
            settings.api_key_env_var = var.clone();
        }
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
