use anyhow::{bail, Context, Result};
use meal_planner::catalog::{find_option, recipe_options};
use meal_planner::cli::{parse_args, Commands, IngredientCommands, MealCommands};
use meal_planner::config::Settings;
use meal_planner::meal_plan::MealPlanStore;
use meal_planner::recipe::Recipe;
use meal_planner::server::{run_serve, AppState};
use meal_planner::store::{BlobStore, FileBlobStore};
use meal_planner::suggest::RecipeService;

fn open_plan(settings: &Settings) -> MealPlanStore<Box<dyn BlobStore>> {
    let store: Box<dyn BlobStore> = Box::new(FileBlobStore::new(&settings.data_dir));
    MealPlanStore::open(store)
}

fn print_recipe(recipe: &Recipe) {
    println!("{} ({}, {} portioner)", recipe.name, recipe.prep_time, recipe.servings);
    if !recipe.description.is_empty() {
        println!("{}", recipe.description);
    }
    println!("\nIngredienser:");
    for ingredient in &recipe.ingredients {
        println!("  - {ingredient}");
    }
    if let Some(veggies) = recipe.hidden_veggies() {
        if !veggies.is_empty() {
            println!("\nDolda grönsaker: {}", veggies.join(", "));
        }
    }
    println!("\nGör så här:");
    for (i, step) in recipe.instructions.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
}

fn print_plan<S: BlobStore>(plan: &MealPlanStore<S>) {
    if plan.meals().is_empty() {
        println!("Inga måltider planerade.");
        return;
    }
    for (i, meal) in plan.meals().iter().enumerate() {
        println!("[{i}] {} ({})", meal.name, meal.category);
        for (j, ingredient) in meal.ingredients.iter().enumerate() {
            println!("    [{j}] {ingredient}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    let mut settings = Settings::from_env().context("Failed to read settings from environment")?;
    cli.apply(&mut settings);

    match cli.command {
        Commands::Serve { bind, port } => {
            if settings.api_key().is_none() {
                tracing::warn!(
                    env_var = %settings.api_key_env_var,
                    "no model credential set, recipe suggestions will fail"
                );
            }
            let state = AppState::new(RecipeService::from_settings(&settings), open_plan(&settings));
            run_serve(state, &bind, port).await?;
        }
        Commands::Options => {
            for option in recipe_options() {
                println!("{} {:<14} {} ({})", option.icon, option.id, option.name, option.description);
            }
        }
        Commands::Suggest {
            option,
            family_size,
            add,
        } => {
            let Some(option) = find_option(&option) else {
                bail!("Unknown recipe option '{option}', see `meal-planner options`");
            };
            let service = RecipeService::from_settings(&settings);
            let recipe = service
                .request_recipe(&option, family_size)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e.public_message()))?;
            print_recipe(&recipe);
            if add {
                let mut plan = open_plan(&settings);
                plan.add_recipe_as_meal(recipe);
                println!("\nTillagd i måltidsplanen.");
            }
        }
        Commands::Meals { command } => {
            let mut plan = open_plan(&settings);
            match command {
                MealCommands::List => print_plan(&plan),
                MealCommands::Add { name } => {
                    plan.add_meal(&name)?;
                    print_plan(&plan);
                }
                MealCommands::Delete { index } => {
                    if plan.delete_meal(index).is_none() {
                        println!("Ingen måltid på plats {index}.");
                    }
                    print_plan(&plan);
                }
            }
        }
        Commands::Ingredient { command } => {
            let mut plan = open_plan(&settings);
            match command {
                IngredientCommands::Add { meal, ingredient } => {
                    plan.try_add_ingredient(meal, &ingredient)?;
                }
                IngredientCommands::Delete { meal, index } => {
                    if plan.delete_ingredient(meal, index).is_none() {
                        println!("Ingen ingrediens på plats {index} i måltid {meal}.");
                    }
                }
            }
            print_plan(&plan);
        }
        Commands::ShoppingList => {
            let plan = open_plan(&settings);
            for item in plan.shopping_list() {
                println!("- {item}");
            }
        }
    }

    Ok(())
}
