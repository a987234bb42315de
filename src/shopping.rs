use crate::meal_plan::Meal;

/// Every ingredient of every meal, meal order first, duplicates kept.
pub fn derive_shopping_list(meals: &[Meal]) -> Vec<String> {
    meals
        .iter()
        .flat_map(|meal| meal.ingredients.iter().cloned())
        .collect()
}
