use thiserror::Error;

pub const MEAL_NAME_MIN_LENGTH: usize = 2;
pub const MEAL_NAME_MAX_LENGTH: usize = 100;
pub const INGREDIENT_MAX_LENGTH: usize = 200;
pub const FAMILY_SIZE_MIN: i64 = 1;
pub const FAMILY_SIZE_MAX: i64 = 20;

/// A rejected piece of user input. `Display` yields the message shown next
/// to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Måltidsnamn krävs")]
    MealNameEmpty,
    #[error("Måltidsnamn måste vara minst {} tecken", MEAL_NAME_MIN_LENGTH)]
    MealNameTooShort,
    #[error("Måltidsnamn får vara max {} tecken", MEAL_NAME_MAX_LENGTH)]
    MealNameTooLong,
    #[error("Ingrediens krävs")]
    IngredientEmpty,
    #[error("Ingrediens får vara max {} tecken", INGREDIENT_MAX_LENGTH)]
    IngredientTooLong,
    #[error("Antal personer måste vara minst {}", FAMILY_SIZE_MIN)]
    FamilySizeTooSmall,
    #[error("Antal personer får vara max {}", FAMILY_SIZE_MAX)]
    FamilySizeTooLarge,
}

// Lengths are counted in chars so that "Ärtsoppa" is eight long, not nine.
fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub fn validate_meal_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MealNameEmpty);
    }
    let len = char_len(trimmed);
    if len < MEAL_NAME_MIN_LENGTH {
        return Err(ValidationError::MealNameTooShort);
    }
    if len > MEAL_NAME_MAX_LENGTH {
        return Err(ValidationError::MealNameTooLong);
    }
    Ok(())
}

pub fn validate_ingredient(ingredient: &str) -> Result<(), ValidationError> {
    let trimmed = ingredient.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::IngredientEmpty);
    }
    if char_len(trimmed) > INGREDIENT_MAX_LENGTH {
        return Err(ValidationError::IngredientTooLong);
    }
    Ok(())
}

pub fn validate_family_size(size: i64) -> Result<(), ValidationError> {
    if size < FAMILY_SIZE_MIN {
        return Err(ValidationError::FamilySizeTooSmall);
    }
    if size > FAMILY_SIZE_MAX {
        return Err(ValidationError::FamilySizeTooLarge);
    }
    Ok(())
}

/// Family sizes arriving as JSON numbers. Fractions and anything that does
/// not fit an `i64` count as too small, like a missing value would.
pub fn validate_family_size_number(size: &serde_json::Number) -> Result<i64, ValidationError> {
    let n = size.as_i64().ok_or(ValidationError::FamilySizeTooSmall)?;
    validate_family_size(n)?;
    Ok(n)
}

/// Trims surrounding whitespace and drops every `<` and `>`.
///
/// Anything that ends up persisted or interpolated into a prompt goes
/// through here before it is validated.
pub fn sanitize_input(input: &str) -> String {
    input.trim().chars().filter(|c| *c != '<' && *c != '>').collect()
}
