use crate::catalog::{Category, RecipeOption};

/// Units gourmet recipes are allowed to use: dl, msk, tsk, gram, styck.
pub const GOURMET_UNITS: &str = "dl, msk, tsk, gram eller styck";

/// Builds the Swedish generation prompt for `option`, pinning `servings`
/// to `family_size` and `cuisine`/`type` to known literals.
pub fn build_recipe_prompt(option: &RecipeOption, family_size: u32) -> String {
    match option.category {
        Category::HiddenVeggies => hidden_veggies_prompt(family_size),
        Category::Gourmet => gourmet_prompt(option, family_size),
    }
}

fn hidden_veggies_prompt(family_size: u32) -> String {
    format!(
        "Du är en kreativ kock som skriver på svenska.
Skapa ett recept där grönsaker är smart dolda i en barnfavorit som alla {family_size} i familjen äter.
Receptet ska vara för en familj på {family_size} personer.
VIKTIGT: Skriv alla ingredienser, instruktioner och beskrivningar på svenska.
Returnera endast ett JSON-objekt i detta format:
{{
  \"name\": \"Rättens namn på svenska\",
  \"description\": \"Kort beskrivning på svenska\",
  \"ingredients\": [\"ingrediens 1 med mängd\", \"ingrediens 2 med mängd\"],
  \"instructions\": [\"steg 1\", \"steg 2\"],
  \"servings\": {family_size},
  \"prepTime\": \"30 minuter\",
  \"cuisine\": \"Barnvänligt\",
  \"type\": \"hidden_veggies\",
  \"hiddenVeggies\": [\"gömd grönsak 1\", \"gömd grönsak 2\"]
}}"
    )
}

fn gourmet_prompt(option: &RecipeOption, family_size: u32) -> String {
    format!(
        "Du är en mästerkock specialiserad på {name} som skriver på svenska.
Skapa ett sofistikerat men genomförbart recept för en familj på {family_size} personer.
Receptet ska vara elegant men inte för komplicerat.
VIKTIGT: Skriv ALLA ingredienser, instruktioner och beskrivningar på svenska.
Enheter ska anges i {GOURMET_UNITS}.
Returnera endast ett JSON-objekt i detta format:
{{
  \"name\": \"Rättens namn på svenska\",
  \"description\": \"Kort beskrivning på svenska\",
  \"ingredients\": [\"ingrediens 1 med mängd\", \"ingrediens 2 med mängd\"],
  \"instructions\": [\"steg 1\", \"steg 2\"],
  \"servings\": {family_size},
  \"prepTime\": \"45 minuter\",
  \"cuisine\": \"{id}\",
  \"type\": \"gourmet\"
}}",
        name = option.name,
        id = option.id,
    )
}
