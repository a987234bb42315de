use serde::{Deserialize, Serialize};
use std::fmt;

/// Which family of recipe the generator is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    HiddenVeggies,
    Gourmet,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::HiddenVeggies => "hidden_veggies",
            Category::Gourmet => "gourmet",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hidden_veggies" => Some(Category::HiddenVeggies),
            "gourmet" => Some(Category::Gourmet),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOption {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub category: Category,
}

struct OptionDef {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    category: Category,
}

const RECIPE_OPTIONS: &[OptionDef] = &[
    OptionDef {
        id: "hidden_veggies",
        name: "Barnfavoriter med Dolda Grönsaker",
        description: "Barnvänliga rätter där grönsakerna är listigt gömda",
        icon: "🥕",
        category: Category::HiddenVeggies,
    },
    OptionDef {
        id: "swedish",
        name: "Svensk Gourmet",
        description: "Förfinad svensk husmanskost",
        icon: "👨‍🍳",
        category: Category::Gourmet,
    },
    OptionDef {
        id: "italian",
        name: "Italiensk Gourmet",
        description: "Elegant italiensk matlagning",
        icon: "🍝",
        category: Category::Gourmet,
    },
    OptionDef {
        id: "french",
        name: "Fransk Gourmet",
        description: "Klassisk fransk fine dining",
        icon: "🥖",
        category: Category::Gourmet,
    },
    OptionDef {
        id: "asian",
        name: "Asiatisk Gourmet",
        description: "Sofistikerad asiatisk fusion",
        icon: "🥢",
        category: Category::Gourmet,
    },
    OptionDef {
        id: "middleeastern",
        name: "Mellanöstern Gourmet",
        description: "Aromatisk mat från Mellanöstern",
        icon: "🧆",
        category: Category::Gourmet,
    },
];

impl From<&OptionDef> for RecipeOption {
    fn from(def: &OptionDef) -> Self {
        RecipeOption {
            id: def.id.to_string(),
            name: def.name.to_string(),
            description: def.description.to_string(),
            icon: def.icon.to_string(),
            category: def.category,
        }
    }
}

/// The six selectable options, in display order.
pub fn recipe_options() -> Vec<RecipeOption> {
    RECIPE_OPTIONS.iter().map(RecipeOption::from).collect()
}

pub fn find_option(id: &str) -> Option<RecipeOption> {
    RECIPE_OPTIONS
        .iter()
        .find(|def| def.id == id)
        .map(RecipeOption::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn six_options_with_unique_ids() {
        let options = recipe_options();
        assert_eq!(options.len(), 6);
        let ids: HashSet<_> = options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn only_the_first_option_hides_veggies() {
        let options = recipe_options();
        assert_eq!(options[0].category, Category::HiddenVeggies);
        assert!(options[1..].iter().all(|o| o.category == Category::Gourmet));
    }

    #[test]
    fn find_option_by_id() {
        let swedish = find_option("swedish").unwrap();
        assert_eq!(swedish.name, "Svensk Gourmet");
        assert!(find_option("mexican").is_none());
    }

    #[test]
    fn option_serializes_category_as_type() {
        let json = serde_json::to_value(find_option("hidden_veggies").unwrap()).unwrap();
        assert_eq!(json["type"], "hidden_veggies");
        assert_eq!(json["id"], "hidden_veggies");
    }
}
