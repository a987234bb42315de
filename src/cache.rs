use std::collections::{HashMap, VecDeque};

use crate::recipe::Recipe;

/// Cache key for a suggestion request: `"{option_id}:{family_size}"`.
pub fn cache_key(option_id: &str, family_size: u32) -> String {
    format!("{option_id}:{family_size}")
}

/// Last validated recipe per (option, family size).
///
/// Unbounded unless built with [`SuggestionCache::with_capacity`], in which
/// case the least recently used entry is evicted first.
#[derive(Debug, Default)]
pub struct SuggestionCache {
    entries: HashMap<String, Recipe>,
    // Front is least recently used. Only maintained when bounded.
    order: VecDeque<String>,
    capacity: Option<usize>,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    pub fn get(&mut self, key: &str) -> Option<Recipe> {
        let recipe = self.entries.get(key).cloned()?;
        self.touch(key);
        Some(recipe)
    }

    pub fn insert(&mut self, key: String, recipe: Recipe) {
        self.entries.insert(key.clone(), recipe);
        self.touch(&key);
        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Recipe> {
        self.order.retain(|k| k != key);
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &str) {
        if self.capacity.is_none() {
            return;
        }
        self.order.retain(|k| k != key);
        self.order.push_back(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::RecipeKind;

    fn recipe(name: &str) -> Recipe {
        Recipe {
            name: name.to_string(),
            description: String::new(),
            ingredients: vec!["1 st lök".to_string()],
            instructions: vec![],
            servings: 4,
            prep_time: String::new(),
            cuisine: "swedish".to_string(),
            kind: RecipeKind::Gourmet,
        }
    }

    #[test]
    fn key_combines_option_and_size() {
        assert_eq!(cache_key("swedish", 4), "swedish:4");
        assert_ne!(cache_key("swedish", 14), cache_key("swedish1", 4));
    }

    #[test]
    fn unbounded_cache_keeps_everything() {
        let mut cache = SuggestionCache::new();
        for n in 1..=20 {
            cache.insert(cache_key("italian", n), recipe("Risotto"));
        }
        assert_eq!(cache.len(), 20);
        assert_eq!(cache.get("italian:7").unwrap().name, "Risotto");
    }

    #[test]
    fn bounded_cache_evicts_least_recently_used() {
        let mut cache = SuggestionCache::with_capacity(2);
        cache.insert("a:1".to_string(), recipe("A"));
        cache.insert("b:1".to_string(), recipe("B"));
        assert!(cache.get("a:1").is_some());
        cache.insert("c:1".to_string(), recipe("C"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b:1").is_none());
        assert!(cache.get("a:1").is_some());
        assert!(cache.get("c:1").is_some());
    }

    #[test]
    fn remove_and_clear() {
        let mut cache = SuggestionCache::with_capacity(4);
        cache.insert("a:1".to_string(), recipe("A"));
        cache.insert("b:1".to_string(), recipe("B"));
        assert_eq!(cache.remove("a:1").unwrap().name, "A");
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
