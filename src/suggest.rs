//! Recipe suggestions: validate, consult the cache, prompt the generator,
//! and keep the first good answer per (option, family size).

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use crate::api_connection::endpoints::Provider;
use crate::cache::{cache_key, SuggestionCache};
use crate::catalog::RecipeOption;
use crate::config::Settings;
use crate::error::SuggestionError;
use crate::extract::parse_recipe_response;
use crate::generator::TextGenerator;
use crate::prompt::build_recipe_prompt;
use crate::recipe::Recipe;
use crate::validation::{validate_family_size, ValidationError};

pub struct RecipeService {
    generator: Arc<dyn TextGenerator>,
    cache: Mutex<SuggestionCache>,
}

impl RecipeService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_cache(generator, SuggestionCache::new())
    }

    pub fn with_cache(generator: Arc<dyn TextGenerator>, cache: SuggestionCache) -> Self {
        Self {
            generator,
            cache: Mutex::new(cache),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let cache = match settings.cache_capacity {
            Some(capacity) => SuggestionCache::with_capacity(capacity),
            None => SuggestionCache::new(),
        };
        Self::with_cache(Arc::new(Provider::from_settings(settings)), cache)
    }

    /// Returns the cached recipe for this option and size, generating one
    /// on a miss. Family size is checked before anything else happens.
    pub async fn request_recipe(
        &self,
        option: &RecipeOption,
        family_size: i64,
    ) -> Result<Recipe, SuggestionError> {
        let family_size = checked_family_size(family_size)?;
        let key = cache_key(&option.id, family_size);

        let cached = self.cache().get(&key);
        if let Some(recipe) = cached {
            info!(key = %key, "suggestion cache hit");
            return Ok(recipe);
        }
        info!(key = %key, "suggestion cache miss");

        self.generate_and_cache(option, family_size, key).await
    }

    /// Skips the cache lookup and replaces whatever was cached on success.
    pub async fn regenerate_recipe(
        &self,
        option: &RecipeOption,
        family_size: i64,
    ) -> Result<Recipe, SuggestionError> {
        let family_size = checked_family_size(family_size)?;
        let key = cache_key(&option.id, family_size);
        self.generate_and_cache(option, family_size, key).await
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub fn cached_suggestions(&self) -> usize {
        self.cache().len()
    }

    async fn generate_and_cache(
        &self,
        option: &RecipeOption,
        family_size: u32,
        key: String,
    ) -> Result<Recipe, SuggestionError> {
        let prompt = build_recipe_prompt(option, family_size);

        let raw = self.generator.generate(&prompt).await.map_err(|e| {
            let err = SuggestionError::from(e);
            match &err {
                SuggestionError::Configuration(var) => {
                    error!(env_var = %var, "model credential is not configured")
                }
                _ => error!(option = %option.id, error = %err, "recipe generation failed"),
            }
            err
        })?;
        debug!(option = %option.id, raw = %raw, "raw generator output");

        let recipe = parse_recipe_response(&raw, option, family_size).map_err(|e| {
            warn!(option = %option.id, error = %e, raw = %raw, "unusable generator output");
            SuggestionError::MalformedResponse(e)
        })?;

        info!(key = %key, recipe = %recipe.name, "caching generated recipe");
        self.cache().insert(key, recipe.clone());
        Ok(recipe)
    }

    fn cache(&self) -> MutexGuard<'_, SuggestionCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn checked_family_size(family_size: i64) -> Result<u32, ValidationError> {
    validate_family_size(family_size)?;
    u32::try_from(family_size).map_err(|_| ValidationError::FamilySizeTooLarge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_connection::connection::ApiConnectionError;
    use crate::catalog::find_option;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: Result<String, fn() -> ApiConnectionError>,
        calls: AtomicUsize,
        last_prompt: Mutex<String>,
    }

    impl Scripted {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(String::new()),
            })
        }

        fn failing(err: fn() -> ApiConnectionError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(String::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String, ApiConnectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = prompt.to_string();
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    const REPLY: &str = r#"Visst! {"name":"Köttbullar","description":"Klassiker","ingredients":["500 g köttfärs"],"instructions":["Blanda"],"servings":4,"prepTime":"45 minuter","cuisine":"swedish","type":"gourmet"}"#;

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let generator = Scripted::ok(REPLY);
        let service = RecipeService::new(generator.clone());
        let option = find_option("swedish").unwrap();

        let first = service.request_recipe(&option, 4).await.unwrap();
        let second = service.request_recipe(&option, 4).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(generator.calls(), 1);
        assert!(generator.last_prompt.lock().unwrap().contains("Svensk Gourmet"));
    }

    #[tokio::test]
    async fn different_family_size_is_a_different_entry() {
        let generator = Scripted::ok(REPLY);
        let service = RecipeService::new(generator.clone());
        let option = find_option("swedish").unwrap();

        service.request_recipe(&option, 4).await.unwrap();
        let for_six = service.request_recipe(&option, 6).await.unwrap();

        assert_eq!(for_six.servings, 6);
        assert_eq!(generator.calls(), 2);
        assert_eq!(service.cached_suggestions(), 2);
    }

    #[tokio::test]
    async fn invalid_family_size_never_reaches_the_generator() {
        let generator = Scripted::ok(REPLY);
        let service = RecipeService::new(generator.clone());
        let option = find_option("swedish").unwrap();

        for size in [0, -1, 21] {
            let err = service.request_recipe(&option, size).await.unwrap_err();
            assert!(matches!(err, SuggestionError::Validation(_)));
        }
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn response_without_json_is_malformed_and_not_cached() {
        let generator = Scripted::ok("Jag kan tyvärr inte hjälpa till med det.");
        let service = RecipeService::new(generator.clone());
        let option = find_option("french").unwrap();

        let err = service.request_recipe(&option, 3).await.unwrap_err();
        assert!(matches!(err, SuggestionError::MalformedResponse(_)));
        assert_eq!(service.cached_suggestions(), 0);

        service.request_recipe(&option, 3).await.unwrap_err();
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn missing_credential_is_a_configuration_error() {
        let generator =
            Scripted::failing(|| ApiConnectionError::MissingApiKey("OPENROUTER_API_KEY".into()));
        let service = RecipeService::new(generator);
        let option = find_option("asian").unwrap();

        let err = service.request_recipe(&option, 2).await.unwrap_err();
        assert!(matches!(err, SuggestionError::Configuration(_)));
    }

    #[tokio::test]
    async fn upstream_failure_is_reported_as_upstream() {
        let generator = Scripted::failing(|| ApiConnectionError::Timeout);
        let service = RecipeService::new(generator);
        let option = find_option("italian").unwrap();

        let err = service.request_recipe(&option, 2).await.unwrap_err();
        assert!(matches!(err, SuggestionError::Upstream(ApiConnectionError::Timeout)));
        assert_eq!(service.cached_suggestions(), 0);
    }

    #[tokio::test]
    async fn regenerate_bypasses_the_cache() {
        let generator = Scripted::ok(REPLY);
        let service = RecipeService::new(generator.clone());
        let option = find_option("swedish").unwrap();

        service.request_recipe(&option, 4).await.unwrap();
        service.regenerate_recipe(&option, 4).await.unwrap();
        service.request_recipe(&option, 4).await.unwrap();

        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn clear_cache_forces_a_new_call() {
        let generator = Scripted::ok(REPLY);
        let service = RecipeService::new(generator.clone());
        let option = find_option("swedish").unwrap();

        service.request_recipe(&option, 4).await.unwrap();
        service.clear_cache();
        service.request_recipe(&option, 4).await.unwrap();

        assert_eq!(generator.calls(), 2);
    }
}
