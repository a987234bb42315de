use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::catalog::{find_option, recipe_options, Category, RecipeOption};
use crate::error::{PlanError, SuggestionError};
use crate::meal_plan::{Meal, MealPlanStore};
use crate::recipe::Recipe;
use crate::store::BlobStore;
use crate::suggest::RecipeService;
use crate::validation::{sanitize_input, validate_family_size_number, ValidationError};

pub type SharedPlan = Arc<Mutex<MealPlanStore<Box<dyn BlobStore>>>>;

#[derive(Clone)]
pub struct AppState {
    pub recipes: Arc<RecipeService>,
    pub plan: SharedPlan,
}

impl AppState {
    pub fn new(recipes: RecipeService, plan: MealPlanStore<Box<dyn BlobStore>>) -> Self {
        Self {
            recipes: Arc::new(recipes),
            plan: Arc::new(Mutex::new(plan)),
        }
    }

    /// Runs `f` against the plan on the blocking pool, since mutations write
    /// the plan to disk before returning.
    async fn with_plan<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut MealPlanStore<Box<dyn BlobStore>>) -> T + Send + 'static,
        T: Send + 'static,
    {
        let plan = self.plan.clone();
        tokio::task::spawn_blocking(move || {
            let mut plan = plan.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut plan)
        })
        .await
        .map_err(|e| {
            error!(error = %e, "meal plan task failed");
            AppError::internal("Meal plan unavailable")
        })
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl From<SuggestionError> for AppError {
    fn from(err: SuggestionError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.public_message(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Validation(e) => e.into(),
            other => Self::not_found(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct OptionPayload {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    #[serde(default)]
    pub option: Option<OptionPayload>,
    #[serde(rename = "familySize", default)]
    pub family_size: Option<Value>,
    /// Skip the suggestion cache and ask the generator again.
    #[serde(default)]
    pub regenerate: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewMeal {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewIngredient {
    pub ingredient: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptRecipe {
    pub recipe: Recipe,
}

/// Resolves a client-supplied option against the catalog. `id`, `name` and
/// `type` must all be present; the catalog entry wins for prompt content.
pub fn resolve_option(payload: Option<OptionPayload>) -> Result<RecipeOption, SuggestionError> {
    let payload = payload.ok_or_else(|| SuggestionError::InvalidOption("missing option".into()))?;

    let present = |field: &Option<String>| {
        field
            .as_deref()
            .map(sanitize_input)
            .filter(|s| !s.is_empty())
    };
    let id = present(&payload.id)
        .ok_or_else(|| SuggestionError::InvalidOption("missing id".into()))?;
    present(&payload.name).ok_or_else(|| SuggestionError::InvalidOption("missing name".into()))?;
    let category = present(&payload.category)
        .and_then(|c| Category::parse(&c))
        .ok_or_else(|| SuggestionError::InvalidOption("missing or unknown type".into()))?;

    let option = find_option(&id)
        .ok_or_else(|| SuggestionError::InvalidOption(format!("unknown option {id}")))?;
    if option.category != category {
        return Err(SuggestionError::InvalidOption(format!(
            "option {id} is not {category}"
        )));
    }
    Ok(option)
}

fn family_size_from(value: Option<&Value>) -> Result<i64, ValidationError> {
    match value {
        Some(Value::Number(n)) => validate_family_size_number(n),
        _ => Err(ValidationError::FamilySizeTooSmall),
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/options", get(list_options))
        .route("/api/recipes", post(request_recipe))
        .route("/api/meals", get(list_meals).post(add_meal))
        .route("/api/meals/from-recipe", post(add_recipe_as_meal))
        .route("/api/meals/{index}", delete(delete_meal))
        .route("/api/meals/{index}/ingredients", post(add_ingredient))
        .route(
            "/api/meals/{index}/ingredients/{ingredient}",
            delete(delete_ingredient),
        )
        .route("/api/shopping-list", get(shopping_list))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("meal planner listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("meal planner shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_options() -> Json<Vec<RecipeOption>> {
    Json(recipe_options())
}

async fn request_recipe(
    State(state): State<AppState>,
    Json(request): Json<RecipeRequest>,
) -> Result<Json<Value>, AppError> {
    let option = resolve_option(request.option)?;
    let family_size = family_size_from(request.family_size.as_ref())?;

    let recipe = if request.regenerate {
        state.recipes.regenerate_recipe(&option, family_size).await?
    } else {
        state.recipes.request_recipe(&option, family_size).await?
    };
    Ok(Json(json!({ "recipe": recipe })))
}

async fn list_meals(State(state): State<AppState>) -> Result<Json<Vec<Meal>>, AppError> {
    let meals = state.with_plan(|plan| plan.meals().to_vec()).await?;
    Ok(Json(meals))
}

async fn add_meal(
    State(state): State<AppState>,
    Json(body): Json<NewMeal>,
) -> Result<(StatusCode, Json<Vec<Meal>>), AppError> {
    let meals = state
        .with_plan(move |plan| plan.add_meal(&body.name).map(|()| plan.meals().to_vec()))
        .await??;
    Ok((StatusCode::CREATED, Json(meals)))
}

async fn delete_meal(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<Vec<Meal>>, AppError> {
    let meals = state
        .with_plan(move |plan| {
            plan.delete_meal(index);
            plan.meals().to_vec()
        })
        .await?;
    Ok(Json(meals))
}

async fn add_ingredient(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(body): Json<NewIngredient>,
) -> Result<Json<Vec<Meal>>, AppError> {
    let meals = state
        .with_plan(move |plan| {
            plan.try_add_ingredient(index, &body.ingredient)
                .map(|()| plan.meals().to_vec())
        })
        .await??;
    Ok(Json(meals))
}

async fn delete_ingredient(
    State(state): State<AppState>,
    Path((index, ingredient)): Path<(usize, usize)>,
) -> Result<Json<Vec<Meal>>, AppError> {
    let meals = state
        .with_plan(move |plan| {
            plan.delete_ingredient(index, ingredient);
            plan.meals().to_vec()
        })
        .await?;
    Ok(Json(meals))
}

async fn add_recipe_as_meal(
    State(state): State<AppState>,
    Json(body): Json<AcceptRecipe>,
) -> Result<(StatusCode, Json<Vec<Meal>>), AppError> {
    let meals = state
        .with_plan(move |plan| {
            plan.add_recipe_as_meal(body.recipe);
            plan.meals().to_vec()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(meals)))
}

async fn shopping_list(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let items = state.with_plan(|plan| plan.shopping_list()).await?;
    Ok(Json(items))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_connection::connection::ApiConnectionError;
    use crate::generator::TextGenerator;
    use crate::store::MemoryBlobStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct Canned {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String, ApiConnectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(text.to_string()),
                None => Err(ApiConnectionError::MissingApiKey("OPENROUTER_API_KEY".into())),
            }
        }
    }

    const REPLY: &str = r#"Här är receptet: {"name":"Köttbullar","description":"...","ingredients":["500 g köttfärs"],"instructions":["Blanda"],"servings":4,"prepTime":"45 minuter","cuisine":"swedish","type":"gourmet"} Smaklig måltid!"#;

    fn test_state(reply: Option<&'static str>) -> (AppState, Arc<Canned>) {
        let generator = Arc::new(Canned {
            reply,
            calls: AtomicUsize::new(0),
        });
        let recipes = RecipeService::new(generator.clone());
        let store: Box<dyn BlobStore> = Box::new(MemoryBlobStore::new());
        (AppState::new(recipes, MealPlanStore::open(store)), generator)
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> axum::response::Response {
        let app = build_router(state.clone());
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn swedish() -> Value {
        json!({ "id": "swedish", "name": "Svensk Gourmet", "type": "gourmet" })
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn options_lists_the_catalog() {
        let (state, _) = test_state(Some(REPLY));
        let resp = send(&state, "GET", "/api/options", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json.as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn recipe_request_returns_the_parsed_recipe() {
        let (state, generator) = test_state(Some(REPLY));
        let body = json!({ "option": swedish(), "familySize": 4 });

        let resp = send(&state, "POST", "/api/recipes", Some(body.clone())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["recipe"]["name"], "Köttbullar");
        assert_eq!(json["recipe"]["ingredients"], json!(["500 g köttfärs"]));

        let again = send(&state, "POST", "/api/recipes", Some(body)).await;
        assert_eq!(again.status(), StatusCode::OK);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_option_is_a_client_error() {
        let (state, generator) = test_state(Some(REPLY));
        for option in [
            Value::Null,
            json!({ "name": "Svensk Gourmet", "type": "gourmet" }),
            json!({ "id": "swedish", "type": "gourmet" }),
            json!({ "id": "swedish", "name": "Svensk Gourmet" }),
            json!({ "id": "klingon", "name": "Klingon", "type": "gourmet" }),
        ] {
            let resp = send(
                &state,
                "POST",
                "/api/recipes",
                Some(json!({ "option": option, "familySize": 4 })),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(resp).await["error"], "Invalid recipe option");
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn family_size_out_of_range_is_a_client_error() {
        let (state, generator) = test_state(Some(REPLY));
        for size in [json!(0), json!(21), json!(2.5), json!("4"), Value::Null] {
            let resp = send(
                &state,
                "POST",
                "/api/recipes",
                Some(json!({ "option": swedish(), "familySize": size })),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "size {size}");
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_credential_is_a_server_error() {
        let (state, _) = test_state(None);
        let resp = send(
            &state,
            "POST",
            "/api/recipes",
            Some(json!({ "option": swedish(), "familySize": 4 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "API key not configured");
    }

    #[tokio::test]
    async fn malformed_output_gets_the_generic_message() {
        let (state, _) = test_state(Some("Inget recept, tyvärr."));
        let resp = send(
            &state,
            "POST",
            "/api/recipes",
            Some(json!({ "option": swedish(), "familySize": 4 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "Failed to generate recipe");
    }

    #[tokio::test]
    async fn meal_plan_round_trip_over_http() {
        let (state, _) = test_state(Some(REPLY));

        let resp = send(&state, "POST", "/api/meals", Some(json!({ "name": "Tacos" }))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = send(&state, "POST", "/api/meals", Some(json!({ "name": "Ta" }))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = send(&state, "POST", "/api/meals", Some(json!({ "name": "T" }))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["error"],
            "Måltidsnamn måste vara minst 2 tecken"
        );

        let resp = send(
            &state,
            "POST",
            "/api/meals/0/ingredients",
            Some(json!({ "ingredient": "tortillas" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(
            &state,
            "POST",
            "/api/meals/7/ingredients",
            Some(json!({ "ingredient": "lök" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&state, "DELETE", "/api/meals/1", None).await;
        let meals = body_json(resp).await;
        assert_eq!(meals.as_array().unwrap().len(), 1);

        let resp = send(&state, "GET", "/api/shopping-list", None).await;
        assert_eq!(body_json(resp).await, json!(["tortillas"]));

        let resp = send(&state, "DELETE", "/api/meals/0/ingredients/0", None).await;
        assert_eq!(body_json(resp).await[0]["ingredients"], json!([]));
    }

    #[tokio::test]
    async fn accepted_recipe_becomes_a_meal() {
        let (state, _) = test_state(Some(REPLY));
        let resp = send(
            &state,
            "POST",
            "/api/recipes",
            Some(json!({ "option": swedish(), "familySize": 4 })),
        )
        .await;
        let recipe = body_json(resp).await["recipe"].clone();

        let resp = send(
            &state,
            "POST",
            "/api/meals/from-recipe",
            Some(json!({ "recipe": recipe })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let meals = body_json(resp).await;
        assert_eq!(meals[0]["name"], "Köttbullar");
        assert_eq!(meals[0]["type"], "gourmet");
        assert_eq!(meals[0]["recipe"]["servings"], 4);

        let resp = send(&state, "GET", "/api/shopping-list", None).await;
        assert_eq!(body_json(resp).await, json!(["500 g köttfärs"]));
    }

    #[tokio::test]
    async fn meal_changes_over_http_reach_the_store() {
        let generator = Arc::new(Canned {
            reply: Some(REPLY),
            calls: AtomicUsize::new(0),
        });
        let store = MemoryBlobStore::new();
        let boxed: Box<dyn BlobStore> = Box::new(store.clone());
        let state = AppState::new(RecipeService::new(generator), MealPlanStore::open(boxed));

        let resp = send(&state, "POST", "/api/meals", Some(json!({ "name": "Tacos" }))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        send(
            &state,
            "POST",
            "/api/meals/0/ingredients",
            Some(json!({ "ingredient": "tortillas" })),
        )
        .await;

        let reopened = MealPlanStore::open(store);
        assert_eq!(reopened.meals().len(), 1);
        assert_eq!(reopened.shopping_list(), vec!["tortillas"]);
    }
}
