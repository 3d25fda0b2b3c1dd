use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::config::MatchingSettings;
use crate::core::{format_answer, Matcher, MatchError};
use crate::models::{
    Catalog, Category, CategoriesResponse, CategoryMatchRequest, ErrorResponse, HealthResponse,
    MatchSchemesRequest, MatchSchemesResponse, CATEGORIES,
};
use crate::services::SessionStore;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub matcher: Matcher,
    pub sessions: Arc<SessionStore>,
    pub matching: MatchingSettings,
}

/// Configure all scheme-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/schemes/match", web::post().to(match_schemes))
        .route("/schemes/categories", web::get().to(list_categories))
        .route("/schemes/categories/{label}", web::post().to(match_category))
        .route("/schemes/sessions/{session_id}", web::delete().to(end_session));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = if state.catalog.is_empty() { "degraded" } else { "healthy" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_size: state.catalog.len(),
        timestamp: chrono::Utc::now(),
    })
}

/// Match schemes endpoint
///
/// POST /api/v1/schemes/match
///
/// Request body:
/// ```json
/// {
///   "query": "string",
///   "context": "string",
///   "sessionId": "string",
///   "topN": 5
/// }
/// ```
///
/// With a `sessionId`, earlier queries of the session are used as context
/// when the request carries none. Without one, a new session is started and
/// its id returned in the response.
async fn match_schemes(
    state: web::Data<AppState>,
    req: web::Json<MatchSchemesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for match_schemes request: {:?}", errors);
        return validation_error(errors.to_string());
    }

    let req = req.into_inner();
    let top_n = state.matching.resolve_top_n(req.top_n);

    run_match(&state, req.query, req.context, req.session_id, top_n).await
}

/// List browse categories
///
/// GET /api/v1/schemes/categories
async fn list_categories() -> impl Responder {
    HttpResponse::Ok().json(CategoriesResponse {
        categories: CATEGORIES.to_vec(),
    })
}

/// Browse a category
///
/// POST /api/v1/schemes/categories/{label}
async fn match_category(
    state: web::Data<AppState>,
    label: web::Path<String>,
    req: Option<web::Json<CategoryMatchRequest>>,
) -> impl Responder {
    let req = req.map(|r| r.into_inner()).unwrap_or_default();
    if let Err(errors) = req.validate() {
        return validation_error(errors.to_string());
    }

    let category = match Category::find(&label) {
        Some(category) => category,
        None => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Unknown category".to_string(),
                message: format!("No category named '{}'", label.as_str()),
                status_code: 404,
            });
        }
    };

    let top_n = state.matching.resolve_top_n(req.top_n);
    run_match(&state, category.query(), None, req.session_id, top_n).await
}

/// End a conversation and forget its turns
///
/// DELETE /api/v1/schemes/sessions/{session_id}
async fn end_session(
    state: web::Data<AppState>,
    session_id: web::Path<String>,
) -> impl Responder {
    state.sessions.clear(&session_id).await;
    tracing::info!("Cleared session {}", session_id.as_str());
    HttpResponse::NoContent().finish()
}

/// Shared matching flow for the match endpoints
async fn run_match(
    state: &web::Data<AppState>,
    query: String,
    context: Option<String>,
    session_id: Option<String>,
    top_n: usize,
) -> HttpResponse {
    let (session_id, context) = match session_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            let context = match context.filter(|c| !c.is_empty()) {
                Some(context) => Some(context),
                None => state.sessions.context(&id).await,
            };
            (id, context)
        }
        None => (SessionStore::new_session_id(), context.filter(|c| !c.is_empty())),
    };

    tracing::info!(
        "Matching query ({} chars, context: {}, top_n: {})",
        query.len(),
        context.is_some(),
        top_n
    );

    let matcher = state.matcher.clone();
    let catalog = Arc::clone(&state.catalog);
    let blocking_query = query.clone();

    // Embedding calls block, keep them off the async workers
    let outcome = web::block(move || {
        matcher.find_matches(&blocking_query, &catalog, context.as_deref(), top_n)
    })
    .await;

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(MatchError::Embedding(e))) => {
            tracing::error!("Matching failed: {}", e);
            return HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "Embedding service unavailable".to_string(),
                message: e.to_string(),
                status_code: 503,
            });
        }
        Err(e) => {
            tracing::error!("Matching task failed: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Matching failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    state.sessions.record_turn(&session_id, &query).await;

    tracing::info!(
        "Returning {} schemes via {:?} (from {} candidates)",
        result.schemes.len(),
        result.strategy,
        result.total_candidates
    );

    HttpResponse::Ok().json(MatchSchemesResponse {
        answer: format_answer(&result.schemes),
        matches: result.schemes,
        strategy: result.strategy,
        session_id: Some(session_id),
        total_candidates: result.total_candidates,
    })
}

fn validation_error(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message,
        status_code: 400,
    })
}
