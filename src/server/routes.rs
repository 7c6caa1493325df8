use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query, State as AxumState},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
        StatusCode,
    },
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{error::ApiError, metrics, state::State};
use crate::auth::{self, AccessToken, AuthError, GoogleAuthRequest};
use crate::drill;
use crate::user::User;
use crate::vocabulary::{Attempt, Statistics, Word, WordFilter, WordId};

/// The authenticated caller, resolved from the `Authorization: Bearer` header
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<State>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<State>) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiError::Unauthorized)?
            .to_string();

        let user = {
            let store = state.store()?;
            auth::authenticate(&store, &token, Utc::now())?
        };

        match user {
            Some(user) => Ok(CurrentUser { user, token }),
            None => {
                warn!("Rejected request with invalid or expired token");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Comma-separated category/level lists, e.g. `?categories=animals,food&levels=simple`
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub categories: Option<String>,
    pub levels: Option<String>,
}

impl From<FilterQuery> for WordFilter {
    fn from(query: FilterQuery) -> Self {
        WordFilter::new(split_list(query.categories), split_list(query.levels))
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct AttemptRequest {
    pub word_id: WordId,
    #[serde(alias = "mistake_count")]
    pub typo_count: i64,
}

#[derive(Debug, Serialize)]
pub struct OAuthConfig {
    pub google_client_id: String,
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<impl IntoResponse, ApiError> {
    let body = metrics::render(state.uptime()).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

pub async fn oauth_config_handler(AxumState(state): AxumState<Arc<State>>) -> Json<OAuthConfig> {
    Json(OAuthConfig {
        google_client_id: state.config.google_client_id.clone().unwrap_or_default(),
    })
}

pub async fn google_auth_handler(
    AxumState(state): AxumState<Arc<State>>,
    Json(request): Json<GoogleAuthRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    let provider = state.identity().ok_or(AuthError::NotConfigured)?;
    let profile = provider.exchange_code(&request).await?;

    let (user, token) = {
        let store = state.store()?;
        auth::sign_in(&store, &profile, state.token_ttl())?
    };

    info!("User {} signed in", user.id);
    Ok(Json(token))
}

pub async fn me_handler(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

pub async fn logout_handler(
    AxumState(state): AxumState<Arc<State>>,
    current: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    {
        let store = state.store()?;
        auth::revoke(&store, &current.token)?;
    }

    info!("User {} logged out", current.user.id);
    Ok(Json(json!({ "message": "Successfully logged out" })))
}

pub async fn random_word_handler(
    AxumState(state): AxumState<Arc<State>>,
    current: CurrentUser,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Word>, ApiError> {
    let filter = WordFilter::from(query);
    let store = state.store()?;
    let word = drill::select_word(&*store, current.user.id, &filter, &mut rand::thread_rng())?;
    Ok(Json(word))
}

pub async fn attempt_handler(
    AxumState(state): AxumState<Arc<State>>,
    current: CurrentUser,
    Json(request): Json<AttemptRequest>,
) -> Result<(StatusCode, Json<Attempt>), ApiError> {
    let store = state.store()?;
    let attempt = drill::record_attempt(
        &*store,
        current.user.id,
        request.word_id,
        request.typo_count,
    )?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

pub async fn statistics_handler(
    AxumState(state): AxumState<Arc<State>>,
    current: CurrentUser,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Statistics>, ApiError> {
    let filter = WordFilter::from(query);
    let store = state.store()?;
    let stats = drill::compute_statistics(&*store, current.user.id, &filter)?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[test]
    fn test_filter_query_conversion() {
        let filter = WordFilter::from(FilterQuery {
            categories: Some("animals, food,,".to_string()),
            levels: None,
        });
        assert_eq!(filter, WordFilter::categories(["animals", "food"]));

        assert!(WordFilter::from(FilterQuery::default()).is_empty());
    }

    #[test]
    fn test_attempt_request_accepts_both_field_names() {
        let a: AttemptRequest = serde_json::from_str(r#"{"word_id": 1, "typo_count": 5}"#).unwrap();
        let b: AttemptRequest =
            serde_json::from_str(r#"{"word_id": 1, "mistake_count": -2}"#).unwrap();
        assert_eq!(a.typo_count, 5);
        assert_eq!(b.typo_count, -2);
    }
}
