//! Axum route handlers for profile, settings and career profile.

use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::career::{
    CareerProfileInput, CareerProfileRow, SettingsInput, UserSettingsRow,
};
use crate::models::profile::{ProfileInput, ProfileRow};
use crate::profile::store::{
    get_career_profile, get_profile, get_settings, normalize_tags, upsert_career_profile,
    upsert_profile, upsert_settings,
};
use crate::state::AppState;

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileRow>, AppError> {
    get_profile(&state.db, user.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// PUT /api/v1/profile
pub async fn handle_put_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut input): Json<ProfileInput>,
) -> Result<Json<ProfileRow>, AppError> {
    // Sign-up seeds the email from the token when the form leaves it out.
    if input.email.is_none() {
        input.email = user.email.clone();
    }
    Ok(Json(upsert_profile(&state.db, user.user_id, &input).await?))
}

/// GET /api/v1/settings
pub async fn handle_get_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserSettingsRow>, AppError> {
    Ok(Json(get_settings(&state.db, user.user_id).await?))
}

/// PUT /api/v1/settings
pub async fn handle_put_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<SettingsInput>,
) -> Result<Json<UserSettingsRow>, AppError> {
    if !input.preferences.is_object() {
        return Err(AppError::Validation(
            "preferences must be a JSON object".to_string(),
        ));
    }
    Ok(Json(upsert_settings(&state.db, user.user_id, &input).await?))
}

/// GET /api/v1/career-profile
pub async fn handle_get_career_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CareerProfileRow>, AppError> {
    Ok(Json(get_career_profile(&state.db, user.user_id).await?))
}

/// PUT /api/v1/career-profile
pub async fn handle_put_career_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut input): Json<CareerProfileInput>,
) -> Result<Json<CareerProfileRow>, AppError> {
    input.skills = normalize_tags(&input.skills);
    input.interests = normalize_tags(&input.interests);
    Ok(Json(
        upsert_career_profile(&state.db, user.user_id, &input).await?,
    ))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{
        get, issue_token, test_state, FakeBilling, MemoryBillingStore,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_profile_requires_token() {
        let state = test_state(
            Arc::new(MemoryBillingStore::default()),
            Arc::new(FakeBilling::default()),
        );
        let response = get(state, "/api/v1/profile", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_settings_rejects_non_object_preferences() {
        let state = test_state(
            Arc::new(MemoryBillingStore::default()),
            Arc::new(FakeBilling::default()),
        );
        let request = Request::put("/api/v1/settings")
            .header(header::CONTENT_TYPE, "application/json")
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", issue_token(Uuid::new_v4())),
            )
            .body(Body::from(r#"{"preferences": [1, 2]}"#))
            .unwrap();
        let response = crate::routes::build_router(state)
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
