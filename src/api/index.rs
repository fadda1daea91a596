//! Landing page: catalog counts and the per-session visit counter

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppResult, models::stats::CatalogCounts, AppState};

#[derive(Serialize, ToSchema)]
pub struct IndexResponse {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    /// Landing-page visits in this session, including this one
    pub num_visits: i64,
}

/// Catalog summary
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog counts and visit counter", body = IndexResponse)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<IndexResponse>)> {
    let cookie_name = state.config.session.cookie_name.clone();

    let existing = jar
        .get(&cookie_name)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());
    let (session_id, jar) = match existing {
        Some(id) => (id, jar),
        None => {
            let id = Uuid::new_v4();
            let cookie = Cookie::build((cookie_name, id.to_string()))
                .path("/")
                .http_only(true);
            (id, jar.add(cookie))
        }
    };

    let counts = state.services.catalog.counts().await?;
    let num_visits = state.services.sessions.record_visit(session_id).await?;

    Ok((jar, Json(IndexResponse { counts, num_visits })))
}
