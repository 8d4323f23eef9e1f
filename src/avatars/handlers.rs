use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument};

use crate::{auth::dto::PublicUser, auth::jwt::CurrentUser, state::AppState};

use super::service::store_avatar;

pub fn avatar_routes() -> Router<AppState> {
    Router::new()
        .route("/upload-avatar/", post(upload_avatar))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

#[instrument(skip(state, user, mp), fields(user_id = %user.0.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    user: CurrentUser,
    mut mp: Multipart,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let mut file: Option<(Bytes, String)> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field.bytes().await.map_err(internal)?;
            file = Some((data, content_type));
            break;
        }
    }

    let Some((body, content_type)) = file else {
        return Err((StatusCode::BAD_REQUEST, "file is required".into()));
    };

    let updated = store_avatar(&state, &user.0, body, &content_type)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(avatar_url = ?updated.avatar_url, "avatar updated");
    Ok(Json(PublicUser::from(updated)))
}

fn internal<E: std::error::Error>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
