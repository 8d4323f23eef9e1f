use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Form, Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{MessageResponse, PublicUser, RegisterRequest, TokenRequest, TokenResponse, VerifyQuery},
        jwt::{unauthorized, JwtKeys},
        password::{hash_password, verify_password},
        repo::User,
    },
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/token", post(login))
        .route("/auth/verify", get(verify_email))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    // Ensure email is not taken
    if let Ok(Some(_)) = User::find_by_email(&state.db, &payload.email).await {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::CONFLICT, "Email already registered".into()));
    }

    let hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let user = match User::create(&state.db, &payload.email, &hash).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign_verify(&user.email) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign verify failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    // The user row stays either way; a mail outage must not fail registration.
    let mailer = state.mailer.clone();
    let email = user.email.clone();
    let link = format!(
        "{}/auth/verify?token={}",
        state.config.public_base_url.trim_end_matches('/'),
        token
    );
    tokio::spawn(async move {
        if let Err(e) = mailer.send_verification(&email, &link).await {
            error!(error = %e, %email, "verification mail failed");
        }
    });

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Form(mut payload): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, Response> {
    payload.username = payload.username.trim().to_lowercase();

    let user = match User::find_by_email(&state.db, &payload.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.username, "login unknown email");
            return Err(unauthorized("Incorrect email or password"));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(internal(e));
        }
    };

    let ok = match verify_password(&payload.password, &user.password_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err(internal(e));
        }
    };

    if !ok {
        warn!(email = %payload.username, user_id = %user.id, "login invalid password");
        return Err(unauthorized("Incorrect email or password"));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = match keys.sign_access(&user.email) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign access failed");
            return Err(internal(e));
        }
    };

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

#[instrument(skip(state, query))]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<MessageResponse>, Response> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_email_token(&query.token).map_err(|e| {
        warn!(error = %e, "email verification token rejected");
        unauthorized("Could not validate credentials")
    })?;

    let user = User::find_by_email(&state.db, &claims.sub)
        .await
        .map_err(internal)?
        .ok_or_else(|| unauthorized("Could not validate credentials"))?;

    if !user.is_active {
        User::activate(&state.db, user.id).await.map_err(internal)?;
        info!(user_id = %user.id, email = %user.email, "email verified");
    }

    Ok(Json(MessageResponse {
        msg: "Email verified successfully".into(),
    }))
}

fn internal(e: anyhow::Error) -> Response {
    use axum::response::IntoResponse;
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("a@b.c"));
        assert!(is_valid_email("dexter.morgan@miami-metro.gov"));
    }

    #[test]
    fn email_regex_rejects_malformed_addresses() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("spaces in@local.part"));
        assert!(!is_valid_email("@missing.local"));
    }
}
