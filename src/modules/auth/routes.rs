use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::service::connector::{self, ConnectOutcome, IdentityConnector, Provider};
use super::service::{facebook, google};
use super::session;
use crate::{modules::category, types::Context, utils::html};

#[derive(Deserialize)]
struct StateQuery {
    state: Option<String>,
}

fn login_page(ctx: &Context, state: &str, flash: Vec<String>) -> String {
    let body = format!(
        r#"<h1>Sign in</h1>
<div id="signin"
     data-state="{state}"
     data-google-client-id="{google_client_id}"
     data-fb-app-id="{fb_app_id}"
     data-fb-version="{fb_version}">
  <button id="google-signin">Sign in with Google</button>
  <button id="facebook-signin">Sign in with Facebook</button>
</div>"#,
        state = html::escape(state),
        google_client_id = html::escape(&ctx.google.client_id),
        fb_app_id = html::escape(&ctx.facebook.app_id),
        fb_version = html::escape(&ctx.facebook.graph_api_version),
    );
    html::layout("Login", &flash, &body)
}

fn welcome_fragment(name: &str, picture: &str) -> String {
    format!(
        "<h1>Welcome, {}!</h1><img src=\"{}\" style=\"width: 300px; height: 300px; border-radius: 150px; -webkit-border-radius: 150px; -moz-border-radius: 150px;\">",
        html::escape(name),
        html::escape(picture),
    )
}

/// Issues a fresh anti-forgery state token on every visit and renders the
/// provider buttons. Also fills the session's category snapshot like the
/// home page does.
async fn login(State(ctx): State<Arc<Context>>, jar: CookieJar) -> Response {
    let (token, mut session) = session::load_or_create(&ctx.sessions, &jar).await;

    if session.categories.is_none() {
        match category::repository::find_all_ordered_by_name(&ctx.db_conn.pool).await {
            Ok(categories) => {
                session.categories =
                    Some(categories.iter().map(|category| category.view()).collect())
            }
            Err(_) => {
                return html::error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load categories",
                )
            }
        }
    }

    let state = session::generate_state_token();
    session.state = Some(state.clone());
    let flash = session.take_flash();

    ctx.sessions.put(&token, session).await;
    let jar = jar.add(session::session_cookie(&ctx.app, token));

    (jar, Html(login_page(&ctx, &state, flash))).into_response()
}

fn connector_error_response(err: connector::Error) -> Response {
    let (status, message) = match err {
        connector::Error::ExchangeFailed => (
            StatusCode::UNAUTHORIZED,
            String::from("Failed to upgrade the authorization code."),
        ),
        connector::Error::SubjectMismatch => (
            StatusCode::UNAUTHORIZED,
            String::from("Token's user ID doesn't match given user ID."),
        ),
        connector::Error::AudienceMismatch => (
            StatusCode::UNAUTHORIZED,
            String::from("Token's client ID does not match app's."),
        ),
        connector::Error::UpstreamError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        connector::Error::RequestNotSent
        | connector::Error::FailedToDecodeResponse
        | connector::Error::RevocationFailed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Identity provider request failed."),
        ),
    };

    (status, Json(json!({ "error": message }))).into_response()
}

/// Shared callback flow: state check, provider exchange, local upsert.
async fn connect<C: IdentityConnector>(
    ctx: Arc<Context>,
    connector: C,
    state_param: Option<String>,
    jar: CookieJar,
    credential: String,
) -> Response {
    let invalid_state = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid state parameter." })),
        )
            .into_response()
    };

    let (token, mut session) = match session::load(&ctx.sessions, &jar).await {
        Some(found) => found,
        None => return invalid_state(),
    };

    let state_matches = match (&state_param, &session.state) {
        (Some(provided), Some(expected)) => provided == expected,
        _ => false,
    };
    if !state_matches {
        return invalid_state();
    }

    tracing::debug!(
        "Processing {} OAuth callback",
        connector.provider().as_str()
    );

    match connector.exchange(ctx.clone(), credential, &session).await {
        Ok(ConnectOutcome::AlreadyConnected) => (
            StatusCode::OK,
            Json(json!({ "message": "Current user is already connected." })),
        )
            .into_response(),
        Ok(ConnectOutcome::Connected(identity)) => {
            let user_id = match connector::resolve_local_user(ctx.clone(), &identity).await {
                Ok(user_id) => user_id,
                Err(_) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "Failed to resolve user account" })),
                    )
                        .into_response()
                }
            };

            session.provider = Some(identity.provider);
            session.username = Some(identity.name.clone());
            session.email = Some(identity.email.clone());
            session.picture = Some(identity.picture.clone());
            session.access_token = Some(identity.access_token.clone());
            match identity.provider {
                Provider::Google => session.gplus_id = Some(identity.subject.clone()),
                Provider::Facebook => session.facebook_id = Some(identity.subject.clone()),
            }
            session.user_id = Some(user_id);
            session.push_flash(format!("Now logged in as {}", identity.name));

            ctx.sessions.put(&token, session).await;

            Html(welcome_fragment(&identity.name, &identity.picture)).into_response()
        }
        Err(err) => connector_error_response(err),
    }
}

async fn gconnect(
    State(ctx): State<Arc<Context>>,
    Query(query): Query<StateQuery>,
    jar: CookieJar,
    credential: String,
) -> Response {
    connect(ctx, google::GoogleConnector, query.state, jar, credential).await
}

async fn fbconnect(
    State(ctx): State<Arc<Context>>,
    Query(query): Query<StateQuery>,
    jar: CookieJar,
    credential: String,
) -> Response {
    connect(ctx, facebook::FacebookConnector, query.state, jar, credential).await
}

fn not_connected() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Current user not connected." })),
    )
        .into_response()
}

/// Local Google state is cleared regardless of what the revoke endpoint
/// answers; a non-200 is still reported as a failure.
async fn gdisconnect(State(ctx): State<Arc<Context>>, jar: CookieJar) -> Response {
    let (token, mut session) = match session::load(&ctx.sessions, &jar).await {
        Some(found) => found,
        None => return not_connected(),
    };

    let access_token = match session.access_token.clone() {
        Some(access_token) => access_token,
        None => return not_connected(),
    };

    let result = google::revoke(ctx.clone(), access_token).await;

    session.clear_google();
    ctx.sessions.put(&token, session).await;

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Successfully disconnected." })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Failed to revoke token for given user." })),
        )
            .into_response(),
    }
}

async fn fbdisconnect(State(ctx): State<Arc<Context>>, jar: CookieJar) -> Response {
    let (token, mut session) = match session::load(&ctx.sessions, &jar).await {
        Some(found) => found,
        None => return not_connected(),
    };

    let (facebook_id, access_token) =
        match (session.facebook_id.clone(), session.access_token.clone()) {
            (Some(facebook_id), Some(access_token)) => (facebook_id, access_token),
            _ => return not_connected(),
        };

    if let Err(err) = facebook::revoke(ctx.clone(), facebook_id, access_token).await {
        tracing::warn!("Facebook revocation request failed: {:?}", err);
    }

    session.clear_facebook();
    ctx.sessions.put(&token, session).await;

    (
        StatusCode::OK,
        Json(json!({ "message": "You have been logged out" })),
    )
        .into_response()
}

/// Provider-aware logout: best-effort revocation, then every identity key is
/// stripped and the browser goes back home.
async fn logout(State(ctx): State<Arc<Context>>, jar: CookieJar) -> Response {
    let (token, mut session) = match session::load(&ctx.sessions, &jar).await {
        Some(found) => found,
        None => return Redirect::to("/").into_response(),
    };

    match session.provider {
        Some(provider) => {
            match provider {
                Provider::Google => {
                    if let Some(access_token) = session.access_token.clone() {
                        if let Err(err) = google::revoke(ctx.clone(), access_token).await {
                            tracing::warn!("Google revocation request failed: {:?}", err);
                        }
                    }
                }
                Provider::Facebook => {
                    if let (Some(facebook_id), Some(access_token)) =
                        (session.facebook_id.clone(), session.access_token.clone())
                    {
                        if let Err(err) =
                            facebook::revoke(ctx.clone(), facebook_id, access_token).await
                        {
                            tracing::warn!("Facebook revocation request failed: {:?}", err);
                        }
                    }
                }
            }

            session.clear_identity();
            session.push_flash(String::from("You have successfully been logged out."));
        }
        None => {
            session.push_flash(String::from("You were not logged in"));
        }
    }

    ctx.sessions.put(&token, session).await;

    Redirect::to("/").into_response()
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/login", get(login))
        .route("/gconnect", post(gconnect))
        .route("/fbconnect", post(fbconnect))
        .route("/gdisconnect", get(gdisconnect))
        .route("/fbdisconnect", get(fbdisconnect))
        .route("/logout", post(logout))
}
