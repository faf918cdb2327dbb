use crate::modules::auth::session::{self, Session};
use crate::modules::user;
use crate::modules::user::repository::User;
use crate::types::Context;
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Redirect};
use axum::RequestPartsExt;
use axum::{async_trait, extract::Extension, http::request::Parts, response::Response};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Extractor gating the mutating catalogue routes: a browser without a
/// logged-in session is sent to the login view before any lookup runs.
pub struct Auth {
    pub token: String,
    pub session: Session,
    pub user: User,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(ctx) = parts.extract::<Extension<Arc<Context>>>().await.unwrap();
        let jar = parts.extract::<CookieJar>().await.unwrap();

        let to_login = || Redirect::to("/login").into_response();

        let (token, session) = session::load(&ctx.sessions, &jar)
            .await
            .ok_or_else(to_login)?;

        if !session.is_authenticated() {
            return Err(to_login());
        }

        let user_id = session.user_id.ok_or_else(to_login)?;
        let user = user::repository::find_by_id(&ctx.db_conn.pool, user_id)
            .await
            .map_err(|_| to_login())?
            .ok_or_else(to_login)?;

        Ok(Self {
            token,
            session,
            user,
        })
    }
}
