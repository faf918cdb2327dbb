use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

use super::connector::{ConnectOutcome, Error, IdentityConnector, Provider, VerifiedIdentity};
use crate::{modules::auth::session::Session, types::Context};

pub struct FacebookConnector;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Profile {
    id: String,
    name: String,
    email: String,
}

#[derive(Deserialize)]
struct PictureData {
    url: String,
}

#[derive(Deserialize)]
struct PictureResponse {
    data: PictureData,
}

#[async_trait]
impl IdentityConnector for FacebookConnector {
    fn provider(&self) -> Provider {
        Provider::Facebook
    }

    /// The inbound credential is the short-lived token issued to the browser;
    /// it gets exchanged for a long-lived one before any profile reads.
    async fn exchange(
        &self,
        ctx: Arc<Context>,
        credential: String,
        _session: &Session,
    ) -> Result<ConnectOutcome, Error> {
        let client = reqwest::Client::new();

        let response = client
            .get(format!(
                "{}/oauth/access_token",
                ctx.facebook.graph_api_endpoint
            ))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", ctx.facebook.app_id.as_str()),
                ("client_secret", ctx.facebook.app_secret.as_str()),
                ("fb_exchange_token", credential.as_str()),
            ])
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to send Facebook token exchange request: {}", err);
                Error::RequestNotSent
            })?;

        if response.status() != StatusCode::OK {
            tracing::error!(
                "Facebook token exchange rejected with status: {}",
                response.status()
            );
            return Err(Error::ExchangeFailed);
        }

        let tokens = response.json::<TokenResponse>().await.map_err(|err| {
            tracing::error!("Failed to decode Facebook token response: {}", err);
            Error::ExchangeFailed
        })?;

        let userinfo_url = format!(
            "{}/{}/me",
            ctx.facebook.graph_api_endpoint, ctx.facebook.graph_api_version
        );

        let profile = client
            .get(userinfo_url.clone())
            .query(&[
                ("access_token", tokens.access_token.as_str()),
                ("fields", "name,id,email"),
            ])
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to send Facebook profile request: {}", err);
                Error::RequestNotSent
            })?
            .json::<Profile>()
            .await
            .map_err(|err| {
                tracing::error!("Failed to decode Facebook profile response: {}", err);
                Error::FailedToDecodeResponse
            })?;

        let picture = client
            .get(format!("{}/picture", userinfo_url))
            .query(&[
                ("access_token", tokens.access_token.as_str()),
                ("redirect", "0"),
                ("height", "200"),
                ("width", "200"),
            ])
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to send Facebook picture request: {}", err);
                Error::RequestNotSent
            })?
            .json::<PictureResponse>()
            .await
            .map_err(|err| {
                tracing::error!("Failed to decode Facebook picture response: {}", err);
                Error::FailedToDecodeResponse
            })?;

        Ok(ConnectOutcome::Connected(VerifiedIdentity {
            provider: Provider::Facebook,
            subject: profile.id,
            name: profile.name,
            email: profile.email,
            picture: picture.data.url,
            access_token: tokens.access_token,
        }))
    }
}

/// Permissions-delete against the graph API. The provider's answer is logged
/// and otherwise ignored; Facebook logout always succeeds locally.
pub async fn revoke(
    ctx: Arc<Context>,
    facebook_id: String,
    access_token: String,
) -> Result<(), Error> {
    let response = reqwest::Client::new()
        .delete(format!(
            "{}/{}/permissions",
            ctx.facebook.graph_api_endpoint, facebook_id
        ))
        .query(&[("access_token", access_token.as_str())])
        .send()
        .await
        .map_err(|err| {
            tracing::error!("Failed to send Facebook permissions delete: {}", err);
            Error::RequestNotSent
        })?;

    if response.status() != StatusCode::OK {
        tracing::debug!(
            "Facebook permissions delete answered with status: {}",
            response.status()
        );
    }

    Ok(())
}
