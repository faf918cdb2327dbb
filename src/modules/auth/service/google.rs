use async_trait::async_trait;
use axum::http::StatusCode;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;

use super::connector::{ConnectOutcome, Error, IdentityConnector, Provider, VerifiedIdentity};
use crate::{modules::auth::session::Session, types::Context};

pub struct GoogleConnector;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    id_token: String,
}

#[derive(Deserialize)]
struct TokenInfo {
    issued_to: Option<String>,
    user_id: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct IdTokenClaims {
    sub: String,
}

#[derive(Deserialize)]
struct UserInfo {
    name: String,
    email: String,
    picture: String,
}

/// The subject lives in the id token's payload segment. The claim is not
/// trusted on its own: it must match what the tokeninfo endpoint reports.
fn decode_id_token_subject(id_token: &str) -> Result<String, Error> {
    let payload = id_token.split('.').nth(1).ok_or(Error::ExchangeFailed)?;
    let decoded = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|err| {
            tracing::error!("Failed to decode id token payload: {}", err);
            Error::ExchangeFailed
        })?;
    serde_json::de::from_slice::<IdTokenClaims>(&decoded)
        .map(|claims| claims.sub)
        .map_err(|err| {
            tracing::error!("Failed to parse id token claims: {}", err);
            Error::ExchangeFailed
        })
}

#[async_trait]
impl IdentityConnector for GoogleConnector {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn exchange(
        &self,
        ctx: Arc<Context>,
        credential: String,
        session: &Session,
    ) -> Result<ConnectOutcome, Error> {
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/token", ctx.google.oauth_api_endpoint))
            .form(&[
                ("code", credential.as_str()),
                ("client_id", ctx.google.client_id.as_str()),
                ("client_secret", ctx.google.client_secret.as_str()),
                ("redirect_uri", "postmessage"),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to send Google token exchange request: {}", err);
                Error::RequestNotSent
            })?;

        if response.status() != StatusCode::OK {
            tracing::error!(
                "Google token exchange rejected with status: {}",
                response.status()
            );
            return Err(Error::ExchangeFailed);
        }

        let tokens = response.json::<TokenResponse>().await.map_err(|err| {
            tracing::error!("Failed to decode Google token response: {}", err);
            Error::ExchangeFailed
        })?;

        let subject = decode_id_token_subject(&tokens.id_token)?;

        let token_info = client
            .get(format!("{}/oauth2/v1/tokeninfo", ctx.google.api_endpoint))
            .query(&[("access_token", tokens.access_token.as_str())])
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to send Google tokeninfo request: {}", err);
                Error::RequestNotSent
            })?
            .json::<TokenInfo>()
            .await
            .map_err(|err| {
                tracing::error!("Failed to decode Google tokeninfo response: {}", err);
                Error::FailedToDecodeResponse
            })?;

        if let Some(error) = token_info.error {
            return Err(Error::UpstreamError(error));
        }

        if token_info.user_id.as_deref() != Some(subject.as_str()) {
            return Err(Error::SubjectMismatch);
        }

        if token_info.issued_to.as_deref() != Some(ctx.google.client_id.as_str()) {
            tracing::error!("Token's client ID does not match app's.");
            return Err(Error::AudienceMismatch);
        }

        if session.access_token.is_some() && session.gplus_id.as_deref() == Some(subject.as_str())
        {
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        let profile = client
            .get(format!("{}/oauth2/v1/userinfo", ctx.google.api_endpoint))
            .query(&[
                ("access_token", tokens.access_token.as_str()),
                ("alt", "json"),
            ])
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to send Google userinfo request: {}", err);
                Error::RequestNotSent
            })?
            .json::<UserInfo>()
            .await
            .map_err(|err| {
                tracing::error!("Failed to decode Google userinfo response: {}", err);
                Error::FailedToDecodeResponse
            })?;

        Ok(ConnectOutcome::Connected(VerifiedIdentity {
            provider: Provider::Google,
            subject,
            name: profile.name,
            email: profile.email,
            picture: profile.picture,
            access_token: tokens.access_token,
        }))
    }
}

/// Revocation must come back 200 to count as revoked.
pub async fn revoke(ctx: Arc<Context>, access_token: String) -> Result<(), Error> {
    let response = reqwest::Client::new()
        .get(format!(
            "{}/o/oauth2/revoke",
            ctx.google.accounts_api_endpoint
        ))
        .query(&[("token", access_token.as_str())])
        .send()
        .await
        .map_err(|err| {
            tracing::error!("Failed to send Google revocation request: {}", err);
            Error::RequestNotSent
        })?;

    match response.status() {
        StatusCode::OK => Ok(()),
        status => {
            tracing::error!("Google revocation rejected with status: {}", status);
            Err(Error::RevocationFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_subject_from_an_id_token_payload() {
        // header {}, payload {"sub":"12345"}, opaque signature
        let id_token = "e30.eyJzdWIiOiIxMjM0NSJ9.c2ln";
        assert_eq!(decode_id_token_subject(id_token).unwrap(), "12345");
    }

    #[test]
    fn rejects_tokens_without_a_payload_segment() {
        assert!(decode_id_token_subject("garbage").is_err());
    }

    #[test]
    fn rejects_payloads_that_are_not_base64_json() {
        assert!(decode_id_token_subject("e30.!!!.c2ln").is_err());
        assert!(decode_id_token_subject("e30.c2ln.c2ln").is_err());
    }
}
