use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    modules::{auth::session::Session, user},
    types::Context,
};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "facebook")]
    Facebook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
        }
    }
}

/// What a connector hands back once the provider has vouched for the caller.
#[derive(Clone, Debug)]
pub struct VerifiedIdentity {
    pub provider: Provider,
    pub subject: String,
    pub name: String,
    pub email: String,
    pub picture: String,
    pub access_token: String,
}

pub enum ConnectOutcome {
    Connected(VerifiedIdentity),
    AlreadyConnected,
}

#[derive(Debug)]
pub enum Error {
    RequestNotSent,
    FailedToDecodeResponse,
    ExchangeFailed,
    SubjectMismatch,
    AudienceMismatch,
    UpstreamError(String),
    RevocationFailed,
}

/// One capability, two providers: turn a provider-issued credential into a
/// verified profile. The session is consulted so a repeated Google login for
/// the same subject can short-circuit.
#[async_trait]
pub trait IdentityConnector {
    fn provider(&self) -> Provider;

    async fn exchange(
        &self,
        ctx: Arc<Context>,
        credential: String,
        session: &Session,
    ) -> Result<ConnectOutcome, Error>;
}

/// Upsert-by-email: the only way accounts come into existence.
pub async fn resolve_local_user(
    ctx: Arc<Context>,
    identity: &VerifiedIdentity,
) -> Result<i32, user::repository::Error> {
    match user::repository::find_by_email(&ctx.db_conn.pool, identity.email.clone()).await? {
        Some(user) => Ok(user.id),
        None => user::repository::create(
            &ctx.db_conn.pool,
            user::repository::CreateUserPayload {
                name: identity.name.clone(),
                email: identity.email.clone(),
                picture: Some(identity.picture.clone()),
            },
        )
        .await
        .map(|user| user.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_tags_serialize_to_their_lowercase_names() {
        assert_eq!(
            serde_json::to_value(Provider::Google).unwrap(),
            serde_json::json!("google")
        );
        assert_eq!(Provider::Facebook.as_str(), "facebook");
    }
}
