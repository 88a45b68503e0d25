//! jsConnect Authentication Handler
//!
//! Validates the forum's request, resolves the signed-in user and renders
//! the signed JSONP answer. Failures never leave this module as errors: they
//! become a bare JSON error payload, still served with status 200.

use crate::config::{JsConnectConfig, LinkBy};
use crate::directory::{UserDirectory, UserSelector};
use crate::reconcile::UsernameResolver;
use crate::response::{Rendered, SsoResponse, UserData, JSONP_CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::signature::verify;
use crate::{JsConnectError, JsConnectResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};

/// Query parameters sent by the forum
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SsoRequest {
    pub client_id: Option<String>,
    pub callback: Option<String>,
    pub timestamp: Option<String>,
    pub signature: Option<String>,
}

impl SsoRequest {
    pub fn new(client_id: &str, callback: &str) -> Self {
        Self {
            client_id: Some(client_id.to_string()),
            callback: Some(callback.to_string()),
            timestamp: None,
            signature: None,
        }
    }

    pub fn signed(mut self, timestamp: i64, signature: &str) -> Self {
        self.timestamp = Some(timestamp.to_string());
        self.signature = Some(signature.to_string());
        self
    }
}

/// Signed-in user as known to the host application
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub unique_id: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub roles: Option<String>,
}

/// A request that passed validation
#[derive(Debug)]
struct ValidatedRequest<'a> {
    callback: &'a str,
    timestamp: Option<i64>,
}

/// jsConnect endpoint logic
pub struct JsConnect {
    config: JsConnectConfig,
    resolver: UsernameResolver,
}

impl JsConnect {
    pub fn new(config: JsConnectConfig, directory: Arc<dyn UserDirectory>) -> Self {
        let resolver = UsernameResolver::new(directory, config.username);
        Self { config, resolver }
    }

    /// Answers a forum request for the current caller
    pub async fn authenticate(
        &self,
        request: &SsoRequest,
        identity: Option<&AuthenticatedIdentity>,
    ) -> Rendered {
        self.authenticate_at(request, identity, Utc::now()).await
    }

    /// Answers a forum request as of `now`
    pub async fn authenticate_at(
        &self,
        request: &SsoRequest,
        identity: Option<&AuthenticatedIdentity>,
        now: DateTime<Utc>,
    ) -> Rendered {
        match self.respond(request, identity, now).await {
            Ok(rendered) => rendered,
            Err(err) => render_failure(&err),
        }
    }

    async fn respond(
        &self,
        request: &SsoRequest,
        identity: Option<&AuthenticatedIdentity>,
        now: DateTime<Utc>,
    ) -> JsConnectResult<Rendered> {
        self.config.ensure_usable()?;
        let validated = self.validate(request, now)?;

        let user = match (identity, validated.timestamp) {
            (Some(identity), Some(_)) => self.user_data(identity).await?,
            _ => UserData::anonymous(),
        };

        let response = SsoResponse::signed(
            &self.config.client_id,
            user,
            self.config.hash_algorithm,
            &self.config.client_secret,
        );
        let body = response.to_jsonp(validated.callback)?;

        Ok(Rendered {
            content_type: JSONP_CONTENT_TYPE,
            body,
        })
    }

    fn validate<'a>(
        &self,
        request: &'a SsoRequest,
        now: DateTime<Utc>,
    ) -> JsConnectResult<ValidatedRequest<'a>> {
        let callback = non_empty(&request.callback)
            .ok_or_else(|| JsConnectError::invalid_request("The callback parameter is missing."))?;
        if !callback_pattern().is_match(callback) {
            return Err(JsConnectError::invalid_request("The callback parameter is invalid."));
        }

        let client_id = non_empty(&request.client_id)
            .ok_or_else(|| JsConnectError::invalid_request("The client_id parameter is missing."))?;
        if client_id != self.config.client_id {
            return Err(JsConnectError::invalid_client(format!("Unknown client {}.", client_id)));
        }

        let timestamp = match non_empty(&request.timestamp) {
            None => None,
            Some(raw) => {
                let timestamp: i64 = raw.trim().parse().map_err(|_| {
                    JsConnectError::invalid_request("The timestamp parameter is invalid.")
                })?;
                self.check_signed_timestamp(timestamp, request.signature.as_deref(), now)?;
                Some(timestamp)
            }
        };

        Ok(ValidatedRequest { callback, timestamp })
    }

    fn check_signed_timestamp(
        &self,
        timestamp: i64,
        signature: Option<&str>,
        now: DateTime<Utc>,
    ) -> JsConnectResult<()> {
        let skew = now.timestamp().saturating_sub(timestamp).saturating_abs();
        if skew > self.config.timestamp_valid_for {
            return Err(JsConnectError::invalid_request("The timestamp is expired."));
        }

        let valid = signature.is_some_and(|signature| {
            verify(
                self.config.hash_algorithm,
                &timestamp.to_string(),
                &self.config.client_secret,
                signature,
            )
        });
        if !valid {
            return Err(JsConnectError::invalid_request("The signature is invalid."));
        }
        Ok(())
    }

    async fn user_data(&self, identity: &AuthenticatedIdentity) -> JsConnectResult<UserData> {
        let link = match self.config.link_by {
            LinkBy::UniqueId => UserSelector::Id(identity.unique_id.clone()),
            LinkBy::Email => UserSelector::Email(identity.email.clone()),
        };
        let name = self.resolver.resolve(&link, &identity.full_name).await?;

        Ok(UserData {
            unique_id: Some(identity.unique_id.clone()),
            name: Some(name),
            email: Some(identity.email.clone()),
            photo_url: identity.avatar_url.clone(),
            roles: identity.roles.clone(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn callback_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$.]*$").expect("callback pattern is valid")
    })
}

/// Logs a failed request and renders its error payload
pub fn render_failure(err: &JsConnectError) -> Rendered {
    tracing::error!(
        kind = err.kind(),
        code = err.code().unwrap_or("-"),
        error = %err,
        "jsConnect request failed"
    );

    let response = SsoResponse::error(err.code(), err.to_string());
    let body = response
        .to_json()
        .unwrap_or_else(|_| r#"{"message":"Internal error."}"#.to_string());

    Rendered {
        content_type: JSON_CONTENT_TYPE,
        body,
    }
}
