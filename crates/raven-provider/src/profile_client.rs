//! Authenticated profile lookups by username or numeric id.

use std::time::Duration;

use anyhow::{Context, Result};
use raven_profile::{ProfileId, ProfileIdentifier};
use raven_session::SessionHeaders;
use reqwest::{
    blocking::{Client, Response},
    header::RETRY_AFTER,
    StatusCode,
};
use serde::de::DeserializeOwned;

use crate::{
    error::FetchError,
    profile_payload::{FetchedProfile, UserInfoResponse, WebProfileInfoResponse},
};

pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_WEB_BASE: &str = "https://www.instagram.com";

/// Public profile page for `username`, used as the screenshot target.
pub fn profile_page_url(web_base: &str, username: &str) -> String {
    format!("{}/{username}/", web_base.trim_end_matches('/'))
}

/// Source of fresh profile data.
pub trait ProfileSource {
    fn fetch(
        &self,
        headers: &SessionHeaders,
        identifier: &ProfileIdentifier,
    ) -> Result<FetchedProfile, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ProfileClient {
    client: Client,
    api_base: String,
}

impl ProfileClient {
    pub fn new(api_base: impl Into<String>, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms.max(1)))
            .build()
            .context("failed to build profile http client")?;
        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }

    fn base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    fn fetch_by_username(
        &self,
        headers: &SessionHeaders,
        username: &str,
    ) -> Result<FetchedProfile, FetchError> {
        let request = self
            .client
            .get(format!("{}/users/web_profile_info/", self.base()))
            .query(&[("username", username)]);
        let identifier = format!("@{username}");
        let body: WebProfileInfoResponse = send_json(headers.apply(request), &identifier)?;
        body.into_profile()
            .ok_or(FetchError::NotFound { identifier })
    }

    fn fetch_by_id(
        &self,
        headers: &SessionHeaders,
        id: ProfileId,
    ) -> Result<FetchedProfile, FetchError> {
        let request = self.client.get(format!("{}/users/{id}/info/", self.base()));
        let identifier = format!("id {id}");
        let body: UserInfoResponse = send_json(headers.apply(request), &identifier)?;
        let profile = body
            .into_profile()
            .ok_or(FetchError::NotFound { identifier })?;
        if profile.id != id {
            return Err(FetchError::InvalidResponse(format!(
                "requested id {id} but received id {}",
                profile.id
            )));
        }
        Ok(profile)
    }
}

impl ProfileSource for ProfileClient {
    fn fetch(
        &self,
        headers: &SessionHeaders,
        identifier: &ProfileIdentifier,
    ) -> Result<FetchedProfile, FetchError> {
        let fetched = match identifier {
            ProfileIdentifier::Username(username) => self.fetch_by_username(headers, username),
            ProfileIdentifier::Id(id) => self.fetch_by_id(headers, *id),
        };
        match &fetched {
            Ok(profile) => tracing::debug!(
                identifier = %identifier,
                profile_id = %profile.id,
                "profile fetched"
            ),
            Err(error) => tracing::debug!(
                identifier = %identifier,
                error = %error,
                "profile fetch failed"
            ),
        }
        fetched
    }
}

fn send_json<T: DeserializeOwned>(
    request: reqwest::blocking::RequestBuilder,
    identifier: &str,
) -> Result<T, FetchError> {
    let response = request.send().map_err(classify_transport_error)?;
    let response = check_status(response, identifier)?;
    response
        .json::<T>()
        .map_err(|error| FetchError::InvalidResponse(error.to_string()))
}

fn check_status(response: Response, identifier: &str) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(match status {
        StatusCode::NOT_FOUND => FetchError::NotFound {
            identifier: identifier.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited {
            retry_after_secs: response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok()),
        },
        other => FetchError::Transport(format!("unexpected http status {}", other.as_u16())),
    })
}

fn classify_transport_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Transport("timeout".to_string())
    } else {
        FetchError::Transport(format!("transport_error: {error}"))
    }
}
