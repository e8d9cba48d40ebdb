// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{
    ApiError, ApiErrorKind, ApiResult, EnvironmentStore, RecipeLookup, ResourceIndex, RoleStore,
};
use crate::model::Role;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const CLIENT_NAME_HEADER: &str = "X-Ops-UserId";

/// REST client for the configuration server.
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    client_name: String,
}

impl HttpApiClient {
    pub fn new(base_url: &str, client_name: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            ApiError::new(ApiErrorKind::Request, "Failed to build HTTP client").with_source(err)
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_name: client_name.to_string(),
        })
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(CLIENT_NAME_HEADER, &self.client_name)
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        resource: &str,
        name: &str,
    ) -> ApiResult<Response> {
        let response = builder.send().await.map_err(|err| {
            ApiError::new(
                ApiErrorKind::Transport,
                format!("Request for {} '{}' failed", resource, name),
            )
            .with_source(err)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        log::debug!("{} '{}' request answered {}", resource, name, status);
        Err(match status {
            StatusCode::NOT_FOUND => ApiError::not_found(resource, name),
            StatusCode::CONFLICT => ApiError::conflict(resource, name),
            other => ApiError::new(
                ApiErrorKind::Status(other.as_u16()),
                format!("Request for {} '{}' was rejected", resource, name),
            ),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        resource: &str,
        name: &str,
    ) -> ApiResult<T> {
        let response = self
            .send(self.request(Method::GET, url), resource, name)
            .await?;
        response.json::<T>().await.map_err(|err| {
            ApiError::new(
                ApiErrorKind::Decode,
                format!("Failed to decode {} '{}'", resource, name),
            )
            .with_source(err)
        })
    }
}

#[async_trait]
impl RoleStore for HttpApiClient {
    async fn list(&self) -> ApiResult<ResourceIndex> {
        self.get_json(&self.url(&["roles"]), "role list", "*").await
    }

    async fn load(&self, name: &str) -> ApiResult<Role> {
        self.get_json(&self.url(&["roles", name]), "role", name).await
    }

    async fn create(&self, role: &Role) -> ApiResult<()> {
        let builder = self.request(Method::POST, &self.url(&["roles"])).json(role);
        self.send(builder, "role", role.name()).await?;
        Ok(())
    }

    async fn save(&self, role: &Role) -> ApiResult<()> {
        let builder = self
            .request(Method::PUT, &self.url(&["roles", role.name()]))
            .json(role);
        match self.send(builder, "role", role.name()).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                log::debug!("Role '{}' not on server, creating it", role.name());
                RoleStore::create(self, role).await
            }
            Err(err) => Err(err),
        }
    }

    async fn destroy(&self, role: &Role) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, &self.url(&["roles", role.name()]));
        self.send(builder, "role", role.name()).await?;
        Ok(())
    }
}

#[async_trait]
impl EnvironmentStore for HttpApiClient {
    async fn list(&self) -> ApiResult<ResourceIndex> {
        self.get_json(&self.url(&["environments"]), "environment list", "*")
            .await
    }
}

#[async_trait]
impl RecipeLookup for HttpApiClient {
    async fn recipes_for(&self, environment: &str) -> ApiResult<Vec<String>> {
        let mut recipes: Vec<String> = self
            .get_json(
                &self.url(&["environments", environment, "recipes"]),
                "environment",
                environment,
            )
            .await?;
        recipes.sort();
        Ok(recipes)
    }
}
