//! Async host for `tasks-core`: executes built requests with `reqwest`.
//!
//! # Design
//! `ApiClient` adds no behavior of its own. Each operation builds a
//! `RequestDescriptor`, the core turns it into an `HttpRequest`, reqwest
//! executes it, and the core interprets the response. There are no retries
//! or timeouts; a hung server hangs the awaiting caller.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tasks_core::{
    ApiError, CredentialProvider, FileTokenStore, HttpMethod, HttpRequest, HttpResponse,
    RequestDescriptor, TaskClient,
};

use crate::config::ClientConfig;

/// Asynchronous client for the task service.
///
/// Clones share the credential provider and the underlying HTTP client, so
/// one instance can be handed to many concurrent tasks.
#[derive(Debug, Clone)]
pub struct ApiClient {
    core: TaskClient,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            core: TaskClient::new(base_url, credentials),
            http: reqwest::Client::new(),
        }
    }

    /// A client whose token is read from `config.token_file`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            &config.base_url,
            Arc::new(FileTokenStore::new(config.token_file.clone())),
        )
    }

    pub fn core(&self) -> &TaskClient {
        &self.core
    }

    /// Run one call through the core and the network.
    ///
    /// `Ok(None)` means the endpoint discards its success body.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<Option<Value>, ApiError> {
        let response = self.round_trip(&descriptor).await;
        let result = response.and_then(|r| self.core.parse_response(descriptor.endpoint, r));
        log_failure(&descriptor, result)
    }

    /// Like `execute`, decoding the payload into `T`.
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let response = self.round_trip(&descriptor).await;
        let result = response.and_then(|r| self.core.parse_response_as(descriptor.endpoint, r));
        log_failure(&descriptor, result)
    }

    /// Build and send one request, without interpreting the response.
    async fn round_trip(&self, descriptor: &RequestDescriptor) -> Result<HttpResponse, ApiError> {
        let request = self.core.build_request(descriptor)?;
        tracing::debug!(method = %request.method, path = %request.path, "sending request");

        self.send(request).await.map_err(|e| {
            let route = descriptor.endpoint.route();
            ApiError::transport(format!("{}: network error: {e}", route.default_message))
        })
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, reqwest::Error> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, &request.path);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn value(&self, descriptor: RequestDescriptor) -> Result<Value, ApiError> {
        Ok(self.execute(descriptor).await?.unwrap_or_default())
    }

    async fn unit(&self, descriptor: RequestDescriptor) -> Result<(), ApiError> {
        self.execute(descriptor).await.map(drop)
    }

    // --- authentication ---

    pub async fn sign_up(&self, name: &str, password: &str) -> Result<(), ApiError> {
        self.unit(RequestDescriptor::sign_up(name, password)?).await
    }

    /// Returns the server's answer, `{"token": ...}` on success. Persisting
    /// the token is up to the caller.
    pub async fn login(&self, name: &str, password: &str) -> Result<Value, ApiError> {
        self.value(RequestDescriptor::login(name, password)?).await
    }

    // --- self service ---

    pub async fn get_me(&self) -> Result<Value, ApiError> {
        self.value(RequestDescriptor::get_me()).await
    }

    pub async fn rename_me(&self, new_name: &str) -> Result<Value, ApiError> {
        self.value(RequestDescriptor::rename_me(new_name)?).await
    }

    pub async fn change_my_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::change_my_password(old_password, new_password)?;
        self.value(descriptor).await
    }

    pub async fn delete_me(&self) -> Result<Value, ApiError> {
        self.value(RequestDescriptor::delete_me()).await
    }

    pub async fn get_my_tasks(&self) -> Result<Value, ApiError> {
        self.value(RequestDescriptor::get_my_tasks()).await
    }

    pub async fn create_new_task(&self, title: &str, description: &str) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::create_new_task(title, description)?;
        self.value(descriptor).await
    }

    pub async fn delete_task(&self, task_id: impl fmt::Display) -> Result<Value, ApiError> {
        self.value(RequestDescriptor::delete_task(task_id)).await
    }

    pub async fn switch_task_status(&self, task_id: impl fmt::Display) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::switch_task_status(task_id);
        self.value(descriptor).await
    }

    pub async fn change_task_title(
        &self,
        task_id: impl fmt::Display,
        title: &str,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::change_task_title(task_id, title)?;
        self.value(descriptor).await
    }

    pub async fn change_task_description(
        &self,
        task_id: impl fmt::Display,
        description: &str,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::change_task_description(task_id, description)?;
        self.value(descriptor).await
    }

    // --- administration ---

    pub async fn get_all_users_admin(&self) -> Result<Value, ApiError> {
        self.value(RequestDescriptor::get_all_users_admin()).await
    }

    pub async fn create_new_user_admin(&self, name: &str, password: &str) -> Result<(), ApiError> {
        let descriptor = RequestDescriptor::create_new_user_admin(name, password)?;
        self.unit(descriptor).await
    }

    pub async fn get_user_by_id_admin(
        &self,
        user_id: impl fmt::Display,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::get_user_by_id_admin(user_id);
        self.value(descriptor).await
    }

    pub async fn get_user_tasks_admin(
        &self,
        user_id: impl fmt::Display,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::get_user_tasks_admin(user_id);
        self.value(descriptor).await
    }

    pub async fn create_new_task_admin(
        &self,
        user_id: impl fmt::Display,
        title: &str,
        description: &str,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::create_new_task_admin(user_id, title, description)?;
        self.value(descriptor).await
    }

    pub async fn rename_user_admin(
        &self,
        user_id: impl fmt::Display,
        new_name: &str,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::rename_user_admin(user_id, new_name)?;
        self.value(descriptor).await
    }

    pub async fn change_user_password_admin(
        &self,
        user_id: impl fmt::Display,
        old_password: &str,
        new_password: &str,
    ) -> Result<Value, ApiError> {
        let descriptor =
            RequestDescriptor::change_user_password_admin(user_id, old_password, new_password)?;
        self.value(descriptor).await
    }

    pub async fn update_user_role_admin(
        &self,
        user_id: impl fmt::Display,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::update_user_role_admin(user_id);
        self.value(descriptor).await
    }

    pub async fn delete_user_admin(&self, user_id: impl fmt::Display) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::delete_user_admin(user_id);
        self.value(descriptor).await
    }

    pub async fn get_all_tasks_admin(&self) -> Result<Value, ApiError> {
        self.value(RequestDescriptor::get_all_tasks_admin()).await
    }

    pub async fn delete_task_admin(&self, task_id: impl fmt::Display) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::delete_task_admin(task_id);
        self.value(descriptor).await
    }

    pub async fn switch_task_status_admin(
        &self,
        task_id: impl fmt::Display,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::switch_task_status_admin(task_id);
        self.value(descriptor).await
    }

    pub async fn change_task_title_admin(
        &self,
        task_id: impl fmt::Display,
        title: &str,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::change_task_title_admin(task_id, title)?;
        self.value(descriptor).await
    }

    pub async fn change_task_description_admin(
        &self,
        task_id: impl fmt::Display,
        description: &str,
    ) -> Result<Value, ApiError> {
        let descriptor = RequestDescriptor::change_task_description_admin(task_id, description)?;
        self.value(descriptor).await
    }
}

fn log_failure<T>(
    descriptor: &RequestDescriptor,
    result: Result<T, ApiError>,
) -> Result<T, ApiError> {
    if let Err(err) = &result {
        tracing::warn!(
            endpoint = ?descriptor.endpoint,
            status = ?err.status(),
            error = %err,
            "request failed"
        );
    }
    result
}
