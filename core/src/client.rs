//! Stateless request builder and response interpreter for the task service.
//!
//! # Design
//! `TaskClient` holds the base URL and a shared credential provider and
//! carries no mutable state between calls. Every operation goes through the
//! same two steps: `build_request` turns a `RequestDescriptor` into an
//! `HttpRequest`, and `parse_response` turns the host's `HttpResponse` into
//! either the JSON payload or an `ApiError`. The host executes the actual
//! HTTP round-trip in between, keeping the core deterministic.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::credentials::{CredentialProvider, StaticToken};
use crate::endpoint::{Endpoint, ResponseMode, ID_PLACEHOLDER};
use crate::error::{map_error_response, ApiError};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Credentials, DescriptionUpdate, NewTask, PasswordChange, Rename, TitleUpdate};

/// One call against one endpoint: the target identifier and JSON body, if
/// the endpoint takes them. Built per call and consumed by `build_request`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub endpoint: Endpoint,
    pub id: Option<String>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            id: None,
            body: None,
        }
    }

    pub fn with_id(mut self, id: impl fmt::Display) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| {
            ApiError::invalid_request(format!("cannot serialize request body: {e}"))
        })?;
        self.body = Some(value);
        Ok(self)
    }

    // --- authentication ---

    pub fn sign_up(name: &str, password: &str) -> Result<Self, ApiError> {
        Self::new(Endpoint::SignUp).with_json(&credentials(name, password))
    }

    pub fn login(name: &str, password: &str) -> Result<Self, ApiError> {
        Self::new(Endpoint::Login).with_json(&credentials(name, password))
    }

    // --- self service ---

    pub fn get_me() -> Self {
        Self::new(Endpoint::GetMe)
    }

    pub fn rename_me(new_name: &str) -> Result<Self, ApiError> {
        Self::new(Endpoint::RenameMe).with_json(&Rename {
            name: new_name.to_string(),
        })
    }

    pub fn change_my_password(old_password: &str, new_password: &str) -> Result<Self, ApiError> {
        Self::new(Endpoint::ChangeMyPassword)
            .with_json(&password_change(old_password, new_password))
    }

    pub fn delete_me() -> Self {
        Self::new(Endpoint::DeleteMe)
    }

    pub fn get_my_tasks() -> Self {
        Self::new(Endpoint::GetMyTasks)
    }

    pub fn create_new_task(title: &str, description: &str) -> Result<Self, ApiError> {
        Self::new(Endpoint::CreateNewTask).with_json(&new_task(title, description))
    }

    pub fn delete_task(task_id: impl fmt::Display) -> Self {
        Self::new(Endpoint::DeleteTask).with_id(task_id)
    }

    pub fn switch_task_status(task_id: impl fmt::Display) -> Self {
        Self::new(Endpoint::SwitchTaskStatus).with_id(task_id)
    }

    pub fn change_task_title(task_id: impl fmt::Display, title: &str) -> Result<Self, ApiError> {
        Self::new(Endpoint::ChangeTaskTitle)
            .with_id(task_id)
            .with_json(&TitleUpdate {
                title: title.to_string(),
            })
    }

    pub fn change_task_description(
        task_id: impl fmt::Display,
        description: &str,
    ) -> Result<Self, ApiError> {
        Self::new(Endpoint::ChangeTaskDescription)
            .with_id(task_id)
            .with_json(&DescriptionUpdate {
                description: description.to_string(),
            })
    }

    // --- administration ---

    pub fn get_all_users_admin() -> Self {
        Self::new(Endpoint::GetAllUsersAdmin)
    }

    pub fn create_new_user_admin(name: &str, password: &str) -> Result<Self, ApiError> {
        Self::new(Endpoint::CreateNewUserAdmin).with_json(&credentials(name, password))
    }

    pub fn get_user_by_id_admin(user_id: impl fmt::Display) -> Self {
        Self::new(Endpoint::GetUserByIdAdmin).with_id(user_id)
    }

    pub fn get_user_tasks_admin(user_id: impl fmt::Display) -> Self {
        Self::new(Endpoint::GetUserTasksAdmin).with_id(user_id)
    }

    pub fn create_new_task_admin(
        user_id: impl fmt::Display,
        title: &str,
        description: &str,
    ) -> Result<Self, ApiError> {
        Self::new(Endpoint::CreateNewTaskAdmin)
            .with_id(user_id)
            .with_json(&new_task(title, description))
    }

    pub fn rename_user_admin(user_id: impl fmt::Display, new_name: &str) -> Result<Self, ApiError> {
        Self::new(Endpoint::RenameUserAdmin)
            .with_id(user_id)
            .with_json(&Rename {
                name: new_name.to_string(),
            })
    }

    pub fn change_user_password_admin(
        user_id: impl fmt::Display,
        old_password: &str,
        new_password: &str,
    ) -> Result<Self, ApiError> {
        Self::new(Endpoint::ChangeUserPasswordAdmin)
            .with_id(user_id)
            .with_json(&password_change(old_password, new_password))
    }

    pub fn update_user_role_admin(user_id: impl fmt::Display) -> Self {
        Self::new(Endpoint::UpdateUserRoleAdmin).with_id(user_id)
    }

    pub fn delete_user_admin(user_id: impl fmt::Display) -> Self {
        Self::new(Endpoint::DeleteUserAdmin).with_id(user_id)
    }

    pub fn get_all_tasks_admin() -> Self {
        Self::new(Endpoint::GetAllTasksAdmin)
    }

    pub fn delete_task_admin(task_id: impl fmt::Display) -> Self {
        Self::new(Endpoint::DeleteTaskAdmin).with_id(task_id)
    }

    pub fn switch_task_status_admin(task_id: impl fmt::Display) -> Self {
        Self::new(Endpoint::SwitchTaskStatusAdmin).with_id(task_id)
    }

    pub fn change_task_title_admin(
        task_id: impl fmt::Display,
        title: &str,
    ) -> Result<Self, ApiError> {
        Self::new(Endpoint::ChangeTaskTitleAdmin)
            .with_id(task_id)
            .with_json(&TitleUpdate {
                title: title.to_string(),
            })
    }

    pub fn change_task_description_admin(
        task_id: impl fmt::Display,
        description: &str,
    ) -> Result<Self, ApiError> {
        Self::new(Endpoint::ChangeTaskDescriptionAdmin)
            .with_id(task_id)
            .with_json(&DescriptionUpdate {
                description: description.to_string(),
            })
    }
}

fn credentials(name: &str, password: &str) -> Credentials {
    Credentials {
        name: name.to_string(),
        password: password.to_string(),
    }
}

fn password_change(old_password: &str, new_password: &str) -> PasswordChange {
    PasswordChange {
        old_password: old_password.to_string(),
        new_password: new_password.to_string(),
    }
}

fn new_task(title: &str, description: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: description.to_string(),
    }
}

/// Synchronous, stateless client for the task service.
///
/// Cloning is cheap: the credential provider is shared.
#[derive(Clone)]
pub struct TaskClient {
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for TaskClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TaskClient {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// A client with no token; authenticated calls go out as `Bearer null`.
    pub fn anonymous(base_url: &str) -> Self {
        Self::new(base_url, Arc::new(StaticToken::none()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_request(&self, descriptor: &RequestDescriptor) -> Result<HttpRequest, ApiError> {
        let route = descriptor.endpoint.route();

        let path = match (route.takes_id(), descriptor.id.as_deref()) {
            (true, Some(id)) => route.path.replace(ID_PLACEHOLDER, id),
            (false, None) => route.path.to_string(),
            (true, None) => {
                return Err(ApiError::invalid_request(format!(
                    "{:?} needs a target id",
                    descriptor.endpoint
                )))
            }
            (false, Some(_)) => {
                return Err(ApiError::invalid_request(format!(
                    "{:?} does not take a target id",
                    descriptor.endpoint
                )))
            }
        };

        let mut headers = Vec::new();
        if route.authenticated {
            // Read on every call; a missing token is left for the server to reject.
            let token = self.credentials.token();
            headers.push((
                "authorization".to_string(),
                format!("Bearer {}", token.as_deref().unwrap_or("null")),
            ));
        }

        let body = match &descriptor.body {
            Some(value) => {
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(serde_json::to_string(value).map_err(|e| {
                    ApiError::invalid_request(format!("cannot serialize request body: {e}"))
                })?)
            }
            None => None,
        };

        Ok(HttpRequest {
            method: route.method,
            path: format!("{}{path}", self.base_url),
            headers,
            body,
        })
    }

    /// Interpret the response to a request built for `endpoint`.
    ///
    /// Returns `Ok(None)` for endpoints that discard their success body.
    pub fn parse_response(
        &self,
        endpoint: Endpoint,
        response: HttpResponse,
    ) -> Result<Option<Value>, ApiError> {
        let route = endpoint.route();
        if !response.is_success() {
            return Err(map_error_response(
                response.status,
                &response.body,
                route.default_message,
            ));
        }
        match route.response {
            ResponseMode::Discard => Ok(None),
            ResponseMode::ReturnBody => serde_json::from_str(&response.body)
                .map(Some)
                .map_err(|e| {
                    ApiError::with_status(
                        response.status,
                        format!("{}: invalid response body: {e}", route.default_message),
                    )
                }),
        }
    }

    /// Like `parse_response`, decoding the payload into `T`.
    ///
    /// A discarded body decodes from `null`. A payload that does not fit `T`
    /// keeps the response status.
    pub fn parse_response_as<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        response: HttpResponse,
    ) -> Result<T, ApiError> {
        let route = endpoint.route();
        let status = response.status;
        let value = self.parse_response(endpoint, response)?.unwrap_or_default();
        serde_json::from_value(value).map_err(|e| {
            let message = format!("{}: unexpected response shape: {e}", route.default_message);
            ApiError::with_status(status, message)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryTokenStore;
    use crate::http::HttpMethod;
    use crate::types::{Task, User};
    use serde_json::json;

    fn client() -> TaskClient {
        TaskClient::new("http://localhost:8080", Arc::new(StaticToken::new("tok")))
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn login_is_anonymous_with_json_body() {
        let req = client()
            .build_request(&RequestDescriptor::login("alice", "pw").unwrap())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8080/login");
        assert_eq!(req.header("authorization"), None);
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "alice", "password": "pw"}));
    }

    #[test]
    fn authenticated_get_has_bearer_and_no_content_type() {
        let req = client()
            .build_request(&RequestDescriptor::get_my_tasks())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8080/me/tasks");
        assert_eq!(
            req.headers,
            vec![("authorization".to_string(), "Bearer tok".to_string())]
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn missing_token_is_sent_as_bearer_null() {
        let req = TaskClient::anonymous("http://localhost:8080")
            .build_request(&RequestDescriptor::get_me())
            .unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer null"));
    }

    #[test]
    fn token_is_read_on_every_build() {
        let store = Arc::new(MemoryTokenStore::new());
        let client = TaskClient::new("http://h", store.clone());

        store.set("one");
        let first = client.build_request(&RequestDescriptor::get_me()).unwrap();
        store.set("two");
        let second = client.build_request(&RequestDescriptor::get_me()).unwrap();

        assert_eq!(first.header("authorization"), Some("Bearer one"));
        assert_eq!(second.header("authorization"), Some("Bearer two"));
    }

    #[test]
    fn id_is_substituted_verbatim() {
        let descriptor = RequestDescriptor::change_task_title("t1", "new").unwrap();
        let req = client().build_request(&descriptor).unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "http://localhost:8080/me/tasks/t1/title");

        let descriptor = RequestDescriptor::create_new_task_admin(7, "a", "b").unwrap();
        let req = client().build_request(&descriptor).unwrap();
        assert_eq!(req.path, "http://localhost:8080/admin/users/7/tasks");
    }

    #[test]
    fn empty_field_values_are_forwarded() {
        let req = client()
            .build_request(&RequestDescriptor::create_new_task("", "").unwrap())
            .unwrap();
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"title": "", "description": ""}));
    }

    #[test]
    fn missing_or_unexpected_id_is_rejected() {
        let err = client()
            .build_request(&RequestDescriptor::new(Endpoint::DeleteTask))
            .unwrap_err();
        assert!(err.message().contains("DeleteTask"));

        let err = client()
            .build_request(&RequestDescriptor::get_me().with_id(1))
            .unwrap_err();
        assert!(err.message().contains("GetMe"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TaskClient::anonymous("http://localhost:8080/");
        let req = client
            .build_request(&RequestDescriptor::get_all_tasks_admin())
            .unwrap();
        assert_eq!(req.path, "http://localhost:8080/admin/tasks");
    }

    #[test]
    fn success_body_is_returned_as_is() {
        let body = r#"{"id":"t9","title":"buy milk","description":"2% milk","status":"open"}"#;
        let value = client()
            .parse_response(Endpoint::CreateNewTask, response(201, body))
            .unwrap();
        let expected = json!({
            "id": "t9",
            "title": "buy milk",
            "description": "2% milk",
            "status": "open",
        });
        assert_eq!(value, Some(expected));
    }

    #[test]
    fn discard_endpoints_ignore_any_body() {
        for body in ["", "not json", r#"{"id":1}"#] {
            let value = client()
                .parse_response(Endpoint::SignUp, response(201, body))
                .unwrap();
            assert_eq!(value, None);
        }
    }

    #[test]
    fn non_success_always_fails() {
        for status in [301, 400, 401, 403, 404, 409, 500, 503] {
            let err = client()
                .parse_response(Endpoint::GetMe, response(status, "{}"))
                .unwrap_err();
            assert_eq!(err.status(), Some(status));
        }
    }

    #[test]
    fn non_success_fails_even_for_discard_endpoints() {
        let err = client()
            .parse_response(Endpoint::CreateNewUserAdmin, response(403, ""))
            .unwrap_err();
        assert_eq!(err.message(), "insufficient permissions");
    }

    #[test]
    fn login_server_message_beats_fallback() {
        let body = r#"{"message":"bad credentials"}"#;
        let err = client()
            .parse_response(Endpoint::Login, response(401, body))
            .unwrap_err();
        assert_eq!(err.message(), "bad credentials");
    }

    #[test]
    fn delete_task_not_found() {
        let err = client()
            .parse_response(Endpoint::DeleteTask, response(404, ""))
            .unwrap_err();
        assert_eq!(err.message(), "resource not found");
    }

    #[test]
    fn undecodable_success_body_is_an_error() {
        let err = client()
            .parse_response(Endpoint::GetMe, response(200, ""))
            .unwrap_err();
        assert_eq!(err.status(), Some(200));
        let expected = "Failed to load profile: invalid response body";
        assert!(err.message().starts_with(expected));
    }

    #[test]
    fn typed_payload_is_decoded() {
        let body = r#"{"id":3,"name":"alice","role":"user"}"#;
        let user: User = client()
            .parse_response_as(Endpoint::GetMe, response(200, body))
            .unwrap();
        assert_eq!(user.name, "alice");
    }

    #[test]
    fn mismatched_payload_keeps_status() {
        let err = client()
            .parse_response_as::<Vec<Task>>(Endpoint::GetMe, response(200, "{}"))
            .unwrap_err();
        assert_eq!(err.status(), Some(200));
        let expected = "Failed to load profile: unexpected response shape";
        assert!(err.message().starts_with(expected));
    }
}
