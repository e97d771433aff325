//! Wire DTOs for the task service.
//!
//! # Design
//! Request payloads are typed so field names can't drift between endpoints.
//! Operations hand back raw `serde_json::Value` because the backend owns the
//! response shapes; the response structs below are typed views callers can
//! opt into with `serde_json::from_value`. They are defined independently
//! from the mock-server crate and integration tests catch schema drift.

use serde::{Deserialize, Serialize};

/// Body of `/sign-up`, `/login` and admin user creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rename {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TitleUpdate {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescriptionUpdate {
    pub description: String,
}

/// Successful `/login` answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
}

/// `{id, status}` answer to mutations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Acknowledgement {
    pub id: u64,
    pub status: String,
}
