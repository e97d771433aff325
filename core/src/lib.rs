//! Synchronous API client core for the task service.
//!
//! # Overview
//! Builds `HttpRequest` values and interprets `HttpResponse` values without
//! touching the network (host-does-IO pattern). The host executes the
//! actual HTTP round-trip, making the core fully deterministic and testable.
//!
//! # Design
//! - Every operation is a row in the `Endpoint` table; there is one request
//!   path and one response path for all of them.
//! - The bearer token comes from an injected `CredentialProvider`, read on
//!   every authenticated call.
//! - All failures are a single `ApiError` with a human-readable message.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod types;

pub use client::{RequestDescriptor, TaskClient};
pub use credentials::{
    CredentialProvider, FileTokenStore, MemoryTokenStore, StaticToken, StoreError, TOKEN_KEY,
};
pub use endpoint::{Endpoint, ResponseMode, Route};
pub use error::{map_error_response, ApiError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use types::{
    Acknowledgement, Credentials, DescriptionUpdate, LoginResponse, NewTask, PasswordChange,
    Rename, Task, TitleUpdate, User,
};
