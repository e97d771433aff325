//! Async client for the task service.
//!
//! # Overview
//! Wraps the sans-IO `tasks-core` with a `reqwest` transport and exposes one
//! async method per backend endpoint. Configuration comes from the
//! environment (`TASKS_API_URL`, `TASKS_TOKEN_FILE`) or is built in code.
//!
//! # Design
//! - Every method goes through `ApiClient::execute`; there is no
//!   per-endpoint logic here.
//! - Payloads are returned as `serde_json::Value`; `execute_as` decodes into
//!   one of the typed views in `tasks_core::types` when the caller wants one.
//! - Requests are logged at `debug`, failures at `warn`. Tokens are never
//!   logged.

pub mod client;
pub mod config;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use tasks_core::{ApiError, CredentialProvider, FileTokenStore, MemoryTokenStore, StaticToken};
