//! Client core for the posts app.
//!
//! # Overview
//! Everything the mobile screens need apart from drawing: the `Post` model,
//! a stateless request builder/parser for the posts REST service, an async
//! repository over a pluggable transport, and one controller per screen
//! (list, detail, create/edit form) that owns the post lifecycle.
//!
//! # Design
//! - `PostClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse` (host-does-IO). The FFI crate
//!   exposes exactly this layer.
//! - `PostRepository` adds the round-trip; `ReqwestTransport` is the default
//!   executor, tests substitute their own.
//! - Controllers never fail loudly. Repository errors are logged and
//!   returned as `Outcome::Failed`; busy flags are always cleared.
//! - Navigation and image picking are traits the host implements.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod app;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod navigation;
pub mod picker;
pub mod repository;
#[cfg(feature = "reqwest-transport")]
pub mod transport;
pub mod types;
pub mod validation;

pub use app::PostApp;
pub use client::PostClient;
pub use config::{ClientConfig, ConfigError};
pub use controller::{
    DetailContent, DetailState, FormMode, FormState, ListState, Outcome, PostDetailController,
    PostFormController, PostListController, SkipReason, SubmitTarget, Submission,
};
pub use error::ApiError;
pub use http::{FormPart, HttpMethod, HttpRequest, HttpResponse, MultipartBody};
pub use navigation::{drive_focus, Focus, FocusAware, Navigator, Route, Screen, StackNavigator};
pub use picker::{MediaPicker, PickResult};
pub use repository::{HttpPostRepository, PostRepository, Transport};
#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
pub use types::{ImageRef, Post, PostId, PostPayload};
pub use validation::{Field, ValidationError, ValidationErrors};
