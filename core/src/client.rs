//! Stateless HTTP request builder and response parser for the post API.
//!
//! # Design
//! `PostClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip, keeping the client
//! deterministic and free of I/O.
//!
//! The service wraps reads in `{ "data": ... }`. Create and update responses
//! were never pinned down, so every parser accepts the payload either wrapped
//! or bare.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{FormPart, HttpMethod, HttpRequest, HttpResponse, MultipartBody};
use crate::types::{Post, PostId, PostPayload};

/// Multipart field names expected by the service.
pub const IMAGE_FIELD: &str = "img";
pub const TITLE_FIELD: &str = "title";
pub const DESCRIPTION_FIELD: &str = "description";

/// Synchronous, stateless client for the post API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct PostClient {
    base_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

impl PostClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_posts(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/post", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get_post(&self, id: &PostId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/post/{id}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_post(&self, payload: &PostPayload) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/post", self.base_url),
            headers: write_headers(),
            body: Some(multipart(payload)),
        }
    }

    pub fn build_update_post(&self, id: &PostId, payload: &PostPayload) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Put,
            path: format!("{}/post/{id}", self.base_url),
            headers: write_headers(),
            body: Some(multipart(payload)),
        }
    }

    pub fn build_delete_post(&self, id: &PostId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/post/{id}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list_posts(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_get_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_create_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_update_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    /// Delete needs no body; any 2xx is an acknowledgement.
    pub fn parse_delete_post(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

fn write_headers() -> Vec<(String, String)> {
    vec![("accept".to_string(), "application/json".to_string())]
}

/// Image first (when present), then the text fields, which are always sent.
fn multipart(payload: &PostPayload) -> MultipartBody {
    let mut parts = Vec::with_capacity(3);
    if let Some(image) = &payload.image {
        parts.push(FormPart::File {
            name: IMAGE_FIELD.to_string(),
            file_name: image.file_name(),
            content_type: image.content_type(),
            uri: image.uri().to_string(),
        });
    }
    parts.push(FormPart::Text {
        name: TITLE_FIELD.to_string(),
        value: payload.title.clone(),
    });
    parts.push(FormPart::Text {
        name: DESCRIPTION_FIELD.to_string(),
        value: payload.description.clone(),
    });
    MultipartBody { parts }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(Envelope::into_inner)
        .map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
