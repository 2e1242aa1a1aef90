//! Asynchronous post repository over a pluggable transport.
//!
//! # Design
//! `PostRepository` is the seam the controllers depend on. The HTTP
//! implementation is a thin loop of build, execute, parse: the request
//! description and response interpretation stay in `PostClient`, and the
//! `Transport` only moves bytes. Every call is independent; nothing is cached.

use async_trait::async_trait;
use tracing::debug;

use crate::client::PostClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Post, PostId, PostPayload};

/// Remote post storage as seen by the controllers.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// All posts, in the order the service returns them.
    async fn list(&self) -> Result<Vec<Post>, ApiError>;

    async fn get_by_id(&self, id: &PostId) -> Result<Post, ApiError>;

    /// Persist a new post; the returned copy carries the server-assigned id.
    async fn create(&self, payload: &PostPayload) -> Result<Post, ApiError>;

    async fn update(&self, id: &PostId, payload: &PostPayload) -> Result<Post, ApiError>;

    async fn delete(&self, id: &PostId) -> Result<(), ApiError>;
}

/// Executes one HTTP round-trip.
///
/// Non-2xx responses are returned as data, not as errors; only failures to
/// obtain a response at all become `ApiError::Transport`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `PostRepository` backed by `PostClient` and a `Transport`.
#[derive(Debug, Clone)]
pub struct HttpPostRepository<T> {
    client: PostClient,
    transport: T,
}

impl<T: Transport> HttpPostRepository<T> {
    pub fn new(client: PostClient, transport: T) -> Self {
        Self { client, transport }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), path = %request.path, "executing request");
        let response = self.transport.execute(request).await?;
        debug!(status = response.status, "received response");
        Ok(response)
    }
}

#[async_trait]
impl<T: Transport> PostRepository for HttpPostRepository<T> {
    async fn list(&self) -> Result<Vec<Post>, ApiError> {
        let response = self.send(self.client.build_list_posts()).await?;
        self.client.parse_list_posts(response)
    }

    async fn get_by_id(&self, id: &PostId) -> Result<Post, ApiError> {
        let response = self.send(self.client.build_get_post(id)).await?;
        self.client.parse_get_post(response)
    }

    async fn create(&self, payload: &PostPayload) -> Result<Post, ApiError> {
        let response = self.send(self.client.build_create_post(payload)).await?;
        self.client.parse_create_post(response)
    }

    async fn update(&self, id: &PostId, payload: &PostPayload) -> Result<Post, ApiError> {
        let response = self.send(self.client.build_update_post(id, payload)).await?;
        self.client.parse_update_post(response)
    }

    async fn delete(&self, id: &PostId) -> Result<(), ApiError> {
        let response = self.send(self.client.build_delete_post(id)).await?;
        self.client.parse_delete_post(response)
    }
}
