//! `reqwest`-backed transport.
//!
//! Encodes `MultipartBody` parts into a `reqwest::multipart::Form`, reading
//! file parts from disk at send time. Status codes are passed through
//! untouched so `PostClient` stays the only place that interprets them.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{FormPart, HttpMethod, HttpRequest, HttpResponse, MultipartBody};
use crate::repository::Transport;
use crate::types::ImageRef;

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport_error)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.path);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.multipart(encode_form(body).await?);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.text().await.map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

async fn encode_form(body: MultipartBody) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for part in body.parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                file_name,
                content_type,
                uri,
            } => {
                let path = ImageRef::new(uri).local_path().to_string();
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|e| ApiError::Transport(format!("cannot read image {path}: {e}")))?;
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&content_type)
                    .map_err(transport_error)?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}
