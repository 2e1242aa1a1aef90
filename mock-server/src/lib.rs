use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Upper bound on a multipart request, image included.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "imgUrl", default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
}

/// Response envelope used by every endpoint that returns posts.
#[derive(Debug, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Clone, Debug)]
struct Upload {
    content_type: String,
    bytes: Bytes,
}

#[derive(Default)]
pub struct Store {
    posts: Vec<Post>,
    uploads: HashMap<String, Upload>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/post", get(list_posts).post(create_post))
        .route("/post/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/uploads/{file}", get(get_upload))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

#[derive(Default)]
struct PostForm {
    title: Option<String>,
    description: Option<String>,
    image: Option<(String, Upload)>,
}

async fn read_form(mut multipart: Multipart) -> Result<PostForm, StatusCode> {
    let mut form = PostForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(field.text().await.map_err(bad_form)?),
            "description" => form.description = Some(field.text().await.map_err(bad_form)?),
            "img" => {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or("upload.bin")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_form)?;
                form.image = Some((file_name, Upload { content_type, bytes }));
            }
            _ => {}
        }
    }
    Ok(form)
}

fn bad_form(err: axum::extract::multipart::MultipartError) -> StatusCode {
    warn!(error = %err, "unreadable multipart body");
    StatusCode::BAD_REQUEST
}

/// Store an upload and return its public URL.
fn store_upload(store: &mut Store, headers: &HeaderMap, file_name: &str, upload: Upload) -> String {
    let key = format!("{}-{}", Uuid::new_v4().simple(), file_name.replace('/', "_"));
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    store.uploads.insert(key.clone(), upload);
    format!("http://{host}/uploads/{key}")
}

/// Forget the upload behind a post's image URL.
fn release_upload(store: &mut Store, img_url: Option<&str>) {
    let key = img_url.and_then(|url| url.rsplit_once("/uploads/")).map(|(_, key)| key);
    if let Some(key) = key {
        store.uploads.remove(key);
    }
}

fn required(value: Option<String>) -> Result<String, StatusCode> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(StatusCode::BAD_REQUEST)
}

async fn list_posts(State(db): State<Db>) -> Json<Data<Vec<Post>>> {
    let store = db.read().await;
    Json(Data {
        data: store.posts.clone(),
    })
}

async fn create_post(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Data<Post>>), StatusCode> {
    let form = read_form(multipart).await?;
    let title = required(form.title)?;
    let description = required(form.description)?;

    let mut store = db.write().await;
    let img_url = form
        .image
        .map(|(file_name, upload)| store_upload(&mut store, &headers, &file_name, upload));
    let post = Post {
        id: Uuid::new_v4().to_string(),
        title,
        description,
        img_url,
    };
    store.posts.push(post.clone());
    info!(post_id = %post.id, "post created");
    Ok((StatusCode::CREATED, Json(Data { data: post })))
}

async fn get_post(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Data<Post>>, StatusCode> {
    let store = db.read().await;
    store
        .posts
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(|data| Json(Data { data }))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_post(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Data<Post>>, StatusCode> {
    let form = read_form(multipart).await?;

    let mut store = db.write().await;
    let index = store
        .posts
        .iter()
        .position(|p| p.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let img_url = form
        .image
        .map(|(file_name, upload)| store_upload(&mut store, &headers, &file_name, upload));

    if img_url.is_some() {
        let previous = std::mem::replace(&mut store.posts[index].img_url, img_url);
        release_upload(&mut store, previous.as_deref());
    }

    let post = &mut store.posts[index];
    if let Some(title) = form.title {
        post.title = title;
    }
    if let Some(description) = form.description {
        post.description = description;
    }
    info!(post_id = %id, "post updated");
    Ok(Json(Data { data: post.clone() }))
}

async fn delete_post(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    let index = store
        .posts
        .iter()
        .position(|p| p.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let post = store.posts.remove(index);
    release_upload(&mut store, post.img_url.as_deref());
    info!(post_id = %id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_upload(
    State(db): State<Db>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = db.read().await;
    let upload = store.uploads.get(&file).cloned().ok_or(StatusCode::NOT_FOUND)?;
    Ok(([(header::CONTENT_TYPE, upload.content_type)], upload.bytes))
}
