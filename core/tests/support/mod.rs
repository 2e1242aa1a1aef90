//! Test doubles shared by the controller and integration suites.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use post_core::{
    ApiError, Focus, ImageRef, MediaPicker, Navigator, PickResult, Post, PostId, PostPayload,
    PostRepository, Route, Screen,
};
use tokio::sync::{watch, Semaphore};

pub fn post(id: &str, title: &str) -> Post {
    Post {
        id: PostId::new(id),
        title: title.to_string(),
        description: format!("{title} description"),
        image_url: None,
    }
}

pub fn post_with_image(id: &str, title: &str, url: &str) -> Post {
    Post {
        image_url: Some(url.to_string()),
        ..post(id, title)
    }
}

/// Repository call as recorded by `FakeRepository`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Get(PostId),
    Create(PostPayload),
    Update(PostId, PostPayload),
    Delete(PostId),
}

/// In-memory repository with call recording, scripted failures and an
/// optional gate that holds calls until permits are added.
#[derive(Default)]
pub struct FakeRepository {
    posts: Mutex<Vec<Post>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<ApiError>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    next_id: Mutex<u32>,
}

impl FakeRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_posts(posts: Vec<Post>) -> Arc<Self> {
        let repo = Self::default();
        *repo.posts.lock() = posts;
        Arc::new(repo)
    }

    pub fn set_posts(&self, posts: Vec<Post>) {
        *self.posts.lock() = posts;
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// The next call fails with `err` instead of touching the store.
    pub fn fail_next(&self, err: ApiError) {
        self.failures.lock().push_back(err);
    }

    /// Block every subsequent call until a permit is added to the returned
    /// semaphore.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    async fn enter(&self, call: Call) -> Result<(), ApiError> {
        self.calls.lock().push(call);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        match self.failures.lock().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PostRepository for FakeRepository {
    async fn list(&self) -> Result<Vec<Post>, ApiError> {
        self.enter(Call::List).await?;
        Ok(self.posts())
    }

    async fn get_by_id(&self, id: &PostId) -> Result<Post, ApiError> {
        self.enter(Call::Get(id.clone())).await?;
        self.posts
            .lock()
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn create(&self, payload: &PostPayload) -> Result<Post, ApiError> {
        self.enter(Call::Create(payload.clone())).await?;
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            format!("new-{}", *next)
        };
        let post = Post {
            id: PostId::new(id),
            title: payload.title.clone(),
            description: payload.description.clone(),
            image_url: payload.image.as_ref().map(upload_url),
        };
        self.posts.lock().push(post.clone());
        Ok(post)
    }

    async fn update(&self, id: &PostId, payload: &PostPayload) -> Result<Post, ApiError> {
        self.enter(Call::Update(id.clone(), payload.clone())).await?;
        let mut posts = self.posts.lock();
        let post = posts.iter_mut().find(|p| &p.id == id).ok_or(ApiError::NotFound)?;
        post.title = payload.title.clone();
        post.description = payload.description.clone();
        if let Some(image) = &payload.image {
            post.image_url = Some(upload_url(image));
        }
        Ok(post.clone())
    }

    async fn delete(&self, id: &PostId) -> Result<(), ApiError> {
        self.enter(Call::Delete(id.clone())).await?;
        let mut posts = self.posts.lock();
        let before = posts.len();
        posts.retain(|p| &p.id != id);
        if posts.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

fn upload_url(image: &ImageRef) -> String {
    format!("http://fake/uploads/{}", image.file_name())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    To(Route),
    Back,
}

/// Navigator that only records what the controllers asked for.
pub struct RecordingNavigator {
    events: Mutex<Vec<NavEvent>>,
    focus: watch::Sender<Focus>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            focus: watch::Sender::new(Focus::visible()),
        })
    }

    pub fn events(&self) -> Vec<NavEvent> {
        self.events.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, route: Route) {
        self.events.lock().push(NavEvent::To(route));
    }

    fn go_back(&self) {
        self.events.lock().push(NavEvent::Back);
    }

    fn subscribe_focus(&self, _screen: Screen) -> watch::Receiver<Focus> {
        self.focus.subscribe()
    }
}

/// Picker that returns pre-scripted results, then `Cancelled`.
#[derive(Default)]
pub struct ScriptedPicker {
    results: Mutex<VecDeque<PickResult>>,
    requests: Mutex<usize>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedPicker {
    pub fn new(results: impl IntoIterator<Item = PickResult>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into_iter().collect()),
            ..Self::default()
        })
    }

    /// Number of times the picker was opened.
    pub fn requests(&self) -> usize {
        *self.requests.lock()
    }

    /// Keep the picker open until a permit is added to the returned
    /// semaphore.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl MediaPicker for ScriptedPicker {
    async fn pick_image(&self) -> PickResult {
        *self.requests.lock() += 1;
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        self.results.lock().pop_front().unwrap_or(PickResult::Cancelled)
    }
}

/// Poll `check` until it holds, failing the test after two seconds.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check().await {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Synchronous variant of `eventually`.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    eventually(|| std::future::ready(check())).await;
}

/// Route `tracing` output through the test harness. `RUST_LOG` controls the
/// level; repeated calls are harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("post_core=debug")),
        )
        .with_test_writer()
        .try_init();
}
