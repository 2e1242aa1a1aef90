//! Home screen: the list of posts.
//!
//! The list is a transient cache. Every successful load replaces it
//! wholesale; a failed load leaves the previous list in place.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::form::FormMode;
use super::{Lifecycle, Outcome, SkipReason};
use crate::navigation::{FocusAware, Navigator, Route};
use crate::repository::PostRepository;
use crate::types::{Post, PostId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub posts: Vec<Post>,
    /// Pull-to-refresh indicator.
    pub refreshing: bool,
}

#[derive(Debug, Default)]
struct Inner {
    state: ListState,
    in_flight: bool,
}

pub struct PostListController {
    repository: Arc<dyn PostRepository>,
    navigator: Arc<dyn Navigator>,
    inner: Mutex<Inner>,
    lifecycle: Lifecycle,
}

impl PostListController {
    pub fn new(repository: Arc<dyn PostRepository>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            repository,
            navigator,
            inner: Mutex::new(Inner::default()),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn snapshot(&self) -> ListState {
        self.inner.lock().state.clone()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Reload the list. Triggered by focus.
    pub async fn load(&self) -> Outcome<()> {
        if !self.begin(false) {
            return Outcome::Skipped(SkipReason::Busy);
        }
        let outcome = self.fetch().await;
        self.inner.lock().in_flight = false;
        outcome
    }

    /// Pull-to-refresh. `refreshing` is cleared whatever the result.
    pub async fn refresh(&self) -> Outcome<()> {
        if !self.begin(true) {
            return Outcome::Skipped(SkipReason::Busy);
        }
        let outcome = self.fetch().await;
        {
            let mut inner = self.inner.lock();
            inner.in_flight = false;
            inner.state.refreshing = false;
        }
        outcome
    }

    /// Open the detail screen for `id`.
    pub fn select(&self, id: &PostId) {
        self.navigator.navigate_to(Route::Detail(id.clone()));
    }

    /// Open the form in create mode.
    pub fn add(&self) {
        self.navigator.navigate_to(Route::PostForm(FormMode::Create));
    }

    fn begin(&self, refreshing: bool) -> bool {
        let mut inner = self.inner.lock();
        if inner.in_flight {
            debug!("post list load already in flight");
            return false;
        }
        inner.in_flight = true;
        if refreshing {
            inner.state.refreshing = true;
        }
        true
    }

    async fn fetch(&self) -> Outcome<()> {
        match self.repository.list().await {
            Ok(posts) => {
                if !self.lifecycle.is_mounted() {
                    debug!("post list unmounted, dropping result");
                    return Outcome::Discarded;
                }
                debug!(count = posts.len(), "posts loaded");
                self.inner.lock().state.posts = posts;
                Outcome::Done(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load posts");
                Outcome::Failed(err)
            }
        }
    }
}

#[async_trait]
impl FocusAware for PostListController {
    async fn focus_changed(&self, focused: bool) {
        if self.lifecycle.focus(focused) {
            let _ = self.load().await;
        }
    }
}
