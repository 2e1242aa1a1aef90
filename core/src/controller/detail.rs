//! Detail screen: view or delete one post.
//!
//! The screen's only state machine is `{loading | removing} -> idle`. While
//! either flag is set the screen shows a blocking spinner and every other
//! action is skipped.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::form::FormMode;
use super::{Lifecycle, Outcome, SkipReason};
use crate::navigation::{FocusAware, Navigator, Route};
use crate::repository::PostRepository;
use crate::types::{Post, PostId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailContent {
    /// Nothing fetched yet.
    Pending,
    Ready(Post),
    /// The first fetch failed; render a "failed to load" state.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailState {
    pub loading: bool,
    pub removing: bool,
    pub content: DetailContent,
}

impl DetailState {
    pub fn is_busy(&self) -> bool {
        self.loading || self.removing
    }

    pub fn post(&self) -> Option<&Post> {
        match &self.content {
            DetailContent::Ready(post) => Some(post),
            _ => None,
        }
    }
}

impl Default for DetailState {
    fn default() -> Self {
        Self {
            loading: true,
            removing: false,
            content: DetailContent::Pending,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: DetailState,
    fetching: bool,
}

pub struct PostDetailController {
    id: PostId,
    repository: Arc<dyn PostRepository>,
    navigator: Arc<dyn Navigator>,
    inner: Mutex<Inner>,
    lifecycle: Lifecycle,
}

impl PostDetailController {
    pub fn new(
        id: PostId,
        repository: Arc<dyn PostRepository>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            id,
            repository,
            navigator,
            inner: Mutex::new(Inner::default()),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn id(&self) -> &PostId {
        &self.id
    }

    pub fn snapshot(&self) -> DetailState {
        self.inner.lock().state.clone()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Fetch the post fresh from the service.
    ///
    /// A failed refetch keeps an already loaded post on screen; a failed
    /// first fetch moves the content to `Unavailable`.
    pub async fn load(&self) -> Outcome<Post> {
        {
            let mut inner = self.inner.lock();
            if inner.fetching || inner.state.removing {
                return Outcome::Skipped(SkipReason::Busy);
            }
            inner.fetching = true;
            inner.state.loading = true;
        }

        let result = self.repository.get_by_id(&self.id).await;

        let mut inner = self.inner.lock();
        inner.fetching = false;
        inner.state.loading = false;
        match result {
            Ok(post) => {
                if !self.lifecycle.is_mounted() {
                    debug!(post_id = %self.id, "detail unmounted, dropping result");
                    return Outcome::Discarded;
                }
                inner.state.content = DetailContent::Ready(post.clone());
                Outcome::Done(post)
            }
            Err(err) => {
                warn!(post_id = %self.id, error = %err, "failed to load post");
                if self.lifecycle.is_mounted() && inner.state.content == DetailContent::Pending {
                    inner.state.content = DetailContent::Unavailable;
                }
                Outcome::Failed(err)
            }
        }
    }

    /// Delete the loaded post and return to the list.
    pub async fn delete(&self) -> Outcome<()> {
        let id = {
            let mut inner = self.inner.lock();
            if inner.state.is_busy() {
                return Outcome::Skipped(SkipReason::Busy);
            }
            let Some(post) = inner.state.post() else {
                return Outcome::Skipped(SkipReason::NothingLoaded);
            };
            let id = post.id.clone();
            inner.state.removing = true;
            id
        };

        let result = self.repository.delete(&id).await;
        self.inner.lock().state.removing = false;

        match result {
            Ok(()) => {
                info!(post_id = %id, "post deleted");
                if !self.lifecycle.is_mounted() {
                    return Outcome::Discarded;
                }
                self.navigator.navigate_to(Route::Home);
                Outcome::Done(())
            }
            Err(err) => {
                warn!(post_id = %id, error = %err, "failed to delete post");
                Outcome::Failed(err)
            }
        }
    }

    /// Open the form seeded with the loaded post.
    pub fn edit(&self) -> Outcome<()> {
        let post = {
            let inner = self.inner.lock();
            if inner.state.is_busy() {
                return Outcome::Skipped(SkipReason::Busy);
            }
            match inner.state.post() {
                Some(post) => post.clone(),
                None => return Outcome::Skipped(SkipReason::NothingLoaded),
            }
        };
        self.navigator.navigate_to(Route::PostForm(FormMode::Edit(post)));
        Outcome::Done(())
    }

    pub fn back(&self) {
        self.navigator.go_back();
    }
}

#[async_trait]
impl FocusAware for PostDetailController {
    async fn focus_changed(&self, focused: bool) {
        if self.lifecycle.focus(focused) {
            let _ = self.load().await;
        }
    }
}
