//! Screen controllers for the post lifecycle.
//!
//! # Overview
//! One controller per screen: the list (`PostListController`), a single post
//! (`PostDetailController`) and the create/edit form (`PostFormController`).
//! Each owns its screen state behind a lock, talks to the service only
//! through `PostRepository`, and reports screen transitions to a
//! `Navigator`.
//!
//! # Design
//! - Methods take `&self` so a host can hold the controller in an `Arc`,
//!   drive it from several tasks and unmount it while a call is in flight.
//! - Busy flags are single-flight guards: a second trigger while one is set
//!   returns `Outcome::Skipped(SkipReason::Busy)` without a network call.
//! - No repository error escapes as a panic or `Err`. It is logged with
//!   `tracing` and returned inside `Outcome::Failed`, and the busy flag is
//!   always cleared.
//! - Results arriving after `Lifecycle::unmount` are dropped
//!   (`Outcome::Discarded`).

pub mod detail;
pub mod form;
pub mod list;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ApiError;
use crate::validation::ValidationErrors;

pub use detail::{DetailContent, DetailState, PostDetailController};
pub use form::{FormMode, FormState, PostFormController, SubmitTarget, Submission};
pub use list::{ListState, PostListController};

/// Result of a controller action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    /// The repository call failed. Already logged; state is unchanged apart
    /// from cleared busy flags.
    Failed(ApiError),
    /// Local validation rejected the input; nothing was sent.
    Invalid(ValidationErrors),
    Skipped(SkipReason),
    /// The screen was unmounted before the call completed.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another operation of this controller is still in flight.
    Busy,
    /// There is no loaded post to act on.
    NothingLoaded,
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Outcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Failed(err) => Outcome::Failed(err),
            Outcome::Invalid(errors) => Outcome::Invalid(errors),
            Outcome::Skipped(reason) => Outcome::Skipped(reason),
            Outcome::Discarded => Outcome::Discarded,
        }
    }
}

/// Mounted and focused flags of one screen instance.
#[derive(Debug)]
pub struct Lifecycle {
    mounted: AtomicBool,
    focused: AtomicBool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            mounted: AtomicBool::new(true),
            focused: AtomicBool::new(false),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn mount(&self) {
        self.mounted.store(true, Ordering::SeqCst);
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.focused.store(false, Ordering::SeqCst);
    }

    /// Record a focus change. Returns true only for a blurred → focused
    /// transition of a mounted screen. Changes while unmounted are ignored.
    pub fn focus(&self, focused: bool) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let was = self.focused.swap(focused, Ordering::SeqCst);
        focused && !was
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
