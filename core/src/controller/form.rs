//! Create/edit form.
//!
//! # Design
//! The mode is fixed when the screen opens: `FormMode::Create` or
//! `FormMode::Edit(seed)`. `Submission::prepare` turns the current field
//! values into either a create or an update of the seed, and decides whether
//! the image goes along:
//!
//! - create: attach the image if one was picked;
//! - edit: attach it only if it differs from the seed's image, so an
//!   untouched image is never uploaded again.
//!
//! Title and description are always sent. Nothing is sent unless both pass
//! validation.
//!
//! A submission always ends the form: whatever the service answers, the
//! fields are reset to their initial values and the screen goes back. The
//! typed `Outcome` tells the caller whether the save actually happened.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{Lifecycle, Outcome, SkipReason};
use crate::navigation::Navigator;
use crate::picker::{MediaPicker, PickResult};
use crate::repository::PostRepository;
use crate::types::{ImageRef, Post, PostId, PostPayload};
use crate::validation::{self, Field, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Edit an existing post, seeded with its current values.
    Edit(Post),
}

impl FormMode {
    pub fn seed(&self) -> Option<&Post> {
        match self {
            FormMode::Create => None,
            FormMode::Edit(post) => Some(post),
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, FormMode::Edit(_))
    }

}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitTarget {
    Create,
    Update(PostId),
}

/// A validated request ready to hand to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub target: SubmitTarget,
    pub payload: PostPayload,
}

impl Submission {
    pub fn prepare(
        mode: &FormMode,
        title: &str,
        description: &str,
        image: Option<&ImageRef>,
    ) -> Result<Self, ValidationErrors> {
        validation::validate(title, description)?;

        let (target, image) = match mode {
            FormMode::Create => (SubmitTarget::Create, image.cloned()),
            FormMode::Edit(seed) => {
                let changed = image.filter(|img| !img.matches_url(seed.image_url.as_deref()));
                (SubmitTarget::Update(seed.id.clone()), changed.cloned())
            }
        };

        Ok(Self {
            target,
            payload: PostPayload {
                title: title.trim().to_string(),
                description: description.trim().to_string(),
                image,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub title: String,
    pub description: String,
    /// Picked image, or the seed's image URL in edit mode.
    pub image: Option<ImageRef>,
    pub submitting: bool,
    /// Field-level errors to show next to the inputs.
    pub errors: ValidationErrors,
}

impl FormState {
    pub fn initial(mode: &FormMode) -> Self {
        let seed = mode.seed();
        Self {
            title: seed.map(|p| p.title.clone()).unwrap_or_default(),
            description: seed.map(|p| p.description.clone()).unwrap_or_default(),
            image: seed.and_then(|p| p.image_url.as_deref()).map(ImageRef::new),
            submitting: false,
            errors: ValidationErrors::default(),
        }
    }
}

pub struct PostFormController {
    mode: FormMode,
    repository: Arc<dyn PostRepository>,
    navigator: Arc<dyn Navigator>,
    picker: Arc<dyn MediaPicker>,
    state: Mutex<FormState>,
    /// Bumped whenever the fields are reset after a submission.
    resets: AtomicU64,
    lifecycle: Lifecycle,
}

impl PostFormController {
    pub fn new(
        mode: FormMode,
        repository: Arc<dyn PostRepository>,
        navigator: Arc<dyn Navigator>,
        picker: Arc<dyn MediaPicker>,
    ) -> Self {
        let state = FormState::initial(&mode);
        Self {
            mode,
            repository,
            navigator,
            picker,
            state: Mutex::new(state),
            resets: AtomicU64::new(0),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn snapshot(&self) -> FormState {
        self.state.lock().clone()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Update the title. An error already shown for it is re-checked.
    pub fn set_title(&self, value: impl Into<String>) {
        self.set_field(Field::Title, value.into());
    }

    pub fn set_description(&self, value: impl Into<String>) {
        self.set_field(Field::Description, value.into());
    }

    /// The user left `field`: validate it and show the result.
    pub fn blur(&self, field: Field) {
        let mut state = self.state.lock();
        let result = validation::validate_field(field, field_value(&state, field));
        state.errors.set(field, result);
    }

    /// Ask the picker for an image. Returns whether the selection changed.
    ///
    /// A pick that resolves after the form was submitted or reset is dropped.
    pub async fn pick_image(&self) -> bool {
        let resets = {
            let state = self.state.lock();
            if state.submitting {
                return false;
            }
            self.resets.load(Ordering::SeqCst)
        };
        let image = match self.picker.pick_image().await {
            PickResult::Picked(image) => image,
            PickResult::Cancelled => return false,
        };
        if !self.lifecycle.is_mounted() {
            return false;
        }
        let mut state = self.state.lock();
        if state.submitting || self.resets.load(Ordering::SeqCst) != resets {
            debug!(uri = image.uri(), "late image pick dropped");
            return false;
        }
        debug!(uri = image.uri(), "image picked");
        state.image = Some(image);
        true
    }

    /// What a submission would send right now.
    pub fn submission(&self) -> Result<Submission, ValidationErrors> {
        let state = self.state.lock();
        Submission::prepare(&self.mode, &state.title, &state.description, state.image.as_ref())
    }

    pub async fn submit(&self) -> Outcome<Post> {
        let submission = {
            let mut state = self.state.lock();
            if state.submitting {
                return Outcome::Skipped(SkipReason::Busy);
            }
            let prepared = Submission::prepare(
                &self.mode,
                &state.title,
                &state.description,
                state.image.as_ref(),
            );
            match prepared {
                Ok(submission) => {
                    state.errors = ValidationErrors::default();
                    state.submitting = true;
                    submission
                }
                Err(errors) => {
                    debug!(%errors, "form rejected");
                    state.errors = errors.clone();
                    return Outcome::Invalid(errors);
                }
            }
        };

        let Submission { target, payload } = submission;
        let result = match &target {
            SubmitTarget::Create => self.repository.create(&payload).await,
            SubmitTarget::Update(id) => self.repository.update(id, &payload).await,
        };
        self.state.lock().submitting = false;

        let outcome = match result {
            Ok(post) => {
                info!(post_id = %post.id, image = payload.image.is_some(), "post saved");
                Outcome::Done(post)
            }
            Err(err) => {
                warn!(error = %err, edit = self.mode.is_edit(), "failed to save post");
                Outcome::Failed(err)
            }
        };

        if !self.lifecycle.is_mounted() {
            return Outcome::Discarded;
        }
        {
            let mut state = self.state.lock();
            *state = FormState::initial(&self.mode);
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
        self.navigator.go_back();
        outcome
    }

    fn set_field(&self, field: Field, value: String) {
        let mut state = self.state.lock();
        match field {
            Field::Title => state.title = value,
            Field::Description => state.description = value,
        }
        if state.errors.get(field).is_some() {
            let result = validation::validate_field(field, field_value(&state, field));
            state.errors.set(field, result);
        }
    }
}

fn field_value(state: &FormState, field: Field) -> &str {
    match field {
        Field::Title => &state.title,
        Field::Description => &state.description,
    }
}

/// Forms do not reload on focus; the trait is implemented so a host can
/// drive every screen the same way.
#[async_trait]
impl crate::navigation::FocusAware for PostFormController {
    async fn focus_changed(&self, focused: bool) {
        self.lifecycle.focus(focused);
    }
}
