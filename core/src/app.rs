//! Composition root.
//!
//! `PostApp` is built once from a `ClientConfig` and hands out controllers
//! that share one repository. A native shell keeps a single `PostApp` and
//! asks it for a controller whenever a screen mounts.

use std::sync::Arc;

use crate::controller::{FormMode, PostDetailController, PostFormController, PostListController};
use crate::navigation::Navigator;
use crate::picker::MediaPicker;
use crate::repository::PostRepository;
use crate::types::PostId;

#[derive(Clone)]
pub struct PostApp {
    repository: Arc<dyn PostRepository>,
}

impl PostApp {
    /// Wire the HTTP repository over `reqwest`.
    #[cfg(feature = "reqwest-transport")]
    pub fn connect(config: crate::config::ClientConfig) -> Result<Self, crate::error::ApiError> {
        use crate::client::PostClient;
        use crate::repository::HttpPostRepository;
        use crate::transport::ReqwestTransport;

        let transport = ReqwestTransport::new(&config)?;
        let repository = HttpPostRepository::new(PostClient::from_config(&config), transport);
        Ok(Self::with_repository(Arc::new(repository)))
    }

    /// Wrap a repository the host already has.
    pub fn with_repository(repository: Arc<dyn PostRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> Arc<dyn PostRepository> {
        Arc::clone(&self.repository)
    }

    pub fn list_controller(&self, navigator: Arc<dyn Navigator>) -> PostListController {
        PostListController::new(self.repository(), navigator)
    }

    pub fn detail_controller(
        &self,
        id: PostId,
        navigator: Arc<dyn Navigator>,
    ) -> PostDetailController {
        PostDetailController::new(id, self.repository(), navigator)
    }

    pub fn form_controller(
        &self,
        mode: FormMode,
        navigator: Arc<dyn Navigator>,
        picker: Arc<dyn MediaPicker>,
    ) -> PostFormController {
        PostFormController::new(mode, self.repository(), navigator, picker)
    }
}
