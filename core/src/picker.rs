//! Media picker boundary.

use async_trait::async_trait;

use crate::types::ImageRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickResult {
    Picked(ImageRef),
    Cancelled,
}

/// Asks the platform for a single image.
#[async_trait]
pub trait MediaPicker: Send + Sync {
    async fn pick_image(&self) -> PickResult;
}
