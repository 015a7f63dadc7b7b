//! Headless views: the state each screen holds and the actions it offers.
//! Rendering lives in [`render`], the interactive loop in [`console`].

pub mod board;
pub mod console;
pub mod create;
pub mod detail;
pub mod groups;
pub mod render;
pub mod settings;

use crate::api::client::ApiError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("{0}")]
    Validation(String),

    #[error("notice {0} not found")]
    NotFound(i64),

    #[error("no reply target selected")]
    NoReplyTarget,

    #[error(transparent)]
    Api(ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ApiError> for ViewError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(id) => ViewError::NotFound(id),
            other => ViewError::Api(other),
        }
    }
}
