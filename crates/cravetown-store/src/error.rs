//! Errors surfaced across the persistence boundary.

use std::path::PathBuf;

use cravetown_logic::dimensions::RegistryError;
use cravetown_logic::documents::DuplicateIdError;
use cravetown_logic::vector::ShapeError;
use thiserror::Error;

use crate::config::{ConfigError, DocumentKind};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{document} not saved, duplicate ids: {}", join(.duplicates))]
    DuplicateIds {
        document: DocumentKind,
        duplicates: Vec<DuplicateIdError>,
    },

    #[error("{document} has no item with id '{id}'")]
    UnknownItem { document: DocumentKind, id: String },

    #[error("invalid dimension definitions: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("invalid store configuration: {}", join(.0))]
    InvalidConfig(Vec<ConfigError>),
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
