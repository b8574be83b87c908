//! Candidate items for review, read eagerly from an external source.
//! Image payloads stay base64 until [`decode_image`] is asked for one.

use std::{
    collections::HashSet,
    io,
    path::PathBuf,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use shared::domain::{Item, ItemId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("The file at path `{}` was not found. Please check the file path.", .path.display())]
    SourceNotFound { path: PathBuf },
    #[error("failed to read dataset `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed dataset row at line {line}: {source}")]
    Malformed {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("image for item `{item}` is not valid base64: {source}")]
    InvalidImage {
        item: ItemId,
        #[source]
        source: base64::DecodeError,
    },
    #[error("item `{item}` appears more than once in the dataset")]
    DuplicateItem { item: ItemId },
}

impl DatasetError {
    pub fn is_source_not_found(&self) -> bool {
        matches!(self, DatasetError::SourceNotFound { .. })
    }
}

#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Loads the full item set in source order.
    async fn load(&self) -> Result<Vec<Item>, DatasetError>;

    /// Human-readable name of the source for logs.
    fn describe(&self) -> String;
}

/// A CSV file with `item`, `description` and base64 `image` columns.
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ItemSource for CsvFile {
    async fn load(&self) -> Result<Vec<Item>, DatasetError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Err(DatasetError::SourceNotFound {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(DatasetError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        parse_items(&bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed in-memory item set.
#[derive(Debug, Clone, Default)]
pub struct StaticItems(pub Vec<Item>);

#[async_trait]
impl ItemSource for StaticItems {
    async fn load(&self) -> Result<Vec<Item>, DatasetError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory dataset ({} items)", self.0.len())
    }
}

#[derive(Debug, Deserialize)]
struct DatasetRow {
    item: String,
    #[serde(default)]
    description: String,
    image: String,
}

pub fn parse_items(bytes: &[u8]) -> Result<Vec<Item>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(bytes);
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for (index, row) in reader.deserialize::<DatasetRow>().enumerate() {
        let row = row.map_err(|source| DatasetError::Malformed {
            line: source
                .position()
                .map(|position| position.line())
                .unwrap_or(index as u64 + 2),
            source,
        })?;

        let id = ItemId(row.item);
        if !seen.insert(id.clone()) {
            return Err(DatasetError::DuplicateItem { item: id });
        }

        // Line-wrapped base64 is common in exported spreadsheets.
        let image = row
            .image
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        items.push(Item {
            id,
            description: row.description,
            image,
        });
    }

    Ok(items)
}

/// Decodes the image of an item about to be displayed. Images of other rows
/// are never checked, so one bad cell does not block the rest of the file.
pub fn decode_image(item: &Item) -> Result<Vec<u8>, DatasetError> {
    STANDARD
        .decode(item.image.as_bytes())
        .map_err(|source| DatasetError::InvalidImage {
            item: item.id.clone(),
            source,
        })
}

#[cfg(test)]
#[path = "tests/dataset_tests.rs"]
mod tests;
