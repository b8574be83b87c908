//! Review session orchestration: one evaluation pass per user action.
//!
//! A pass loads the dataset, removes every item that already has a stored
//! rating, and asks the [`controller`] what to show. Events are applied to
//! the item the pass displays and their effects are written to the rating
//! store by [`ReviewSession::dispatch`]; the caller keeps the returned state
//! and computes the next pass from it.

pub mod controller;
pub mod dataset;
pub mod export;

use shared::domain::{Item, Rating, RatingRecord};
use storage::Storage;
use thiserror::Error;
use tracing::{debug, info};

use controller::{apply, locate, Cursor, Effect, ReviewEvent, SessionState, DEFAULT_BATCH_CAP};
use dataset::{decode_image, DatasetError, ItemSource};
use export::{ratings_csv, ExportError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("rating store failure: {0:#}")]
    Store(anyhow::Error),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl SessionError {
    pub fn is_source_not_found(&self) -> bool {
        matches!(self, SessionError::Dataset(err) if err.is_source_not_found())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewView {
    pub item: Item,
    /// Decoded payload of `item.image`.
    pub image: Vec<u8>,
    pub pending: Option<Rating>,
    pub rated: u64,
    pub skipped: u64,
    /// Zero-based position of `item` in the unrated view.
    pub position: usize,
    /// Size of the unrated view, `item` included.
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteView {
    pub records: Vec<RatingRecord>,
    pub rated: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Reviewing(ReviewView),
    Complete(CompleteView),
}

/// Result of one evaluation pass: the state to keep and what to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass {
    pub state: SessionState,
    pub view: View,
}

pub struct ReviewSession<S> {
    storage: Storage,
    source: S,
    batch_cap: usize,
}

impl<S: ItemSource> ReviewSession<S> {
    pub fn new(storage: Storage, source: S) -> Self {
        Self {
            storage,
            source,
            batch_cap: DEFAULT_BATCH_CAP,
        }
    }

    pub fn with_batch_cap(mut self, batch_cap: usize) -> Self {
        self.batch_cap = batch_cap;
        self
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn evaluate(&self, state: &SessionState) -> Result<Pass, SessionError> {
        let mut unrated = self.unrated_items().await?;
        let remaining = unrated.len();
        let was_completed = state.completed;
        let (state, cursor) = locate(state.clone(), remaining, self.batch_cap);

        let view = match cursor {
            Cursor::At(position) => {
                let item = unrated.swap_remove(position);
                let image = decode_image(&item)?;
                View::Reviewing(ReviewView {
                    item,
                    image,
                    pending: state.current_rating,
                    rated: state.rated,
                    skipped: state.skipped,
                    position,
                    remaining,
                })
            }
            Cursor::Complete => {
                if !was_completed {
                    info!(
                        rated = state.rated,
                        skipped = state.skipped,
                        remaining,
                        "review session complete"
                    );
                }
                let records = self
                    .storage
                    .fetch_ratings()
                    .await
                    .map_err(SessionError::Store)?;
                View::Complete(CompleteView {
                    records,
                    rated: state.rated,
                    skipped: state.skipped,
                })
            }
        };

        Ok(Pass { state, view })
    }

    /// Applies `event` to the item a pass over `state` displays and commits
    /// its effect. The returned state reflects everything already written to
    /// the store, so it must replace `state` even if a later pass fails.
    pub async fn dispatch(
        &self,
        event: ReviewEvent,
        state: &SessionState,
    ) -> Result<SessionState, SessionError> {
        let pass = self.evaluate(state).await?;
        let View::Reviewing(review) = &pass.view else {
            debug!(event = event.name(), "session complete; event ignored");
            return Ok(pass.state);
        };

        let transition = apply(&pass.state, event);
        if !transition.applied {
            debug!(
                event = event.name(),
                item = %review.item.id,
                "event not offered for current state; ignored"
            );
            return Ok(pass.state);
        }

        match transition.effect {
            Effect::Persist(rating) => {
                let timestamp = self
                    .storage
                    .upsert_rating(&review.item.id, &review.item.description, rating)
                    .await
                    .map_err(SessionError::Store)?;
                info!(
                    item = %review.item.id,
                    %rating,
                    %timestamp,
                    rated = transition.state.rated,
                    "rating submitted"
                );
            }
            Effect::None if event == ReviewEvent::Skip => {
                info!(
                    item = %review.item.id,
                    skipped = transition.state.skipped,
                    "item skipped"
                );
            }
            Effect::None => {
                debug!(event = event.name(), item = %review.item.id, "rating chosen");
            }
        }

        Ok(transition.state)
    }

    pub async fn export_csv(&self) -> Result<String, SessionError> {
        let records = self
            .storage
            .fetch_ratings()
            .await
            .map_err(SessionError::Store)?;
        Ok(ratings_csv(&records)?)
    }

    /// Dataset items without a stored rating, in dataset order.
    pub async fn unrated_items(&self) -> Result<Vec<Item>, SessionError> {
        let items = self.source.load().await?;
        let rated = self
            .storage
            .rated_item_ids()
            .await
            .map_err(SessionError::Store)?;
        Ok(items
            .into_iter()
            .filter(|item| !rated.contains(&item.id))
            .collect())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
