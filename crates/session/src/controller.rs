//! Pure review state machine. No I/O happens here; `ReviewSession` feeds it
//! the size of the unrated view and performs the effects it asks for.

use shared::domain::Rating;

/// Records reviewed per session before the completion page is shown.
pub const DEFAULT_BATCH_CAP: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Choice made with Good/Bad that has not been submitted yet.
    pub current_rating: Option<Rating>,
    /// Offset into the unrated view of the current pass.
    pub current_record_index: usize,
    pub rated: u64,
    pub skipped: u64,
    /// Set once the completion page has been reached; never cleared.
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reviewing,
    RatingPending,
    Complete,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        if self.completed {
            Phase::Complete
        } else if self.current_rating.is_some() {
            Phase::RatingPending
        } else {
            Phase::Reviewing
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEvent {
    Choose(Rating),
    Submit,
    Skip,
}

impl ReviewEvent {
    pub fn name(self) -> &'static str {
        match self {
            ReviewEvent::Choose(Rating::Good) => "choose_good",
            ReviewEvent::Choose(Rating::Bad) => "choose_bad",
            ReviewEvent::Submit => "submit",
            ReviewEvent::Skip => "skip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Index into the unrated view of the item to display.
    At(usize),
    Complete,
}

/// Decides what the current pass shows. The returned state carries the
/// completion latch and any re-anchoring of the index.
pub fn locate(mut state: SessionState, unrated: usize, batch_cap: usize) -> (SessionState, Cursor) {
    if state.completed || unrated == 0 || state.current_record_index >= batch_cap {
        state.completed = true;
        return (state, Cursor::Complete);
    }

    if state.current_record_index >= unrated {
        state.current_record_index = 0;
    }

    let index = state.current_record_index;
    (state, Cursor::At(index))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Store the rating for the displayed item.
    Persist(Rating),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub effect: Effect,
    /// False when the event is not offered in the current phase.
    pub applied: bool,
}

impl Transition {
    fn ignored(state: &SessionState) -> Self {
        Self {
            state: state.clone(),
            effect: Effect::None,
            applied: false,
        }
    }
}

pub fn apply(state: &SessionState, event: ReviewEvent) -> Transition {
    match (state.phase(), event) {
        (Phase::Complete, _) => Transition::ignored(state),
        (_, ReviewEvent::Choose(rating)) => Transition {
            state: SessionState {
                current_rating: Some(rating),
                ..state.clone()
            },
            effect: Effect::None,
            applied: true,
        },
        (Phase::RatingPending, ReviewEvent::Submit) => {
            let Some(rating) = state.current_rating else {
                return Transition::ignored(state);
            };
            Transition {
                state: SessionState {
                    current_rating: None,
                    current_record_index: state.current_record_index + 1,
                    rated: state.rated + 1,
                    ..state.clone()
                },
                effect: Effect::Persist(rating),
                applied: true,
            }
        }
        (Phase::Reviewing, ReviewEvent::Skip) => Transition {
            state: SessionState {
                current_record_index: state.current_record_index + 1,
                skipped: state.skipped + 1,
                ..state.clone()
            },
            effect: Effect::None,
            applied: true,
        },
        (Phase::Reviewing, ReviewEvent::Submit) | (Phase::RatingPending, ReviewEvent::Skip) => {
            Transition::ignored(state)
        }
    }
}
