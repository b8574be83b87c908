use session::{controller::SessionState, dataset::CsvFile, ReviewSession};
use tokio::sync::Mutex;

use crate::render::PageSettings;

/// One reviewer per process: the session state lives here for the
/// lifetime of the server and is replaced after every pass.
pub(crate) struct AppState {
    pub(crate) review: ReviewSession<CsvFile>,
    pub(crate) session: Mutex<SessionState>,
    pub(crate) page: PageSettings,
}

impl AppState {
    pub(crate) fn new(review: ReviewSession<CsvFile>, page: PageSettings) -> Self {
        Self {
            review,
            session: Mutex::new(SessionState::default()),
            page,
        }
    }
}
