pub mod page;
pub mod state;

pub use page::SurveyPage;
pub use state::{ErrorState, SelectOutcome, SurveySession};
