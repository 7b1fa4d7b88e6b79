use std::collections::BTreeMap;

use crate::api::types::{Survey, VoteResult};
use crate::session::{ErrorState, SurveySession};

/// Feedback panel on the form. Exactly one is shown.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback<'a> {
    Neutral,
    Error {
        error: &'a ErrorState,
        missing: &'a [u64],
    },
    Success {
        results: &'a [VoteResult],
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormView<'a> {
    pub survey: &'a Survey,
    pub selections: &'a BTreeMap<u64, u64>,
    pub feedback: Feedback<'a>,
    pub submitting: bool,
    /// First unanswered question, for focusing after a blocked submit.
    pub focus: Option<u64>,
}

/// Screen to display, derived from session state alone.
#[derive(Debug, Clone, PartialEq)]
pub enum View<'a> {
    NoSurvey { message: &'a str },
    NotFound { message: &'a str },
    Loading { survey_id: Option<u64> },
    Unavailable { error: &'a ErrorState },
    ThankYou { results: &'a [VoteResult] },
    Form(FormView<'a>),
}

impl<'a> View<'a> {
    pub fn derive(session: &'a SurveySession) -> View<'a> {
        let error = session.error();

        if let Some(err) = error.filter(|e| e.is_not_found()) {
            return View::NotFound {
                message: &err.message,
            };
        }
        if session.is_submitted() {
            return View::ThankYou {
                results: session.results(),
            };
        }
        if session.survey_id().is_none() {
            if let Some(err) = error {
                return View::NoSurvey {
                    message: &err.message,
                };
            }
            return View::Loading { survey_id: None };
        }

        let Some(survey) = session.survey() else {
            return match error {
                Some(err) if !session.is_loading() => View::Unavailable { error: err },
                _ => View::Loading {
                    survey_id: session.survey_id(),
                },
            };
        };

        let feedback = match error {
            Some(err) => Feedback::Error {
                error: err,
                missing: session.missing(),
            },
            None if !session.results().is_empty() => Feedback::Success {
                results: session.results(),
            },
            None => Feedback::Neutral,
        };

        View::Form(FormView {
            survey,
            selections: session.selections(),
            feedback,
            submitting: session.is_submitting(),
            focus: session.missing().first().copied(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::VoteResult;
    use crate::context::source::SourceContext;
    use crate::context::store::MemoryStore;
    use crate::session::state::tests::{api_error, sample_survey, FakeApi};
    use crate::session::state::{MSG_ANSWER_ALL, MSG_NOT_ACTIVE, MSG_NO_SURVEY};

    #[test]
    fn fresh_session_is_loading() {
        let session = SurveySession::new();
        assert_eq!(View::derive(&session), View::Loading { survey_id: None });
    }

    #[test]
    fn missing_identifier_shows_no_survey() {
        let mut session = SurveySession::new();
        session.clear_for_missing_survey();
        assert_eq!(
            View::derive(&session),
            View::NoSurvey {
                message: MSG_NO_SURVEY
            }
        );
    }

    #[test]
    fn in_flight_load_is_loading() {
        let mut session = SurveySession::new();
        session.begin_load(8);
        assert_eq!(View::derive(&session), View::Loading { survey_id: Some(8) });
    }

    #[test]
    fn not_found_takes_precedence() {
        let mut session = SurveySession::new();
        let ticket = session.begin_load(8);
        session.finish_load(ticket, Err(api_error(404, "Pesquisa não encontrada")));
        assert!(matches!(View::derive(&session), View::NotFound { .. }));
    }

    #[test]
    fn inactive_survey_is_unavailable_without_questions() {
        let mut session = SurveySession::new();
        let ticket = session.begin_load(8);
        session.finish_load(ticket, Ok(sample_survey(8, false)));
        match View::derive(&session) {
            View::Unavailable { error } => assert_eq!(error.message, MSG_NOT_ACTIVE),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn blocked_submit_marks_missing_and_focuses_first() {
        let mut session = SurveySession::new();
        let ticket = session.begin_load(8);
        session.finish_load(ticket, Ok(sample_survey(8, true)));
        session.select(1, 11);
        session.prepare_votes(&SourceContext::default());

        match View::derive(&session) {
            View::Form(form) => {
                assert_eq!(form.focus, Some(3));
                match form.feedback {
                    Feedback::Error { error, missing } => {
                        assert_eq!(error.message, MSG_ANSWER_ALL);
                        assert_eq!(missing, &[3, 2]);
                    }
                    other => panic!("unexpected feedback: {other:?}"),
                }
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_submission_shows_one_error_and_no_results() {
        let api = FakeApi::with_survey(sample_survey(8, true));
        api.reply(Ok(VoteResult {
            vote_id: 1,
            session_id: None,
            antifraud_token: None,
        }));
        api.reply(Err(api_error(500, "Falha interna")));
        let mut store = MemoryStore::default();
        let mut session = SurveySession::new();
        let ticket = session.begin_load(8);
        session.finish_load(ticket, Ok(sample_survey(8, true)));
        for (q, o) in [(3, 31), (1, 11), (2, 21)] {
            session.select(q, o);
        }
        session.submit(&api, &mut store, SourceContext::default()).await;

        match View::derive(&session) {
            View::Form(form) => match form.feedback {
                Feedback::Error { error, .. } => assert_eq!(error.message, "Falha interna"),
                other => panic!("unexpected feedback: {other:?}"),
            },
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[tokio::test]
    async fn vote_404_shows_not_found_screen() {
        let api = FakeApi::with_survey(sample_survey(8, true));
        api.reply(Err(api_error(404, "Not Found")));
        let mut store = MemoryStore::default();
        let mut session = SurveySession::new();
        let ticket = session.begin_load(8);
        session.finish_load(ticket, Ok(sample_survey(8, true)));
        for (q, o) in [(3, 31), (1, 11), (2, 21)] {
            session.select(q, o);
        }
        session.submit(&api, &mut store, SourceContext::default()).await;
        assert!(matches!(View::derive(&session), View::NotFound { .. }));
    }
}
