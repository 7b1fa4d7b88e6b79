use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::client::SurveyApi;
use crate::api::error::{vote_failure_message, Error, MSG_GENERIC, MSG_UNREACHABLE};
use crate::api::types::{Survey, VotePayload, VoteResult, VoteStatus};
use crate::context::source::SourceContext;
use crate::context::store::{load_context, save_context, KeyValueStore};

pub const MSG_NO_SURVEY: &str = "Nenhuma pesquisa especificada.";
pub const MSG_NOT_ACTIVE: &str = "Esta pesquisa não está ativa no momento.";
pub const MSG_SELECT_TO_VOTE: &str = "Selecione uma pergunta e uma opção para votar.";
pub const MSG_ANSWER_ALL: &str = "Responda todas as perguntas para enviar seu voto.";

/// The single user-visible error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorState {
    pub status: Option<u16>,
    pub message: String,
    pub details: Option<String>,
}

impl ErrorState {
    pub fn local(message: &str) -> Self {
        Self {
            status: None,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Load failures keep the normalized server message.
    fn from_load_failure(err: Error) -> Self {
        match err {
            Error::Api(api) => Self {
                status: Some(api.status),
                message: api.message,
                details: api.details,
            },
            Error::Transport(_) => Self::local(MSG_UNREACHABLE),
            _ => Self::local(MSG_GENERIC),
        }
    }

    /// Vote failures go through the domain message mapping.
    fn from_vote_failure(err: Error) -> Self {
        match err {
            Error::Api(api) => Self {
                status: Some(api.status),
                message: vote_failure_message(Some(api.status), &api.message),
                details: api.details,
            },
            Error::Transport(_) => Self::local(MSG_UNREACHABLE),
            _ => Self::local(MSG_GENERIC),
        }
    }
}

/// Identifies one load attempt. Only the ticket from the most recent
/// [`SurveySession::begin_load`] may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub survey_id: u64,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected,
    UnknownQuestion,
    UnknownOption,
    NoSurvey,
}

/// In-memory state of one survey page: loaded structure, answers, the last
/// submission outcome and the active error.
#[derive(Debug, Default)]
pub struct SurveySession {
    survey_id: Option<u64>,
    generation: u64,
    loading: bool,
    submitting: bool,
    submitted: bool,
    survey: Option<Survey>,
    loaded_at: Option<DateTime<Utc>>,
    selections: BTreeMap<u64, u64>,
    missing: Vec<u64>,
    results: Vec<VoteResult>,
    error: Option<ErrorState>,
}

impl SurveySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn survey_id(&self) -> Option<u64> {
        self.survey_id
    }

    pub fn survey(&self) -> Option<&Survey> {
        self.survey.as_ref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn selections(&self) -> &BTreeMap<u64, u64> {
        &self.selections
    }

    pub fn missing(&self) -> &[u64] {
        &self.missing
    }

    pub fn results(&self) -> &[VoteResult] {
        &self.results
    }

    pub fn error(&self) -> Option<&ErrorState> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    fn reset(&mut self) {
        self.survey = None;
        self.loaded_at = None;
        self.selections.clear();
        self.missing.clear();
        self.results.clear();
        self.error = None;
        self.submitted = false;
        self.submitting = false;
    }

    /// The location carries no survey identifier. Terminal: no request is made
    /// and any in-flight load becomes stale.
    pub fn clear_for_missing_survey(&mut self) {
        self.generation += 1;
        self.reset();
        self.survey_id = None;
        self.loading = false;
        self.error = Some(ErrorState::local(MSG_NO_SURVEY));
    }

    /// Starts a load attempt, superseding any earlier one.
    pub fn begin_load(&mut self, survey_id: u64) -> LoadTicket {
        self.generation += 1;
        self.reset();
        self.survey_id = Some(survey_id);
        self.loading = true;
        debug!("Loading survey {survey_id} (attempt {})", self.generation);
        LoadTicket {
            survey_id,
            generation: self.generation,
        }
    }

    /// Applies a load result. Returns `false`, leaving state untouched, when
    /// the ticket has been superseded by a later load or navigation.
    pub fn finish_load(&mut self, ticket: LoadTicket, outcome: Result<Survey, Error>) -> bool {
        if ticket.generation != self.generation || self.survey_id != Some(ticket.survey_id) {
            debug!("Discarding stale load result for survey {}", ticket.survey_id);
            return false;
        }
        self.loading = false;
        match outcome {
            Ok(survey) if survey.is_active => {
                info!(
                    "Loaded survey {} with {} questions",
                    survey.id,
                    survey.questions.len()
                );
                self.loaded_at = Some(Utc::now());
                self.survey = Some(survey);
            }
            Ok(survey) => {
                info!("Survey {} is not active", survey.id);
                self.error = Some(ErrorState::local(MSG_NOT_ACTIVE));
            }
            Err(err) => {
                warn!("Failed to load survey {}: {err}", ticket.survey_id);
                self.error = Some(ErrorState::from_load_failure(err));
            }
        }
        true
    }

    /// Records the user's choice for one question. Clears the active error.
    pub fn select(&mut self, question_id: u64, option_id: u64) -> SelectOutcome {
        let Some(survey) = &self.survey else {
            return SelectOutcome::NoSurvey;
        };
        let Some(question) = survey.question(question_id) else {
            warn!("Ignoring selection for unknown question {question_id}");
            return SelectOutcome::UnknownQuestion;
        };
        if question.option(option_id).is_none() {
            warn!("Ignoring unknown option {option_id} for question {question_id}");
            return SelectOutcome::UnknownOption;
        }
        self.selections.insert(question_id, option_id);
        self.missing.retain(|id| *id != question_id);
        self.error = None;
        SelectOutcome::Selected
    }

    /// Leaves the thank-you screen; the last results stay visible on the form.
    pub fn return_to_form(&mut self) {
        self.submitted = false;
    }

    /// Checks preconditions and builds one payload per question in survey
    /// order. On failure sets the error (and missing ids) and returns `None`.
    pub fn prepare_votes(&mut self, context: &SourceContext) -> Option<Vec<VotePayload>> {
        let (Some(survey), Some(started_at)) = (&self.survey, self.loaded_at) else {
            self.error = Some(ErrorState::local(MSG_SELECT_TO_VOTE));
            return None;
        };

        let missing: Vec<u64> = survey
            .questions
            .iter()
            .filter(|q| !self.selections.contains_key(&q.id))
            .map(|q| q.id)
            .collect();
        if !missing.is_empty() {
            debug!("Submission blocked, unanswered questions: {missing:?}");
            self.missing = missing;
            self.error = Some(ErrorState::local(MSG_ANSWER_ALL));
            return None;
        }

        let completed_at = Utc::now();
        let payloads = survey
            .questions
            .iter()
            .filter_map(|q| {
                self.selections.get(&q.id).map(|option_id| VotePayload {
                    survey_id: survey.id,
                    question_id: q.id,
                    option_id: *option_id,
                    context: context.clone(),
                    status: VoteStatus::Completed,
                    started_at,
                    completed_at,
                })
            })
            .collect();
        self.missing.clear();
        Some(payloads)
    }

    /// Validates, then submits one vote per question in order, stopping at
    /// the first failure. Results of a failed attempt are never exposed.
    pub async fn submit<A, S>(&mut self, api: &A, store: &mut S, fresh: SourceContext)
    where
        A: SurveyApi + ?Sized,
        S: KeyValueStore + ?Sized,
    {
        if self.submitting || self.loading {
            debug!("Ignoring submit while a request is outstanding");
            return;
        }
        if self.submitted {
            debug!("Ignoring submit on the thank-you screen");
            return;
        }
        let context = fresh.merged_over(&load_context(store));
        let Some(payloads) = self.prepare_votes(&context) else {
            return;
        };

        self.submitting = true;
        self.error = None;
        self.results.clear();

        let mut results = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            match api.submit_vote(payload).await {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!(
                        "Vote for question {} failed after {} accepted: {err}",
                        payload.question_id,
                        results.len()
                    );
                    self.error = Some(ErrorState::from_vote_failure(err));
                    self.submitting = false;
                    return;
                }
            }
        }

        if let Err(err) = save_context(store, &context) {
            warn!("Unable to persist source context: {err}");
        }
        info!("Submitted {} votes", results.len());
        self.results = results;
        self.submitted = true;
        self.submitting = false;
    }
}
