use tokio::sync::watch;
use tracing::debug;

use super::state::{SelectOutcome, SurveySession};
use crate::api::client::SurveyApi;
use crate::context::source::SourceContext;
use crate::context::store::KeyValueStore;
use crate::navigation::{Location, Navigator};
use crate::view::View;

/// Wires the session to its ports: the API, the context store and the
/// navigation feed.
pub struct SurveyPage<A, S> {
    api: A,
    store: S,
    navigation: watch::Receiver<Location>,
    user_agent: Option<String>,
    session: SurveySession,
}

impl<A, S> SurveyPage<A, S>
where
    A: SurveyApi,
    S: KeyValueStore,
{
    pub fn new(api: A, store: S, navigator: &Navigator, user_agent: Option<String>) -> Self {
        Self {
            api,
            store,
            navigation: navigator.subscribe(),
            user_agent,
            session: SurveySession::new(),
        }
    }

    pub fn session(&self) -> &SurveySession {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> View<'_> {
        View::derive(&self.session)
    }

    /// Loads whatever survey the current location names. If the location
    /// moves to another survey while the request is in flight, that request
    /// is abandoned and the newer one takes over.
    pub async fn follow_navigation(&mut self) {
        let Self {
            api,
            navigation,
            session,
            ..
        } = self;
        let mut location = navigation.borrow_and_update().clone();

        loop {
            let Some(survey_id) = location.survey_id() else {
                session.clear_for_missing_survey();
                return;
            };
            let ticket = session.begin_load(survey_id);
            let fetch = api.survey_structure(survey_id);
            tokio::pin!(fetch);

            let mut feed_open = true;
            let superseded = loop {
                tokio::select! {
                    outcome = &mut fetch => {
                        session.finish_load(ticket, outcome);
                        break None;
                    }
                    changed = navigation.changed(), if feed_open => {
                        if changed.is_err() {
                            feed_open = false;
                            continue;
                        }
                        let next = navigation.borrow_and_update().clone();
                        if next.survey_id() != Some(survey_id) {
                            debug!("Navigation moved away from survey {survey_id} during load");
                            break Some(next);
                        }
                    }
                }
            };

            match superseded {
                Some(next) => location = next,
                None => return,
            }
        }
    }

    /// Reacts to a navigation event delivered outside a load. Only a change
    /// of survey identifier triggers a reload.
    pub async fn sync_location(&mut self) {
        let changed = self.navigation.has_changed().unwrap_or(false);
        let target = self.navigation.borrow().survey_id();
        if (changed && target != self.session.survey_id()) || self.never_loaded() {
            self.follow_navigation().await;
        } else if changed {
            let _ = self.navigation.borrow_and_update();
        }
    }

    fn never_loaded(&self) -> bool {
        self.session.survey_id().is_none() && self.session.error().is_none()
    }

    pub fn select(&mut self, question_id: u64, option_id: u64) -> SelectOutcome {
        self.session.select(question_id, option_id)
    }

    pub fn return_to_form(&mut self) {
        self.session.return_to_form();
    }

    /// Submits with context derived from the current location and user agent.
    pub async fn submit(&mut self) {
        let location = self.navigation.borrow().clone();
        let fresh = SourceContext::derive(&location, self.user_agent.as_deref());
        self.session.submit(&self.api, &mut self.store, fresh).await;
    }
}
