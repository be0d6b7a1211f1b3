//! Session state machine — one conversation's questionnaire progress.

use crate::assessment::{
    recommend, score, Answer, AssessmentOutcome, Catalog, QuestionDefinition,
};
use crate::error::AssessmentError;

/// The phase a session is in.
///
/// Progresses `NotStarted → InProgress → Complete`; `start()` may re-enter
/// from any phase, discarding prior answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Complete,
}

/// Outcome of a successful answer submission.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The answer was stored; the next question is now current.
    Advanced,
    /// The questionnaire finished; scoring and recommendation ran.
    Complete(AssessmentOutcome),
}

/// Mutable state for one conversation.
///
/// Invariants: `current_index == answers.len()` except transiently inside
/// a transition; `complete ⇔ current_index == catalog.len()`; once
/// complete, answers only change through an explicit `start()` restart.
#[derive(Debug, Clone)]
pub struct SessionState {
    session_id: String,
    answers: Vec<Answer>,
    current_index: usize,
    complete: bool,
    results: Option<AssessmentOutcome>,
    welcome_sent: bool,
    /// Whether `start()` has ever run — distinguishes "question[0] is
    /// pending" from "the questionnaire was never begun".
    started: bool,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            answers: Vec::new(),
            current_index: 0,
            complete: false,
            results: None,
            welcome_sent: false,
            started: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> SessionPhase {
        if self.complete {
            SessionPhase::Complete
        } else if self.started {
            SessionPhase::InProgress
        } else {
            SessionPhase::NotStarted
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// 1-based number of the current question, for progress payloads.
    pub fn question_number(&self) -> usize {
        self.current_index + 1
    }

    pub fn results(&self) -> Option<&AssessmentOutcome> {
        self.results.as_ref()
    }

    pub fn welcome_pending(&self) -> bool {
        !self.welcome_sent
    }

    pub fn mark_welcome_sent(&mut self) {
        self.welcome_sent = true;
    }

    /// The question awaiting an answer, if any.
    pub fn current_question<'a>(&self, catalog: &'a Catalog) -> Option<&'a QuestionDefinition> {
        catalog.question_at(self.current_index)
    }

    /// (Re)start the questionnaire, discarding any prior progress.
    ///
    /// Valid from any phase; the welcome-sent guard survives a restart.
    /// Returns question[0].
    pub fn start<'a>(&mut self, catalog: &'a Catalog) -> Option<&'a QuestionDefinition> {
        self.answers.clear();
        self.current_index = 0;
        self.complete = false;
        self.results = None;
        self.started = true;
        catalog.question_at(0)
    }

    /// Submit an answer to the current question.
    ///
    /// On `InvalidOption` the state is untouched and the caller re-prompts.
    /// Reaching the end of the catalog runs scoring and recommendation
    /// synchronously and stores the outcome.
    pub fn submit_answer(
        &mut self,
        catalog: &Catalog,
        selected_option: &str,
        top_doshas: usize,
    ) -> std::result::Result<SubmitOutcome, AssessmentError> {
        if self.complete {
            return Err(AssessmentError::AlreadyComplete {
                session_id: self.session_id.clone(),
            });
        }
        let question = self.current_question(catalog).ok_or_else(|| {
            // current_index == catalog.len() without `complete` only happens
            // on an empty catalog.
            AssessmentError::IncompleteAnswerSet {
                expected: catalog.len(),
                actual: self.answers.len(),
            }
        })?;

        let token = catalog.normalize(&question.id, selected_option)?;
        self.answers.push(Answer::new(question.id.clone(), token));
        self.current_index += 1;

        if self.current_index == catalog.len() {
            let dosha_results = score(catalog, &self.answers)?;
            let panchakarma_recs = recommend(&dosha_results, top_doshas);
            let outcome = AssessmentOutcome {
                dosha_results,
                panchakarma_recs,
            };
            self.results = Some(outcome.clone());
            self.complete = true;
            Ok(SubmitOutcome::Complete(outcome))
        } else {
            Ok(SubmitOutcome::Advanced)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::Dosha;

    /// Display options that all vote Vata, in catalog order.
    const ALL_VATA: [&str; 10] = [
        "Thin and light",
        "Dry and rough",
        "Thin and dry",
        "Irregular and variable",
        "Irregular",
        "Variable and irregular",
        "Light and interrupted",
        "Anxious and creative",
        "Worried and anxious",
        "Warm and sunny",
    ];

    #[test]
    fn fresh_session_is_not_started() {
        let state = SessionState::new("s1");
        assert_eq!(state.phase(), SessionPhase::NotStarted);
        assert_eq!(state.current_index(), 0);
        assert!(state.answers().is_empty());
        assert!(state.results().is_none());
        assert!(state.welcome_pending());
    }

    #[test]
    fn start_returns_first_question() {
        let catalog = Catalog::standard();
        let mut state = SessionState::new("s1");

        let first = state.start(&catalog).unwrap();
        assert_eq!(first.id, "body_frame");
        assert_eq!(state.phase(), SessionPhase::InProgress);
        assert_eq!(state.question_number(), 1);
    }

    #[test]
    fn full_run_completes_with_results() {
        let catalog = Catalog::standard();
        let mut state = SessionState::new("s1");
        state.start(&catalog);

        for (i, option) in ALL_VATA.iter().enumerate() {
            let outcome = state.submit_answer(&catalog, option, 2).unwrap();
            // Invariant holds after every transition.
            assert_eq!(state.current_index(), state.answers().len());
            if i < 9 {
                assert!(matches!(outcome, SubmitOutcome::Advanced));
                assert!(!state.is_complete());
            } else {
                match outcome {
                    SubmitOutcome::Complete(outcome) => {
                        assert_eq!(outcome.dosha_results.percentages.vata, 100);
                        assert_eq!(outcome.dosha_results.dominant_dosha, Dosha::Vata);
                        assert!(outcome
                            .panchakarma_recs
                            .therapy_details
                            .iter()
                            .all(|t| t.dosha == Dosha::Vata));
                    }
                    other => panic!("expected Complete, got {other:?}"),
                }
            }
        }

        assert_eq!(state.phase(), SessionPhase::Complete);
        assert!(state.results().is_some());
    }

    #[test]
    fn invalid_option_leaves_state_untouched() {
        let catalog = Catalog::standard();
        let mut state = SessionState::new("s1");
        state.start(&catalog);
        state.submit_answer(&catalog, "Thin and light", 2).unwrap();

        let err = state.submit_answer(&catalog, "something else", 2).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidOption { .. }));
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.answers().len(), 1);
        assert_eq!(state.current_question(&catalog).unwrap().id, "skin_type");
    }

    #[test]
    fn option_matching_is_byte_exact() {
        let catalog = Catalog::standard();
        let mut state = SessionState::new("s1");
        state.start(&catalog);

        let err = state.submit_answer(&catalog, "thin and light", 2).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidOption { .. }));
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn submit_after_complete_is_a_contract_violation() {
        let catalog = Catalog::standard();
        let mut state = SessionState::new("s1");
        state.start(&catalog);
        for option in ALL_VATA {
            state.submit_answer(&catalog, option, 2).unwrap();
        }

        let err = state.submit_answer(&catalog, "Thin and light", 2).unwrap_err();
        assert!(matches!(err, AssessmentError::AlreadyComplete { .. }));
        assert_eq!(state.answers().len(), 10);
    }

    #[test]
    fn restart_after_complete_resets_progress() {
        let catalog = Catalog::standard();
        let mut state = SessionState::new("s1");
        state.mark_welcome_sent();
        state.start(&catalog);
        for option in ALL_VATA {
            state.submit_answer(&catalog, option, 2).unwrap();
        }
        assert_eq!(state.phase(), SessionPhase::Complete);

        let first = state.start(&catalog).unwrap();
        assert_eq!(first.id, "body_frame");
        assert_eq!(state.current_index(), 0);
        assert!(state.answers().is_empty());
        assert!(state.results().is_none());
        assert_eq!(state.phase(), SessionPhase::InProgress);
        // The welcome guard is per session lifetime, not per run.
        assert!(!state.welcome_pending());
    }

    #[test]
    fn restart_mid_flight_discards_answers() {
        let catalog = Catalog::standard();
        let mut state = SessionState::new("s1");
        state.start(&catalog);
        state.submit_answer(&catalog, "Thin and light", 2).unwrap();
        state.submit_answer(&catalog, "Normal", 2).unwrap();

        state.start(&catalog);
        assert!(state.answers().is_empty());
        assert_eq!(state.current_index(), 0);
        assert_eq!(state.current_question(&catalog).unwrap().id, "body_frame");
    }

    #[test]
    fn answers_keep_question_order() {
        let catalog = Catalog::standard();
        let mut state = SessionState::new("s1");
        state.start(&catalog);
        state.submit_answer(&catalog, "Medium build", 2).unwrap();
        state.submit_answer(&catalog, "Oily and sensitive", 2).unwrap();

        let answers = state.answers();
        assert_eq!(answers[0].question_id, "body_frame");
        assert_eq!(answers[0].token, "medium");
        assert_eq!(answers[1].question_id, "skin_type");
        assert_eq!(answers[1].token, "oily");
    }
}
