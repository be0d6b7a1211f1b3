//! Conversation dispatcher — routes inbound messages against session state.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::protocol::ServerMessage;
use super::registry::SessionRegistry;
use super::session::{SessionPhase, SubmitOutcome};
use crate::assessment::Catalog;
use crate::config::ServerConfig;
use crate::error::{AssessmentError, DispatchError};
use crate::intent::{ClassifyOutcome, IntentClassifier};

/// Keywords (lower-cased, exact match) that begin the questionnaire.
const START_KEYWORDS: &[&str] = &[
    "start",
    "begin",
    "yes",
    "ready",
    "assessment",
    "let's start",
    "let's begin",
];

/// Sent once per session, at connection time.
pub const WELCOME_TEXT: &str = "Namaste! I'm AyurSutra Bot, your Ayurvedic wellness \
     assistant. I'll help you discover your Dosha (Prakriti) and recommend personalized \
     Panchakarma therapies. Are you ready to begin your assessment?";

/// Fixed reply for free text on a completed session.
pub const COMPLETE_NOTICE: &str =
    "You've completed your assessment! Would you like to see your results again?";

/// Fixed reply for unclassified free text before the questionnaire.
pub const START_INVITE: &str =
    "I'm here to help you with your Ayurvedic assessment. Type 'start' to begin!";

/// Routes inbound messages, drives the session state machine, and emits
/// outbound protocol messages through the registry.
pub struct Dispatcher {
    catalog: Arc<Catalog>,
    registry: Arc<SessionRegistry>,
    classifier: Option<Arc<dyn IntentClassifier>>,
    typing_delay: Duration,
    top_doshas: usize,
}

impl Dispatcher {
    pub fn new(
        catalog: Arc<Catalog>,
        registry: Arc<SessionRegistry>,
        classifier: Option<Arc<dyn IntentClassifier>>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            catalog,
            registry,
            classifier,
            typing_delay: config.typing_delay,
            top_doshas: config.top_doshas,
        }
    }

    /// Send the welcome message if this session has never received one.
    ///
    /// Called at connection time, before any user input is processed. The
    /// session lock is held across the send so the welcome lands strictly
    /// before any reply to a concurrently delivered message.
    pub async fn ensure_welcome(&self, session_id: &str) {
        let Some(handle) = self.registry.get(session_id).await else {
            return;
        };
        let mut state = handle.state.lock().await;
        if state.welcome_pending() {
            state.mark_welcome_sent();
            self.deliver(session_id, ServerMessage::text(WELCOME_TEXT)).await;
        }
    }

    /// Handle one inbound message for a session.
    ///
    /// Messages for the same session serialize on the session mutex;
    /// different sessions process in parallel.
    pub async fn handle_inbound(&self, session_id: &str, raw_message: &str) {
        let message = raw_message.trim();
        if message.is_empty() {
            return;
        }

        let handle = match self.registry.get(session_id).await {
            Some(handle) => handle,
            None => {
                warn!(
                    session_id = %session_id,
                    "Message for unknown session, treating as fresh"
                );
                self.registry.insert_fresh(session_id).await
            }
        };
        let mut state = handle.state.lock().await;

        // Typing signal before every substantive reply.
        self.deliver(session_id, ServerMessage::typing()).await;
        if !self.typing_delay.is_zero() {
            tokio::time::sleep(self.typing_delay).await;
        }

        match state.phase() {
            SessionPhase::Complete => {
                // Free text only; a completed session is never mutated here.
                let reply = self.free_text_reply(message, COMPLETE_NOTICE).await;
                self.deliver(session_id, ServerMessage::text(reply)).await;
            }

            SessionPhase::InProgress => {
                match state.submit_answer(&self.catalog, message, self.top_doshas) {
                    Ok(SubmitOutcome::Advanced) => match state.current_question(&self.catalog) {
                        Some(question) => {
                            let msg = ServerMessage::question(
                                question,
                                state.question_number(),
                                self.catalog.len(),
                            );
                            self.deliver(session_id, msg).await;
                        }
                        None => {
                            error!(
                                session_id = %session_id,
                                "Advanced past the last question without completing"
                            );
                            self.registry.deregister(session_id).await;
                        }
                    },
                    Ok(SubmitOutcome::Complete(outcome)) => {
                        info!(
                            session_id = %session_id,
                            dominant = %outcome.dosha_results.dominant_dosha,
                            "Assessment complete"
                        );
                        let msg = ServerMessage::assessment_complete(&outcome);
                        self.deliver(session_id, msg).await;
                    }
                    Err(AssessmentError::InvalidOption { question_id, .. }) => {
                        // Recoverable: state untouched, re-ask the same question.
                        match state.current_question(&self.catalog) {
                            Some(question) => {
                                let msg = ServerMessage::reask(
                                    question,
                                    state.question_number(),
                                    self.catalog.len(),
                                );
                                self.deliver(session_id, msg).await;
                            }
                            None => {
                                error!(
                                    session_id = %session_id,
                                    question_id = %question_id,
                                    "No current question to re-ask"
                                );
                                self.registry.deregister(session_id).await;
                            }
                        }
                    }
                    Err(e) => {
                        // Contract violation — tear the session down rather
                        // than leave an undefined state for the next message.
                        error!(
                            session_id = %session_id,
                            error = %e,
                            "Unrecoverable error handling answer, tearing session down"
                        );
                        self.registry.deregister(session_id).await;
                    }
                }
            }

            SessionPhase::NotStarted => {
                if is_start_keyword(message) {
                    match state.start(&self.catalog) {
                        Some(first) => {
                            info!(session_id = %session_id, "Assessment started");
                            let msg = ServerMessage::question(first, 1, self.catalog.len());
                            self.deliver(session_id, msg).await;
                        }
                        None => {
                            error!(session_id = %session_id, "Question catalog is empty");
                            self.registry.deregister(session_id).await;
                        }
                    }
                } else {
                    let reply = self.free_text_reply(message, START_INVITE).await;
                    self.deliver(session_id, ServerMessage::text(reply)).await;
                }
            }
        }
    }

    /// Answer free text via the classifier when configured, else the
    /// fixed default for the current conversational context.
    async fn free_text_reply(&self, message: &str, default: &str) -> String {
        if let Some(classifier) = &self.classifier {
            match classifier.try_classify(message).await {
                ClassifyOutcome::Reply(reply) => return reply,
                ClassifyOutcome::NotClassified => {
                    info!("Free text not classified, using default reply");
                }
            }
        }
        default.to_string()
    }

    /// Send an outbound message; a delivery failure discards the send and
    /// deregisters the session (never retried).
    async fn deliver(&self, session_id: &str, message: ServerMessage) {
        match self.registry.send(session_id, message).await {
            Ok(()) => {}
            Err(DispatchError::DeliveryFailure { .. }) => {
                warn!(
                    session_id = %session_id,
                    "Outbound delivery failed, deregistering session"
                );
                self.registry.deregister(session_id).await;
            }
            Err(DispatchError::UnknownSession { .. }) => {
                warn!(
                    session_id = %session_id,
                    "Dropped outbound message for unregistered session"
                );
            }
        }
    }
}

fn is_start_keyword(message: &str) -> bool {
    let lowered = message.to_lowercase();
    START_KEYWORDS.iter().any(|k| *k == lowered)
}
