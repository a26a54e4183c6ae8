//! User interaction capability: blocking alerts and the fallback question

use crate::messages::Messages;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// Surface through which the pipeline talks to the user
///
/// Both calls suspend the caller until the user has seen (and for
/// `confirm_fallback`, answered) the prompt.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Show a message the user must acknowledge
    async fn alert(&self, message: &str);

    /// Ask whether to continue in mock mode after `reason` made the remote call fail
    async fn confirm_fallback(&self, reason: &str) -> bool;
}

/// How a [`ConsolePrompter`] answers the fallback question
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Ask on the terminal
    #[default]
    Ask,
    /// Always fall back without asking
    Always,
    /// Never fall back
    Never,
}

/// Something else drawing on the terminal, such as a progress spinner
///
/// The console prompter writes and reads only inside [`suspend`](Self::suspend),
/// so its lines are not redrawn over while the user answers.
pub trait TerminalOverlay: Send + Sync + std::fmt::Debug {
    /// Run `f` with the overlay cleared from the screen
    fn suspend(&self, f: &mut dyn FnMut());
}

/// Terminal-backed prompter
#[derive(Debug, Clone)]
pub struct ConsolePrompter {
    messages: Messages,
    policy: FallbackPolicy,
    overlay: Option<Arc<dyn TerminalOverlay>>,
}

impl ConsolePrompter {
    #[must_use]
    pub fn new(messages: Messages, policy: FallbackPolicy) -> Self {
        Self {
            messages,
            policy,
            overlay: None,
        }
    }

    /// Keep `overlay` off the screen while prompting
    #[must_use]
    pub fn with_overlay(mut self, overlay: Arc<dyn TerminalOverlay>) -> Self {
        self.overlay = Some(overlay);
        self
    }
}

fn suspended(overlay: Option<&dyn TerminalOverlay>, f: &mut dyn FnMut()) {
    match overlay {
        Some(overlay) => overlay.suspend(f),
        None => f(),
    }
}

/// Ask `question` and read a y/N answer, with the overlay suspended
///
/// `output` must not be a held stderr lock: the overlay clears itself through stderr.
fn ask(
    overlay: Option<&dyn TerminalOverlay>,
    question: &str,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> bool {
    let mut accepted = false;
    suspended(overlay, &mut || {
        let _ = write!(output, "{question} [y/N] ");
        let _ = output.flush();

        let mut answer = String::new();
        accepted = match input.read_line(&mut answer) {
            Ok(_) => parse_answer(&answer),
            Err(e) => {
                warn!(error = %e, "Could not read answer, declining fallback");
                false
            },
        };
    });
    accepted
}

/// `y`/`yes` (any case) accepts, everything else declines
fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "是")
}

#[async_trait]
impl Prompter for ConsolePrompter {
    async fn alert(&self, message: &str) {
        suspended(self.overlay.as_deref(), &mut || eprintln!("{message}"));
    }

    async fn confirm_fallback(&self, reason: &str) -> bool {
        let reason = if reason.trim().is_empty() {
            self.messages.unknown_error()
        } else {
            reason.to_string()
        };
        let question = self.messages.fallback_question(&reason);

        match self.policy {
            FallbackPolicy::Always => {
                info!(%reason, "Falling back to mock mode (policy: always)");
                true
            },
            FallbackPolicy::Never => {
                info!(%reason, "Not falling back (policy: never)");
                false
            },
            FallbackPolicy::Ask => {
                let overlay = self.overlay.clone();
                tokio::task::spawn_blocking(move || {
                    ask(
                        overlay.as_deref(),
                        &question,
                        &mut std::io::stdin().lock(),
                        &mut std::io::stderr(),
                    )
                })
                .await
                .unwrap_or(false)
            },
        }
    }
}

/// Prompter with pre-recorded answers, for tests and headless runs
///
/// Answers are consumed in order; once exhausted the default answer is used.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<bool>>,
    default_answer: bool,
    alerts: Mutex<Vec<String>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    /// Prompter that always gives `answer`
    #[must_use]
    pub fn answering(answer: bool) -> Self {
        Self {
            default_answer: answer,
            ..Self::default()
        }
    }

    /// Prompter giving `answers` in order, then declining
    #[must_use]
    pub fn with_answers<I: IntoIterator<Item = bool>>(answers: I) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Alerts shown so far
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Failure reasons passed to `confirm_fallback` so far
    #[must_use]
    pub fn questions(&self) -> Vec<String> {
        self.questions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn alert(&self, message: &str) {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }

    async fn confirm_fallback(&self, reason: &str) -> bool {
        self.questions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reason.to_string());
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.default_answer)
    }
}
