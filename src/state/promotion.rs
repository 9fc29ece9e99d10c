//! Admin promotion state machine.

use thiserror::Error;

/// Phases a single admin promotion goes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionPhase {
    /// Nothing submitted yet.
    Idle,
    /// Counting the current admins against the configured maximum.
    CheckingLimit,
    /// Comparing the submitted code with the promotion secret.
    CheckingCode,
    /// Writing the admin role to the user document.
    Writing,
    /// The user is now an active admin.
    Done,
    /// The promotion stopped; the user document was not changed unless noted.
    Failed(PromotionFailure),
}

impl PromotionPhase {
    /// Whether no further event can be applied.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PromotionPhase::Done | PromotionPhase::Failed(_))
    }
}

/// Reason a promotion ended in [`PromotionPhase::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromotionFailure {
    /// The admin count already reached the maximum.
    #[error("admin limit reached ({admins}/{max})")]
    LimitReached {
        /// Admins counted during the check.
        admins: usize,
        /// Configured maximum.
        max: usize,
    },
    /// The submitted code does not match the secret.
    #[error("invalid admin code")]
    InvalidCode,
    /// The admin count could not be read.
    #[error("could not count admins: {0}")]
    LookupError(String),
    /// The role update was rejected by the store.
    #[error("could not write admin role: {0}")]
    WriteError(String),
}

/// Events moving a promotion forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionEvent {
    /// A user submitted a promotion code.
    Submit,
    /// Admin count read; `admins` current admins for a maximum of `max`.
    AdminsCounted {
        /// Current admins.
        admins: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Admin count could not be read.
    CountFailed(String),
    /// Code comparison finished.
    CodeChecked {
        /// Whether the code matched.
        accepted: bool,
    },
    /// Role update stored.
    Written,
    /// Role update failed.
    WriteFailed(String),
}

/// Error returned when an event does not apply to the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the flow was in.
    pub from: PromotionPhase,
    /// Rejected event.
    pub event: PromotionEvent,
}

/// State machine for one promotion attempt.
///
/// `Idle -> CheckingLimit -> CheckingCode -> Writing -> Done`, with an exit to
/// `Failed` from each checking or writing phase.
#[derive(Debug, Clone)]
pub struct PromotionFlow {
    phase: PromotionPhase,
    trail: Vec<PromotionPhase>,
}

impl Default for PromotionFlow {
    fn default() -> Self {
        Self {
            phase: PromotionPhase::Idle,
            trail: vec![PromotionPhase::Idle],
        }
    }
}

impl PromotionFlow {
    /// Create a flow in [`PromotionPhase::Idle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> &PromotionPhase {
        &self.phase
    }

    /// Every phase visited so far, starting with `Idle`.
    pub fn trail(&self) -> &[PromotionPhase] {
        &self.trail
    }

    /// Apply an event, returning the new phase.
    pub fn apply(&mut self, event: PromotionEvent) -> Result<&PromotionPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.trail.push(next.clone());
        self.phase = next;
        Ok(&self.phase)
    }

    fn compute_transition(&self, event: PromotionEvent) -> Result<PromotionPhase, InvalidTransition> {
        let next = match (&self.phase, event) {
            (PromotionPhase::Idle, PromotionEvent::Submit) => PromotionPhase::CheckingLimit,
            (PromotionPhase::CheckingLimit, PromotionEvent::AdminsCounted { admins, max }) => {
                if admins >= max {
                    PromotionPhase::Failed(PromotionFailure::LimitReached { admins, max })
                } else {
                    PromotionPhase::CheckingCode
                }
            }
            (PromotionPhase::CheckingLimit, PromotionEvent::CountFailed(message)) => {
                PromotionPhase::Failed(PromotionFailure::LookupError(message))
            }
            (PromotionPhase::CheckingCode, PromotionEvent::CodeChecked { accepted: true }) => {
                PromotionPhase::Writing
            }
            (PromotionPhase::CheckingCode, PromotionEvent::CodeChecked { accepted: false }) => {
                PromotionPhase::Failed(PromotionFailure::InvalidCode)
            }
            (PromotionPhase::Writing, PromotionEvent::Written) => PromotionPhase::Done,
            (PromotionPhase::Writing, PromotionEvent::WriteFailed(message)) => {
                PromotionPhase::Failed(PromotionFailure::WriteError(message))
            }
            (from, event) => {
                return Err(InvalidTransition {
                    from: from.clone(),
                    event,
                });
            }
        };

        Ok(next)
    }
}
