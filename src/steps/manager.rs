//! Step manager for handling wizard step transitions
//!
//! The manager is the single owner of the booking session. Every mutation is
//! written to the store before it becomes the live session, so a failed write
//! leaves memory matching what a restart would restore.

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::state::{keys, StepOneData, StepTwoData, WizardProgress};
use crate::store::{KeyValueStore, StoreError};
use crate::ticket::{generate_ticket_code, IssuedTicket};

use super::session::{Attendee, Step, StepInput, TicketSelection, WizardSession};
use super::validation::{summarize, FieldError, ValidationRules};

/// Rejected navigation. The session is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("step {0} does not exist (expected 1-3)")]
    OutOfRange(u8),

    #[error("cannot skip from step {from} to step {to}")]
    SkipAhead { from: Step, to: Step },

    #[error("step {step} is incomplete: {}", summarize(.errors))]
    Incomplete { step: Step, errors: Vec<FieldError> },

    #[error("already at the first step")]
    AtFirstStep,

    #[error("ticket already issued; book another ticket to start over")]
    TicketIssued,

    #[error("no ticket has been issued yet")]
    NotIssued,
}

/// Errors from wizard operations
#[derive(Error, Debug)]
pub enum WizardError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("input for step {found} submitted while on step {expected}")]
    StepMismatch { expected: Step, found: Step },

    #[error("failed to persist wizard state: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of submitting a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Input accepted, the wizard moved to this step
    Advanced(Step),
    /// Input rejected, nothing was merged
    Rejected(Vec<FieldError>),
}

impl Submission {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Submission::Advanced(_))
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            Submission::Rejected(errors) => errors,
            Submission::Advanced(_) => &[],
        }
    }
}

/// Manages step transitions for one booking session
pub struct StepManager<S: KeyValueStore> {
    store: S,
    rules: ValidationRules,
    code_prefix: String,
    session: WizardSession,
}

impl<S: KeyValueStore> StepManager<S> {
    /// Create a manager with a fresh session, ignoring anything stored
    pub fn new(store: S, rules: ValidationRules) -> Self {
        Self {
            store,
            rules,
            code_prefix: "TKT".to_string(),
            session: WizardSession::new(),
        }
    }

    /// Resume the session persisted in `store`
    ///
    /// Missing or malformed records fall back to defaults. A stored step whose
    /// prerequisites no longer validate is clamped down to the first
    /// incomplete step.
    pub fn restore(store: S, rules: ValidationRules) -> Self {
        let mut manager = Self::new(store, rules);
        manager.session = manager.load_session();
        manager
    }

    /// Resume using the rules and ticket code prefix from `config`
    pub fn from_config(config: &Config, store: S) -> Self {
        Self::restore(store, ValidationRules::from_config(config))
            .with_code_prefix(config.booking.ticket_code_prefix.clone())
    }

    pub fn with_code_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.code_prefix = prefix.into();
        self
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn current_step(&self) -> Step {
        self.session.current_step
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Move to step `n`
    ///
    /// Backward moves are allowed from step two. Forward moves go one step at
    /// a time and require the current step's stored data to validate. Entering
    /// step three issues the ticket.
    pub fn go_to_step(&mut self, n: u8) -> Result<Step, WizardError> {
        let target = Step::from_number(n).ok_or(TransitionError::OutOfRange(n))?;
        let current = self.session.current_step;

        if target == current {
            self.commit(self.session.clone())?;
            return Ok(current);
        }

        if current == Step::Three {
            return Err(TransitionError::TicketIssued.into());
        }

        if target < current {
            let mut next = self.session.clone();
            next.current_step = target;
            self.commit(next)?;
            tracing::info!(from = current.number(), to = target.number(), "moved back");
            return Ok(target);
        }

        if current.next() != Some(target) {
            return Err(TransitionError::SkipAhead {
                from: current,
                to: target,
            }
            .into());
        }

        let errors = self.rules.validate_session_step(&self.session, current);
        if !errors.is_empty() {
            return Err(TransitionError::Incomplete {
                step: current,
                errors,
            }
            .into());
        }

        let mut next = self.session.clone();
        next.current_step = target;
        if target == Step::Three {
            let ticket = self.issue_ticket(&next)?;
            next.generated_ticket_code = Some(ticket.ticket_code);
            next.issued_at = Some(ticket.issued_at);
        }

        self.commit(next)?;
        tracing::info!(from = current.number(), to = target.number(), "advanced");
        Ok(target)
    }

    /// Validate `input` for the current step; on success merge it and advance
    pub fn submit_step(&mut self, input: StepInput) -> Result<Submission, WizardError> {
        self.ensure_current(&input)?;

        let errors = self.rules.validate(&input);
        if !errors.is_empty() {
            tracing::info!(
                step = self.session.current_step.number(),
                errors = %summarize(&errors),
                "step submission rejected"
            );
            return Ok(Submission::Rejected(errors));
        }

        self.merge(input)?;
        let next = self.session.current_step.number() + 1;
        let step = self.go_to_step(next)?;
        Ok(Submission::Advanced(step))
    }

    /// Go back from step two to step one
    pub fn back(&mut self) -> Result<Step, WizardError> {
        let current = self.session.current_step;
        if current == Step::Three {
            return Err(TransitionError::TicketIssued.into());
        }
        match current.previous() {
            Some(step) => self.go_to_step(step.number()),
            None => Err(TransitionError::AtFirstStep.into()),
        }
    }

    /// Record in-progress edits for the current step without validating
    pub fn update_draft(&mut self, input: StepInput) -> Result<(), WizardError> {
        self.ensure_current(&input)?;
        self.merge(input)
    }

    /// Apply the URL of a finished avatar upload
    pub fn apply_avatar(&mut self, url: impl Into<String>) -> Result<(), WizardError> {
        if self.session.current_step == Step::Three {
            return Err(TransitionError::TicketIssued.into());
        }

        let url = url.into();
        let mut attendee = self.session.attendee.clone();
        attendee.avatar_ref = Some(url.trim().to_string()).filter(|u| !u.is_empty());
        self.store
            .save(keys::STEP_TWO, &StepTwoData::from(&attendee))?;
        self.session.attendee = attendee;
        tracing::info!(avatar = %url, "avatar applied");
        Ok(())
    }

    /// Discard the session and return to step one
    pub fn reset(&mut self) -> Result<(), WizardError> {
        let cleared = self
            .withdraw_pending_ticket()
            .and_then(|()| self.store.clear(keys::SESSION).map_err(WizardError::from));
        if let Err(err) = cleared {
            self.session = self.load_session();
            return Err(err);
        }
        self.session = WizardSession::new();
        tracing::info!("wizard reset");
        Ok(())
    }

    /// Start a new booking after a ticket was issued
    pub fn book_another(&mut self) -> Result<(), WizardError> {
        if self.session.current_step != Step::Three {
            return Err(TransitionError::NotIssued.into());
        }
        self.reset()
    }

    /// The ticket issued for this session, if the wizard is on step three
    pub fn issued_ticket(&self) -> Option<IssuedTicket> {
        if self.session.current_step != Step::Three {
            return None;
        }
        self.store.load(keys::TICKET)
    }

    /// Every ticket issued in this profile, oldest first
    ///
    /// Entries that no longer parse are skipped here but kept in the store.
    pub fn booked_tickets(&self) -> Vec<IssuedTicket> {
        let entries: Vec<Value> = self.store.load(keys::USER_TICKETS).unwrap_or_default();
        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(ticket) => Some(ticket),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable ticket in history");
                    None
                }
            })
            .collect()
    }

    /// Format step progress for display
    /// Returns something like: "[Select Ticket] > Attendee Details > Ready"
    pub fn format_progress(&self) -> String {
        Step::all()
            .iter()
            .map(|step| {
                if *step == self.session.current_step {
                    format!("[{}]", step.title())
                } else {
                    step.title().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" > ")
    }

    fn ensure_current(&self, input: &StepInput) -> Result<(), WizardError> {
        let current = self.session.current_step;
        if current == Step::Three {
            return Err(TransitionError::TicketIssued.into());
        }
        if input.step() != current {
            return Err(WizardError::StepMismatch {
                expected: current,
                found: input.step(),
            });
        }
        Ok(())
    }

    /// Store input values in the session and persist the step's record
    fn merge(&mut self, input: StepInput) -> Result<(), WizardError> {
        match input {
            StepInput::TicketSelection(selection) => {
                let selection = TicketSelection::from_catalog(
                    selection.type_index,
                    selection.quantity,
                    &self.rules.catalog,
                );
                self.store
                    .save(keys::STEP_ONE, &StepOneData::from(&selection))?;
                self.session.ticket_selection = selection;
            }
            StepInput::Attendee(attendee) => {
                let attendee = Attendee::from(attendee);
                self.store
                    .save(keys::STEP_TWO, &StepTwoData::from(&attendee))?;
                self.session.attendee = attendee;
            }
        }
        Ok(())
    }

    /// Persist the step of `next`, then make it the live session
    fn commit(&mut self, next: WizardSession) -> Result<(), WizardError> {
        self.store
            .save(keys::PROGRESS, &WizardProgress::new(next.current_step))?;
        self.session = next;
        Ok(())
    }

    /// Write the ticket snapshot for `session` and record it in the history
    ///
    /// A `ticketData` left by an earlier attempt that failed before the step
    /// was saved is reused when it matches the session, so retrying never
    /// issues a second ticket for the same booking. A stale one that no longer
    /// matches is withdrawn from the history.
    fn issue_ticket(&mut self, session: &WizardSession) -> Result<IssuedTicket, WizardError> {
        let selection = StepOneData::from(&session.ticket_selection);
        let attendee = StepTwoData::from(&session.attendee);
        let mut history = self.history_entries()?;

        let ticket = match self.store.load::<IssuedTicket>(keys::TICKET) {
            Some(pending) if pending.selection == selection && pending.attendee == attendee => {
                tracing::info!(code = %pending.ticket_code, "resuming pending ticket");
                pending
            }
            stale => {
                if let Some(stale) = stale {
                    history.retain(|entry| entry_code(entry) != Some(stale.ticket_code.as_str()));
                }
                IssuedTicket {
                    ticket_code: generate_ticket_code(&self.code_prefix),
                    issued_at: Utc::now(),
                    selection,
                    attendee,
                }
            }
        };

        self.store.save(keys::TICKET, &ticket)?;

        if !history
            .iter()
            .any(|entry| entry_code(entry) == Some(ticket.ticket_code.as_str()))
        {
            let entry = serde_json::to_value(&ticket).map_err(|source| StoreError::Serialize {
                key: keys::USER_TICKETS.to_string(),
                source,
            })?;
            history.push(entry);
        }
        self.store.save(keys::USER_TICKETS, &history)?;

        tracing::info!(code = %ticket.ticket_code, "ticket issued");
        Ok(ticket)
    }

    /// Drop a ticket whose issuance never reached step three from the history
    fn withdraw_pending_ticket(&mut self) -> Result<(), WizardError> {
        if self.session.current_step == Step::Three {
            return Ok(());
        }
        let Some(pending) = self.store.load::<IssuedTicket>(keys::TICKET) else {
            return Ok(());
        };

        let mut history = self.history_entries()?;
        let before = history.len();
        history.retain(|entry| entry_code(entry) != Some(pending.ticket_code.as_str()));
        if history.len() != before {
            self.store.save(keys::USER_TICKETS, &history)?;
            tracing::info!(code = %pending.ticket_code, "withdrew pending ticket");
        }
        Ok(())
    }

    /// Raw history entries, keeping ones that no longer parse as tickets
    ///
    /// A history that is not a list at all is copied aside before it is
    /// replaced, so no booking record is lost.
    fn history_entries(&mut self) -> Result<Vec<Value>, WizardError> {
        let Some(text) = self.store.get(keys::USER_TICKETS) else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<Value>>(&text) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    moved_to = keys::USER_TICKETS_UNREADABLE,
                    "ticket history unreadable, starting a new one"
                );
                self.store.put(keys::USER_TICKETS_UNREADABLE, &text)?;
                Ok(Vec::new())
            }
        }
    }

    fn load_session(&self) -> WizardSession {
        let mut session = WizardSession::new();

        if let Some(data) = self.store.load::<StepOneData>(keys::STEP_ONE) {
            session.ticket_selection = data.into_selection(&self.rules.catalog);
        }
        if let Some(data) = self.store.load::<StepTwoData>(keys::STEP_TWO) {
            session.attendee = Attendee::from(data);
        }

        let stored = self
            .store
            .load::<WizardProgress>(keys::PROGRESS)
            .map(|p| p.step())
            .unwrap_or(Step::FIRST);

        let mut step = Step::FIRST;
        while step < stored {
            if !self.rules.validate_session_step(&session, step).is_empty() {
                break;
            }
            match step.next() {
                Some(next) => step = next,
                None => break,
            }
        }

        if step == Step::Three {
            match self.store.load::<IssuedTicket>(keys::TICKET) {
                Some(ticket) => {
                    session.generated_ticket_code = Some(ticket.ticket_code);
                    session.issued_at = Some(ticket.issued_at);
                }
                None => step = Step::Two,
            }
        }

        if step != stored {
            tracing::warn!(
                stored = stored.number(),
                restored = step.number(),
                "stored step prerequisites not met, resuming earlier"
            );
        }

        session.current_step = step;
        session
    }
}

fn entry_code(entry: &Value) -> Option<&str> {
    entry.get("ticketCode").and_then(Value::as_str)
}
