//! Field validation for wizard steps
//!
//! Validators are pure: they look at form values and return the list of field
//! errors. An empty list means the step may advance.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::{AvatarPolicy, Config};

use super::session::{AttendeeInput, Step, StepInput, TicketSelectionInput, WizardSession};

/// First and last name, letters only, separated by whitespace
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{L}+(?: +\p{L}+)+$").expect("name pattern is valid"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("email pattern is valid")
});

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Join errors into one line for logs and messages
pub fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything the validators need to know about the booking
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub catalog: Catalog,
    pub max_quantity: u32,
    pub avatar_policy: AvatarPolicy,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ValidationRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            catalog: config.catalog(),
            max_quantity: config.booking.max_quantity,
            avatar_policy: config.validation.avatar_policy,
        }
    }

    pub fn with_avatar_policy(mut self, policy: AvatarPolicy) -> Self {
        self.avatar_policy = policy;
        self
    }

    /// Validate submitted values for their step
    pub fn validate(&self, input: &StepInput) -> Vec<FieldError> {
        match input {
            StepInput::TicketSelection(selection) => self.validate_selection(selection),
            StepInput::Attendee(attendee) => self.validate_attendee(attendee),
        }
    }

    /// Validate what the session currently holds for `step`
    pub fn validate_session_step(&self, session: &WizardSession, step: Step) -> Vec<FieldError> {
        match step {
            Step::One => self.validate_selection(&(&session.ticket_selection).into()),
            Step::Two => self.validate_attendee(&(&session.attendee).into()),
            Step::Three => Vec::new(),
        }
    }

    /// Step one: a valid offered type and a quantity in range
    pub fn validate_selection(&self, input: &TicketSelectionInput) -> Vec<FieldError> {
        let mut errors = Vec::new();

        match input.type_index {
            None => errors.push(FieldError::new("typeIndex", "Please select a ticket type")),
            Some(index) if !self.catalog.contains(index) => errors.push(FieldError::new(
                "typeIndex",
                format!("Ticket type {index} is not offered"),
            )),
            Some(_) => {}
        }

        if input.quantity < 1 || input.quantity > self.max_quantity {
            errors.push(FieldError::new(
                "quantity",
                format!("Number of tickets must be between 1 and {}", self.max_quantity),
            ));
        }

        errors
    }

    /// Step two: name, email, and avatar per policy
    pub fn validate_attendee(&self, input: &AttendeeInput) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let name = input.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        } else if !NAME_RE.is_match(name) {
            errors.push(FieldError::new(
                "name",
                "Enter your first and last name using letters only",
            ));
        }

        let email = input.email.trim();
        if email.is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !is_valid_email(email) {
            errors.push(FieldError::new("email", "Invalid email format"));
        }

        let avatar = input
            .avatar_ref
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());
        match avatar {
            None if self.avatar_policy == AvatarPolicy::Required => {
                errors.push(FieldError::new("avatarRef", "Avatar is required"));
            }
            None => {}
            Some(url) if !is_http_url(url) => {
                errors.push(FieldError::new("avatarRef", "Avatar must be an http(s) URL"));
            }
            Some(_) => {}
        }

        errors
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(&email.to_lowercase())
}

fn is_http_url(value: &str) -> bool {
    reqwest::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}
