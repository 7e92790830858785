//! In-memory wizard session and per-step input types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Steps of the booking wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Step {
    /// Pick a ticket type and quantity
    One,
    /// Enter attendee details
    Two,
    /// Ticket issued, display/export only
    Three,
}

impl Step {
    pub const FIRST: Step = Step::One;
    pub const COUNT: u8 = 3;

    pub fn all() -> &'static [Step] {
        &[Step::One, Step::Two, Step::Three]
    }

    /// Parse a 1-based step number
    pub fn from_number(n: u8) -> Option<Step> {
        match n {
            1 => Some(Step::One),
            2 => Some(Step::Two),
            3 => Some(Step::Three),
            _ => None,
        }
    }

    /// 1-based step number
    pub fn number(self) -> u8 {
        match self {
            Step::One => 1,
            Step::Two => 2,
            Step::Three => 3,
        }
    }

    pub fn next(self) -> Option<Step> {
        Step::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Step> {
        self.number().checked_sub(1).and_then(Step::from_number)
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::One => "Select Ticket",
            Step::Two => "Attendee Details",
            Step::Three => "Ready",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number(), Step::COUNT)
    }
}

impl Default for Step {
    fn default() -> Self {
        Step::FIRST
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Step::from_number(n).ok_or_else(|| format!("invalid wizard step {n}"))
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step.number()
    }
}

/// Ticket type and quantity chosen on step one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSelection {
    /// Index into the catalog, `None` until a type is picked
    pub type_index: Option<usize>,
    pub type_label: String,
    pub price: String,
    pub quantity: u32,
}

impl Default for TicketSelection {
    fn default() -> Self {
        Self {
            type_index: None,
            type_label: String::new(),
            price: String::new(),
            quantity: 1,
        }
    }
}

impl TicketSelection {
    /// Build a selection, copying label and price from the catalog entry
    pub fn from_catalog(type_index: Option<usize>, quantity: u32, catalog: &Catalog) -> Self {
        let entry = type_index.and_then(|i| catalog.get(i));
        Self {
            type_index: entry.and(type_index),
            type_label: entry.map(|t| t.label.clone()).unwrap_or_default(),
            price: entry.map(|t| t.price.clone()).unwrap_or_default(),
            quantity,
        }
    }
}

/// Attendee details entered on step two
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
    /// Public URL of the uploaded avatar
    pub avatar_ref: Option<String>,
    /// Free-form special request
    pub note: Option<String>,
}

/// The record of one user's in-progress booking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardSession {
    pub current_step: Step,
    pub ticket_selection: TicketSelection,
    pub attendee: Attendee,
    /// Set when the ticket is issued on entering step three
    pub generated_ticket_code: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_issued(&self) -> bool {
        self.generated_ticket_code.is_some()
    }
}

/// Step one form values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketSelectionInput {
    pub type_index: Option<usize>,
    pub quantity: u32,
}

/// Step two form values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendeeInput {
    pub name: String,
    pub email: String,
    pub avatar_ref: Option<String>,
    pub note: Option<String>,
}

impl From<&TicketSelection> for TicketSelectionInput {
    fn from(selection: &TicketSelection) -> Self {
        Self {
            type_index: selection.type_index,
            quantity: selection.quantity,
        }
    }
}

impl From<&Attendee> for AttendeeInput {
    fn from(attendee: &Attendee) -> Self {
        Self {
            name: attendee.name.clone(),
            email: attendee.email.clone(),
            avatar_ref: attendee.avatar_ref.clone(),
            note: attendee.note.clone(),
        }
    }
}

impl From<AttendeeInput> for Attendee {
    fn from(input: AttendeeInput) -> Self {
        Self {
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            avatar_ref: non_blank(input.avatar_ref),
            note: non_blank(input.note),
        }
    }
}

/// Values submitted for a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    TicketSelection(TicketSelectionInput),
    Attendee(AttendeeInput),
}

impl StepInput {
    /// The step this input belongs to
    pub fn step(&self) -> Step {
        match self {
            StepInput::TicketSelection(_) => Step::One,
            StepInput::Attendee(_) => Step::Two,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
