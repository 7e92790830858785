//! Persisted wizard state layout
//!
//! Each step writes its own record so a restart can resume mid-flow. Every
//! field carries a serde default, so older or partial records still load.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::steps::session::{Attendee, Step, TicketSelection};

/// Store keys used by the wizard
pub mod keys {
    /// Step one draft: ticket type and quantity
    pub const STEP_ONE: &str = "stepOneData";
    /// Step two draft: attendee details
    pub const STEP_TWO: &str = "stepTwoData";
    /// Merged snapshot written when the ticket is issued
    pub const TICKET: &str = "ticketData";
    /// Current step of the wizard
    pub const PROGRESS: &str = "wizardProgress";
    /// Every ticket issued in this profile
    pub const USER_TICKETS: &str = "userTickets";
    /// Last ticket history that could not be read as a list
    pub const USER_TICKETS_UNREADABLE: &str = "userTicketsUnreadable";

    /// Keys cleared when the flow is restarted
    ///
    /// The ticket goes first: a `ticketData` left behind while the wizard is
    /// not on step three always belongs to an issuance that never completed.
    pub const SESSION: &[&str] = &[TICKET, PROGRESS, STEP_ONE, STEP_TWO];
}

fn default_number_of_tickets() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOneData {
    #[serde(default)]
    pub ticket_type: Option<usize>,
    #[serde(default)]
    pub ticket_type_text: String,
    #[serde(default)]
    pub ticket_price: String,
    #[serde(default = "default_number_of_tickets")]
    pub number_of_tickets: u32,
}

impl Default for StepOneData {
    fn default() -> Self {
        Self {
            ticket_type: None,
            ticket_type_text: String::new(),
            ticket_price: String::new(),
            number_of_tickets: default_number_of_tickets(),
        }
    }
}

impl StepOneData {
    /// Rebuild a selection, dropping a type index the catalog no longer offers
    pub fn into_selection(self, catalog: &Catalog) -> TicketSelection {
        match self.ticket_type {
            Some(index) if catalog.contains(index) => TicketSelection {
                type_index: Some(index),
                type_label: self.ticket_type_text,
                price: self.ticket_price,
                quantity: self.number_of_tickets,
            },
            Some(index) => {
                tracing::warn!(index, "stored ticket type is no longer offered");
                TicketSelection {
                    quantity: self.number_of_tickets,
                    ..TicketSelection::default()
                }
            }
            None => TicketSelection {
                quantity: self.number_of_tickets,
                ..TicketSelection::default()
            },
        }
    }
}

impl From<&TicketSelection> for StepOneData {
    fn from(selection: &TicketSelection) -> Self {
        Self {
            ticket_type: selection.type_index,
            ticket_type_text: selection.type_label.clone(),
            ticket_price: selection.price.clone(),
            number_of_tickets: selection.quantity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTwoData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub special_request: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl From<&Attendee> for StepTwoData {
    fn from(attendee: &Attendee) -> Self {
        Self {
            name: attendee.name.clone(),
            email: attendee.email.clone(),
            special_request: attendee.note.clone(),
            avatar_url: attendee.avatar_ref.clone(),
        }
    }
}

impl From<StepTwoData> for Attendee {
    fn from(data: StepTwoData) -> Self {
        Self {
            name: data.name,
            email: data.email,
            avatar_ref: data.avatar_url.filter(|a| !a.is_empty()),
            note: data.special_request.filter(|n| !n.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardProgress {
    /// Raw step number; validated on restore
    #[serde(default)]
    pub current_step: u8,
}

impl WizardProgress {
    pub fn new(step: Step) -> Self {
        Self {
            current_step: step.number(),
        }
    }

    /// Stored step, or step one when missing or out of range
    pub fn step(&self) -> Step {
        Step::from_number(self.current_step).unwrap_or(Step::FIRST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_one_data_uses_original_field_names() {
        let data = StepOneData {
            ticket_type: Some(1),
            ticket_type_text: "VIP ACCESS".to_string(),
            ticket_price: "$150".to_string(),
            number_of_tickets: 2,
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["ticketType"], 1);
        assert_eq!(value["ticketTypeText"], "VIP ACCESS");
        assert_eq!(value["ticketPrice"], "$150");
        assert_eq!(value["numberOfTickets"], 2);
    }

    #[test]
    fn test_step_one_data_tolerates_missing_fields() {
        let data: StepOneData = serde_json::from_str(r#"{"ticketType": 2}"#).unwrap();
        assert_eq!(data.ticket_type, Some(2));
        assert_eq!(data.number_of_tickets, 1);
        assert!(data.ticket_type_text.is_empty());
    }

    #[test]
    fn test_into_selection_drops_unoffered_type() {
        let catalog = Catalog::default();
        let data = StepOneData {
            ticket_type: Some(7),
            ticket_type_text: "GOLD".to_string(),
            ticket_price: "$999".to_string(),
            number_of_tickets: 3,
        };
        let selection = data.into_selection(&catalog);
        assert_eq!(selection.type_index, None);
        assert!(selection.type_label.is_empty());
        assert_eq!(selection.quantity, 3);
    }

    #[test]
    fn test_step_two_data_roundtrip_through_attendee() {
        let data: StepTwoData = serde_json::from_str(
            r#"{"name": "Ada Lovelace", "email": "ada@x.com", "specialRequest": "", "avatarUrl": "https://i.ibb.co/a.png"}"#,
        )
        .unwrap();
        let attendee = Attendee::from(data);
        assert_eq!(attendee.note, None);
        assert_eq!(attendee.avatar_ref.as_deref(), Some("https://i.ibb.co/a.png"));
        assert_eq!(StepTwoData::from(&attendee).name, "Ada Lovelace");
    }

    #[test]
    fn test_progress_out_of_range_falls_back_to_first_step() {
        assert_eq!(WizardProgress { current_step: 0 }.step(), Step::One);
        assert_eq!(WizardProgress { current_step: 9 }.step(), Step::One);
        assert_eq!(WizardProgress::new(Step::Three).step(), Step::Three);
    }
}
