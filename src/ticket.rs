//! Issued tickets: code generation, the merged snapshot, and display

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BookingConfig;
use crate::state::{StepOneData, StepTwoData};

/// A ticket issued on entering the final step
///
/// Serialized flat, so the snapshot carries the same field names as the
/// per-step records plus the code and issue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTicket {
    pub ticket_code: String,
    pub issued_at: DateTime<Utc>,
    #[serde(flatten)]
    pub selection: StepOneData,
    #[serde(flatten)]
    pub attendee: StepTwoData,
}

/// Generate a ticket code like `TKT-3F9A0C12`
pub fn generate_ticket_code(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    let suffix = id[..8].to_uppercase();
    if prefix.is_empty() {
        suffix
    } else {
        format!("{prefix}-{suffix}")
    }
}

impl IssuedTicket {
    /// Render the ticket as a plain-text card
    pub fn render_card(&self, booking: &BookingConfig) -> String {
        let width = 48;
        let rule = "─".repeat(width);
        let mut lines = vec![
            rule.clone(),
            booking.event_name.clone(),
            booking.event_details.clone(),
            rule.clone(),
            format!("Name:        {}", self.attendee.name),
            format!("Email:       {}", self.attendee.email),
            format!(
                "Ticket type: {} ({})",
                self.selection.ticket_type_text, self.selection.ticket_price
            ),
            format!("Ticket for:  {}", self.selection.number_of_tickets),
        ];

        if let Some(ref request) = self.attendee.special_request {
            lines.push(format!("Request:     {request}"));
        }
        if let Some(ref avatar) = self.attendee.avatar_url {
            lines.push(format!("Avatar:      {avatar}"));
        }

        lines.push(rule.clone());
        lines.push(format!("Code:        {}", self.ticket_code));
        lines.push(format!(
            "Issued:      {}",
            self.issued_at.format("%Y-%m-%d %H:%M UTC")
        ));
        lines.push(rule);

        lines.join("\n")
    }

    /// Write the ticket as pretty JSON to `path`
    pub fn export_json(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize ticket")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write ticket to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_ticket() -> IssuedTicket {
        IssuedTicket {
            ticket_code: "TKT-0A1B2C3D".to_string(),
            issued_at: "2025-03-01T18:30:00Z".parse().unwrap(),
            selection: StepOneData {
                ticket_type: Some(1),
                ticket_type_text: "VIP ACCESS".to_string(),
                ticket_price: "$150".to_string(),
                number_of_tickets: 2,
            },
            attendee: StepTwoData {
                name: "Ada Lovelace".to_string(),
                email: "ada@x.com".to_string(),
                special_request: Some("Aisle seat".to_string()),
                avatar_url: None,
            },
        }
    }

    #[test]
    fn test_generate_ticket_code_format() {
        let code = generate_ticket_code("TKT");
        assert!(code.starts_with("TKT-"));
        assert_eq!(code.len(), 12);
        assert!(code[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(code, generate_ticket_code("TKT"));
    }

    #[test]
    fn test_generate_ticket_code_without_prefix() {
        assert_eq!(generate_ticket_code("").len(), 8);
    }

    #[test]
    fn test_snapshot_is_flat() {
        let value = serde_json::to_value(sample_ticket()).unwrap();
        assert_eq!(value["ticketCode"], "TKT-0A1B2C3D");
        assert_eq!(value["ticketTypeText"], "VIP ACCESS");
        assert_eq!(value["numberOfTickets"], 2);
        assert_eq!(value["name"], "Ada Lovelace");
        assert_eq!(value["specialRequest"], "Aisle seat");
    }

    #[test]
    fn test_render_card_contains_details() {
        let card = sample_ticket().render_card(&BookingConfig::default());
        assert!(card.contains("Techember Fest"));
        assert!(card.contains("Ada Lovelace"));
        assert!(card.contains("VIP ACCESS ($150)"));
        assert!(card.contains("Ticket for:  2"));
        assert!(card.contains("Request:     Aisle seat"));
        assert!(card.contains("TKT-0A1B2C3D"));
        assert!(!card.contains("Avatar:"));
    }

    #[test]
    fn test_export_json_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ticket.json");
        let ticket = sample_ticket();

        ticket.export_json(&path).unwrap();

        let loaded: IssuedTicket =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, ticket);
    }
}
