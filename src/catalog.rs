//! Ticket types offered for the event

use serde::{Deserialize, Serialize};

/// A ticket type offered on the selection step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    /// Display label (e.g., "VIP ACCESS")
    pub label: String,
    /// Display price (e.g., "Free", "$150")
    pub price: String,
    /// Availability text shown next to the card (e.g., "20/52")
    pub availability: String,
}

impl TicketType {
    fn new(label: &str, price: &str, availability: &str) -> Self {
        Self {
            label: label.to_string(),
            price: price.to_string(),
            availability: availability.to_string(),
        }
    }
}

/// The list of ticket types a booking can choose from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    types: Vec<TicketType>,
}

impl Catalog {
    pub fn new(types: Vec<TicketType>) -> Self {
        Self { types }
    }

    /// Look up an offered type by its index
    pub fn get(&self, index: usize) -> Option<&TicketType> {
        self.types.get(index)
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.types.len()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TicketType)> {
        self.types.iter().enumerate()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(vec![
            TicketType::new("REGULAR ACCESS", "Free", "20/52"),
            TicketType::new("VIP ACCESS", "$150", "20/52"),
            TicketType::new("VVIP ACCESS", "$250", "20/52"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_offers_three_types() {
        let catalog = Catalog::default();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(0).unwrap().price, "Free");
        assert_eq!(catalog.get(1).unwrap().label, "VIP ACCESS");
        assert_eq!(catalog.get(2).unwrap().price, "$250");
    }

    #[test]
    fn test_contains_bounds() {
        let catalog = Catalog::default();
        assert!(catalog.contains(2));
        assert!(!catalog.contains(3));
        assert!(!Catalog::new(Vec::new()).contains(0));
    }
}
