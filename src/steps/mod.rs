//! Booking wizard: session state, step validation, and transitions

pub mod manager;
pub mod session;
pub mod validation;

pub use manager::{StepManager, Submission, TransitionError, WizardError};
pub use session::{
    Attendee, AttendeeInput, Step, StepInput, TicketSelection, TicketSelectionInput,
    WizardSession,
};
pub use validation::{FieldError, ValidationRules};
