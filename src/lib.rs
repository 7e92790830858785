//! Booth - a three-step ticket booking wizard
//!
//! The [`steps::StepManager`] owns one booking session: ticket selection,
//! attendee details, and the issued ticket. Every change is written through a
//! [`store::KeyValueStore`] so a session survives restarts.

pub mod api;
pub mod catalog;
pub mod config;
pub mod env_vars;
pub mod logging;
pub mod state;
pub mod steps;
pub mod store;
pub mod ticket;
