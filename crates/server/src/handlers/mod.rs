//! # API Route Handlers
//!
//! This module organizes the Axum route handlers for the `sigmascholar-server`.

pub mod general;
pub mod pubsub;
pub mod trigger;

pub use general::*;
pub use pubsub::*;
pub use trigger::*;

use super::{errors::AppError, state::AppState};
