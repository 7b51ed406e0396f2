//! qreg-register - Product Registration Workflow
//!
//! Client-side core of the QReg product-registration assistant: a user
//! photographs a physical item, the backend analyzes the image, and the
//! user resolves whether the item matches an already-catalogued product or
//! must be registered as new.
//!
//! Control flows strictly forward (capture → analysis → resolution) with
//! explicit reset transitions back to capture from any later stage. The
//! backend analysis and catalog services are reached through the
//! [`services::catalog_client::CatalogService`] capability trait so tests
//! can substitute a double.

pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::WorkflowError;
pub use crate::workflow::{
    AnalyzeOutcome, ConfirmOutcome, RegisterOutcome, RegistrationWorkflow, Resolution,
};
