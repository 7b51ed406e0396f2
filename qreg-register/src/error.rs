//! Error types for the registration workflow

use crate::services::catalog_client::CatalogError;
use thiserror::Error;

/// Registration workflow errors
///
/// No variant leaves the workflow in an inconsistent state: capture errors
/// are rejected before anything is mutated, and request failures roll the
/// state back so the user can retry or reset.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Selected file is not an image; rejected at capture time, never
    /// reaches the network
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// Image analysis request failed; the captured image is retained
    #[error("Analysis failed: {0}")]
    Analysis(#[source] CatalogError),

    /// Registration or candidate confirmation failed; the analysis result
    /// is retained for retry
    #[error("Registration failed: {0}")]
    Registration(#[source] CatalogError),

    /// Preview acquisition or release failed
    #[error("Preview error: {0}")]
    Preview(#[source] qreg_common::Error),

    /// Selected candidate qcode is not among the proposed matches
    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),
}
