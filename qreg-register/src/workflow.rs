//! Registration workflow state machine
//!
//! Drives image capture → remote analysis → similarity-ranked candidate
//! presentation → user decision → registration commit. State is one tagged
//! enum so illegal combinations (analyzing with no image, a result without
//! a capture) are unrepresentable.
//!
//! Concurrency model: all mutation goes through one internal lock that is
//! never held across a network await. Requests are single-flight, and every
//! response is applied only if the workflow generation is unchanged — a
//! reset or re-capture while a request is in flight makes the eventual
//! resumption a no-op.

use crate::error::WorkflowError;
use crate::models::capture::CapturedImage;
use crate::models::product::{
    AnalysisResult, NewProductRequest, RegisteredProduct, StockRecord,
};
use crate::services::catalog_client::CatalogService;
use crate::services::image_sniffer::sniff_image;
use crate::services::preview_store::PreviewStore;
use chrono::Utc;
use qreg_common::events::{EventBus, RegistrationEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Workflow state
///
/// Strictly forward: Idle → Captured → Analyzing → Resolved, with reset
/// back to Idle from anywhere.
#[derive(Debug)]
pub enum WorkflowState {
    /// No image selected
    Idle,
    /// Image selected, preview live, analysis not yet run
    Captured(CapturedImage),
    /// Upload in flight; re-invocation of analyze is suppressed
    Analyzing(CapturedImage),
    /// Analysis result present; awaiting the user's decision
    Resolved {
        image: CapturedImage,
        result: AnalysisResult,
    },
}

impl WorkflowState {
    fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "Idle",
            WorkflowState::Captured(_) => "Captured",
            WorkflowState::Analyzing(_) => "Analyzing",
            WorkflowState::Resolved { .. } => "Resolved",
        }
    }

    fn into_image(self) -> Option<CapturedImage> {
        match self {
            WorkflowState::Idle => None,
            WorkflowState::Captured(image)
            | WorkflowState::Analyzing(image)
            | WorkflowState::Resolved { image, .. } => Some(image),
        }
    }
}

/// Resolution-stage view of the workflow
///
/// Derived solely from the presence of a result and whether its candidate
/// list is empty; similarity tiers never influence this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Analysis not yet run (or reset)
    NoResult,
    /// Result present with at least one candidate
    MatchesFound,
    /// Result present with no candidates
    NoMatches,
}

/// Outcome of an `analyze` call
#[derive(Debug)]
pub enum AnalyzeOutcome {
    /// Analysis finished and the result was stored
    Completed(Resolution),
    /// A previous analysis is still in flight; no request was issued
    AlreadyAnalyzing,
    /// The capture was reset or replaced while the request was in flight;
    /// the response was discarded
    Superseded,
}

/// Outcome of a `register_new` call
#[derive(Debug)]
pub enum RegisterOutcome {
    /// Product registered; the workflow returned to its initial state
    Registered(RegisteredProduct),
    /// A registration or confirmation is still in flight
    AlreadyPending,
    /// The workflow was reset while the request was in flight
    Superseded,
}

/// Outcome of a `select_candidate` call
#[derive(Debug)]
pub enum ConfirmOutcome {
    /// Receipt recorded against the matched product; workflow reset
    Confirmed,
    /// A registration or confirmation is still in flight
    AlreadyPending,
    /// The workflow was reset while the request was in flight
    Superseded,
}

struct Inner {
    state: WorkflowState,
    /// Bumped by reset and re-capture; in-flight responses whose captured
    /// generation no longer matches are discarded
    generation: u64,
    /// Guards duplicate registration/confirmation submissions
    submitting: bool,
}

/// The registration workflow controller
///
/// One instance per registration session. All methods take `&self`; the
/// internal lock serializes state mutation while leaving network exchanges
/// outside it, so `reset` remains available while a request is pending.
pub struct RegistrationWorkflow {
    service: Arc<dyn CatalogService>,
    previews: PreviewStore,
    events: EventBus,
    session_id: Uuid,
    inner: Mutex<Inner>,
}

impl RegistrationWorkflow {
    pub fn new(service: Arc<dyn CatalogService>, previews: PreviewStore, events: EventBus) -> Self {
        Self {
            service,
            previews,
            events,
            session_id: Uuid::new_v4(),
            inner: Mutex::new(Inner {
                state: WorkflowState::Idle,
                generation: 0,
                submitting: false,
            }),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Subscribe to user-visible workflow notices
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RegistrationEvent> {
        self.events.subscribe()
    }

    /// Select an image file, replacing any prior capture
    ///
    /// Non-image input is rejected before anything is mutated: no preview
    /// is created and any existing state stays untouched. On acceptance the
    /// prior preview (if any) is released, any prior analysis result is
    /// discarded, and interest in any in-flight request is dropped.
    pub async fn select_file(
        &self,
        file_name: &str,
        declared_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), WorkflowError> {
        let content_type = sniff_image(declared_type, &bytes)?;

        let preview = self
            .previews
            .acquire(file_name, &bytes)
            .map_err(WorkflowError::Preview)?;

        let image = CapturedImage {
            file_name: file_name.to_string(),
            content_type,
            bytes,
            preview,
        };

        info!(
            file_name,
            size_bytes = image.size_bytes(),
            "Image captured"
        );

        {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.submitting = false;
            let prior = std::mem::replace(&mut inner.state, WorkflowState::Captured(image));
            if let Some(prior_image) = prior.into_image() {
                self.previews.release_quietly(prior_image.preview);
            }
        }

        self.events.emit(RegistrationEvent::ImageCaptured {
            session_id: self.session_id,
            file_name: file_name.to_string(),
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Submit the captured image for remote analysis
    ///
    /// Single-flight: while an analysis is pending, further calls are
    /// no-ops and produce no additional outbound request. On failure the
    /// state rolls back to the captured image (retry or reset both remain
    /// available) and no partial result is stored.
    ///
    /// # Panics
    ///
    /// Panics if called with no captured image (`Idle` or `Resolved`
    /// state). That is a programming error in the embedding UI, not a
    /// recoverable condition.
    pub async fn analyze(&self) -> Result<AnalyzeOutcome, WorkflowError> {
        let (generation, file_name, content_type, bytes) = {
            let mut inner = self.inner.lock().await;
            match &inner.state {
                WorkflowState::Analyzing(_) => {
                    debug!("Analysis already in flight; ignoring");
                    return Ok(AnalyzeOutcome::AlreadyAnalyzing);
                }
                WorkflowState::Captured(_) => {}
                other => panic!(
                    "analyze() called without a captured image (state: {})",
                    other.name()
                ),
            }

            let image = match std::mem::replace(&mut inner.state, WorkflowState::Idle) {
                WorkflowState::Captured(image) => image,
                // Checked above while holding the lock
                other => {
                    inner.state = other;
                    return Ok(AnalyzeOutcome::Superseded);
                }
            };

            let request_data = (
                inner.generation,
                image.file_name.clone(),
                image.content_type.clone(),
                image.bytes.clone(),
            );
            inner.state = WorkflowState::Analyzing(image);
            request_data
        };

        self.events.emit(RegistrationEvent::AnalysisStarted {
            session_id: self.session_id,
            timestamp: Utc::now(),
        });

        // Lock released: reset/select_file stay available while in flight
        let outcome = self
            .service
            .analyze_image(&file_name, &content_type, bytes)
            .await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("Discarding analysis response for a superseded capture");
            return Ok(AnalyzeOutcome::Superseded);
        }

        let image = match std::mem::replace(&mut inner.state, WorkflowState::Idle) {
            WorkflowState::Analyzing(image) => image,
            other => {
                inner.state = other;
                return Ok(AnalyzeOutcome::Superseded);
            }
        };

        match outcome {
            Ok(result) => {
                let candidate_count = result.similar_products.len();
                let resolution = if result.similar_products.is_empty() {
                    Resolution::NoMatches
                } else {
                    Resolution::MatchesFound
                };
                info!(candidate_count, "Analysis result stored");
                inner.state = WorkflowState::Resolved { image, result };
                drop(inner);

                self.events.emit(RegistrationEvent::AnalysisCompleted {
                    session_id: self.session_id,
                    candidate_count,
                    timestamp: Utc::now(),
                });

                Ok(AnalyzeOutcome::Completed(resolution))
            }
            Err(e) => {
                warn!("Image analysis failed: {}", e);
                // Roll back; the image stays captured for retry
                inner.state = WorkflowState::Captured(image);
                drop(inner);

                self.events.emit(RegistrationEvent::AnalysisFailed {
                    session_id: self.session_id,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });

                Err(WorkflowError::Analysis(e))
            }
        }
    }

    /// Register the captured item as a new catalog product
    ///
    /// Valid whenever an analysis result is present — also when matches
    /// were found and the user registers as new anyway. On success the
    /// newly assigned Q-CODE is announced and the workflow performs a full
    /// reset; on failure state is left unchanged so the user may retry
    /// without re-uploading.
    ///
    /// # Panics
    ///
    /// Panics if called without an analysis result.
    pub async fn register_new(&self) -> Result<RegisterOutcome, WorkflowError> {
        let (generation, request) = {
            let mut inner = self.inner.lock().await;
            if inner.submitting {
                debug!("Registration already in flight; ignoring");
                return Ok(RegisterOutcome::AlreadyPending);
            }

            let request = match &inner.state {
                WorkflowState::Resolved { result, .. } => NewProductRequest::from_analysis(result),
                other => panic!(
                    "register_new() called without an analysis result (state: {})",
                    other.name()
                ),
            };

            inner.submitting = true;
            (inner.generation, request)
        };

        let outcome = self.service.register_product(&request).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("Discarding registration response for a superseded session");
            return Ok(RegisterOutcome::Superseded);
        }
        inner.submitting = false;

        match outcome {
            Ok(product) => {
                info!(qcode = %product.qcode, "New product registered");
                self.reset_locked(&mut inner);
                drop(inner);

                self.events.emit(RegistrationEvent::ProductRegistered {
                    session_id: self.session_id,
                    qcode: product.qcode.clone(),
                    timestamp: Utc::now(),
                });

                Ok(RegisterOutcome::Registered(product))
            }
            Err(e) => {
                warn!("Product registration failed: {}", e);
                drop(inner);

                self.events.emit(RegistrationEvent::RegistrationFailed {
                    session_id: self.session_id,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });

                Err(WorkflowError::Registration(e))
            }
        }
    }

    /// Confirm the capture as one of the proposed candidates
    ///
    /// Records receipt of one unit against the existing product instead of
    /// creating a new catalog entry. Success, failure and reset semantics
    /// match [`register_new`](Self::register_new).
    ///
    /// # Panics
    ///
    /// Panics if called without an analysis result that proposed matches.
    pub async fn select_candidate(&self, qcode: &str) -> Result<ConfirmOutcome, WorkflowError> {
        let (generation, record) = {
            let mut inner = self.inner.lock().await;
            if inner.submitting {
                debug!("Registration already in flight; ignoring");
                return Ok(ConfirmOutcome::AlreadyPending);
            }

            let result = match &inner.state {
                WorkflowState::Resolved { result, .. } if !result.similar_products.is_empty() => {
                    result
                }
                other => panic!(
                    "select_candidate() called without proposed matches (state: {})",
                    other.name()
                ),
            };

            if !result.similar_products.iter().any(|p| p.qcode == qcode) {
                return Err(WorkflowError::CandidateNotFound(qcode.to_string()));
            }

            let record = StockRecord {
                qcode: qcode.to_string(),
                quantity: 1,
                notes: Some(result.image_path.clone()),
            };

            inner.submitting = true;
            (inner.generation, record)
        };

        let outcome = self.service.record_stock(&record).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("Discarding confirmation response for a superseded session");
            return Ok(ConfirmOutcome::Superseded);
        }
        inner.submitting = false;

        match outcome {
            Ok(()) => {
                info!(qcode, "Capture confirmed as existing product");
                self.reset_locked(&mut inner);
                drop(inner);

                self.events.emit(RegistrationEvent::CandidateConfirmed {
                    session_id: self.session_id,
                    qcode: qcode.to_string(),
                    timestamp: Utc::now(),
                });

                Ok(ConfirmOutcome::Confirmed)
            }
            Err(e) => {
                warn!("Candidate confirmation failed: {}", e);
                drop(inner);

                self.events.emit(RegistrationEvent::RegistrationFailed {
                    session_id: self.session_id,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });

                Err(WorkflowError::Registration(e))
            }
        }
    }

    /// Return to the initial state unconditionally
    ///
    /// Releases the preview, clears any result, and drops interest in any
    /// in-flight request; the eventual response is discarded. No error
    /// path.
    pub async fn reset(&self) {
        {
            let mut inner = self.inner.lock().await;
            self.reset_locked(&mut inner);
        }

        self.events.emit(RegistrationEvent::WorkflowReset {
            session_id: self.session_id,
            timestamp: Utc::now(),
        });
    }

    fn reset_locked(&self, inner: &mut Inner) {
        inner.generation += 1;
        inner.submitting = false;
        let prior = std::mem::replace(&mut inner.state, WorkflowState::Idle);
        if let Some(image) = prior.into_image() {
            self.previews.release_quietly(image.preview);
        }
    }

    /// Current resolution-stage view
    pub async fn resolution(&self) -> Resolution {
        let inner = self.inner.lock().await;
        match &inner.state {
            WorkflowState::Resolved { result, .. } => {
                if result.similar_products.is_empty() {
                    Resolution::NoMatches
                } else {
                    Resolution::MatchesFound
                }
            }
            _ => Resolution::NoResult,
        }
    }

    /// Whether an analysis request is currently in flight
    pub async fn is_analyzing(&self) -> bool {
        let inner = self.inner.lock().await;
        matches!(inner.state, WorkflowState::Analyzing(_))
    }

    /// Whether an image is currently captured (in any stage)
    pub async fn has_capture(&self) -> bool {
        let inner = self.inner.lock().await;
        !matches!(inner.state, WorkflowState::Idle)
    }

    /// Path of the live preview file, if any
    pub async fn preview_path(&self) -> Option<PathBuf> {
        let inner = self.inner.lock().await;
        match &inner.state {
            WorkflowState::Idle => None,
            WorkflowState::Captured(image)
            | WorkflowState::Analyzing(image)
            | WorkflowState::Resolved { image, .. } => Some(image.preview.path().to_path_buf()),
        }
    }

    /// Stored analysis result, if the workflow is resolved
    pub async fn analysis_result(&self) -> Option<AnalysisResult> {
        let inner = self.inner.lock().await;
        match &inner.state {
            WorkflowState::Resolved { result, .. } => Some(result.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::AnalysisResult;
    use crate::services::catalog_client::CatalogError;
    use async_trait::async_trait;

    struct NeverCalled;

    #[async_trait]
    impl CatalogService for NeverCalled {
        async fn analyze_image(
            &self,
            _file_name: &str,
            _content_type: &str,
            _bytes: Vec<u8>,
        ) -> Result<AnalysisResult, CatalogError> {
            unimplemented!()
        }

        async fn register_product(
            &self,
            _request: &NewProductRequest,
        ) -> Result<RegisteredProduct, CatalogError> {
            unimplemented!()
        }

        async fn record_stock(&self, _record: &StockRecord) -> Result<(), CatalogError> {
            unimplemented!()
        }
    }

    fn workflow_with_tempdir() -> (RegistrationWorkflow, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let workflow = RegistrationWorkflow::new(
            Arc::new(NeverCalled),
            PreviewStore::new(dir.path()),
            EventBus::new(16),
        );
        (workflow, dir)
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (workflow, _dir) = workflow_with_tempdir();
        assert!(!workflow.has_capture().await);
        assert!(!workflow.is_analyzing().await);
        assert_eq!(workflow.resolution().await, Resolution::NoResult);
        assert!(workflow.preview_path().await.is_none());
    }

    #[tokio::test]
    #[should_panic(expected = "analyze() called without a captured image")]
    async fn test_analyze_without_capture_panics() {
        let (workflow, _dir) = workflow_with_tempdir();
        let _ = workflow.analyze().await;
    }

    #[tokio::test]
    #[should_panic(expected = "register_new() called without an analysis result")]
    async fn test_register_without_result_panics() {
        let (workflow, _dir) = workflow_with_tempdir();
        let _ = workflow.register_new().await;
    }
}
