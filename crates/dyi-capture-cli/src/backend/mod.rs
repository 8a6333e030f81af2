//! Analysis backend abstraction.
//!
//! The backend turns a captured download link into relationship metrics.
//! It is an external collaborator; this crate only speaks its HTTP/JSON contract.

pub mod http;

use async_trait::async_trait;
use dyi_capture::{AnalysisError, AnalysisRequest, AnalysisResult};

pub use http::HttpBackend;

/// Something that can analyze a captured link.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Submit one request. No retries: a failure is final for the session.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}
