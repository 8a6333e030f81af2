//! dyi-capture — captures the Instagram data-export download link from in-app browser navigation.

pub mod detector;
pub mod error;
pub mod events;
pub mod response;
pub mod session;
pub mod types;

pub use detector::{DetectionRules, MatchedRule, BULK_FILE_HOST};
pub use error::{AnalysisError, CaptureError, CaptureResult, Notice};
pub use events::FlowEvent;
pub use response::parse_analysis_response;
pub use session::Session;
pub use types::*;
