//! Typed events emitted by a [`Session`](crate::Session) as it moves through the flow.
//!
//! The session only queues these; hosts drain them and fan them out
//! (logs, JSON lines, a UI).

use serde::{Deserialize, Serialize};

use crate::detector::MatchedRule;
use crate::types::Stage;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlowEvent {
    /// The session moved between stages.
    StageChanged { from: Stage, to: Stage },
    /// A start action was refused by validation.
    ValidationFailed { action: String, reason: String },
    /// The download link was captured and its navigation vetoed.
    LinkCaptured { url: String, rule: MatchedRule },
    /// The single analysis request for this capture was handed out.
    AnalysisRequested { download_url: String, username: String },
    /// The backend returned a well-formed result.
    AnalysisSucceeded { metric_count: usize },
    /// The backend call failed.
    AnalysisFailed { error: String },
    /// A completion arrived for a capture that is no longer current.
    StaleResultIgnored { ticket: u64 },
}
