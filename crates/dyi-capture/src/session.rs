//! The download-link capture state machine.
//!
//! A [`Session`] is one user attempt at the request → download → analyze
//! flow. Everything here is synchronous: hosts call [`Session::observe`]
//! from their pre-navigation hook and get an immediate proceed/veto answer.
//! The backend call happens outside, bracketed by
//! [`Session::take_analysis_request`] and [`Session::complete_analysis`].

use crate::detector::{DetectionRules, MatchedRule};
use crate::error::{AnalysisError, CaptureError, CaptureResult, Notice};
use crate::events::FlowEvent;
use crate::types::{
    AnalysisRequest, AnalysisResult, NavigationDecision, NavigationEvent, Stage,
    DATA_DOWNLOAD_URL, DATA_REQUEST_URL,
};

/// Per-run capture context.
#[derive(Debug, Clone)]
pub struct Session {
    stage: Stage,
    username: String,
    captured_link: Option<String>,
    analysis_result: Option<AnalysisResult>,
    notice: Option<Notice>,
    rules: DetectionRules,
    /// Bumped on every capture and every reset; completions must quote it.
    ticket: u64,
    request_issued: bool,
    outbox: Vec<FlowEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// New session at `Home` with the default detection rules.
    pub fn new() -> Self {
        Self::with_rules(DetectionRules::default())
    }

    pub fn with_rules(rules: DetectionRules) -> Self {
        Self {
            stage: Stage::Home,
            username: String::new(),
            captured_link: None,
            analysis_result: None,
            notice: None,
            rules,
            ticket: 0,
            request_issued: false,
            outbox: Vec::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: &str) {
        self.username = username.trim().to_string();
    }

    pub fn captured_link(&self) -> Option<&str> {
        self.captured_link.as_deref()
    }

    pub fn analysis_result(&self) -> Option<&AnalysisResult> {
        self.analysis_result.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Take the pending user-visible notice, if any.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn rules(&self) -> &DetectionRules {
        &self.rules
    }

    /// Take all queued events.
    pub fn drain_events(&mut self) -> Vec<FlowEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// `Home → RequestFlow`. Returns the URL the browser should load.
    pub fn start_request_flow(&mut self) -> CaptureResult<&'static str> {
        self.start(Stage::RequestFlow, "start the request flow")?;
        Ok(DATA_REQUEST_URL)
    }

    /// `Home → DownloadFlow`. Returns the URL the browser should load with interception on.
    pub fn start_download_flow(&mut self) -> CaptureResult<&'static str> {
        self.start(Stage::DownloadFlow, "start the download flow")?;
        Ok(DATA_DOWNLOAD_URL)
    }

    fn start(&mut self, to: Stage, action: &'static str) -> CaptureResult<()> {
        if self.stage != Stage::Home {
            tracing::warn!("Refusing to {action} from stage {}", self.stage);
            return Err(CaptureError::InvalidTransition {
                from: self.stage,
                action,
            });
        }
        if self.username.is_empty() {
            tracing::info!("Refusing to {action}: no username");
            self.notice = Some(Notice::UsernameRequired);
            self.outbox.push(FlowEvent::ValidationFailed {
                action: action.to_string(),
                reason: CaptureError::MissingUsername.to_string(),
            });
            return Err(CaptureError::MissingUsername);
        }
        // A new flow starts with nothing captured. The previous result stays
        // visible until a new capture replaces it.
        self.captured_link = None;
        self.request_issued = false;
        self.notice = None;
        self.transition(to);
        Ok(())
    }

    /// User-initiated back. From `Processing` this cancels the pending analysis.
    pub fn back(&mut self) {
        match self.stage {
            Stage::Home => {}
            Stage::RequestFlow => self.transition(Stage::Home),
            Stage::DownloadFlow | Stage::Processing => self.reset(),
        }
    }

    /// Start over: drop any captured link and result and return to `Home`.
    ///
    /// The username is kept. Any analysis still in flight becomes stale.
    pub fn reset(&mut self) {
        self.captured_link = None;
        self.analysis_result = None;
        self.request_issued = false;
        self.ticket += 1;
        if self.stage != Stage::Home {
            self.transition(Stage::Home);
        }
    }

    /// Pre-navigation hook. Must be answered before the surface continues.
    ///
    /// Only fires while in `DownloadFlow` with nothing captured yet. Once a
    /// link is captured, further matching requests are still vetoed so the
    /// surface never consumes the archive, but no second capture happens.
    pub fn observe(&mut self, event: &NavigationEvent) -> NavigationDecision {
        match self.stage {
            Stage::DownloadFlow if self.captured_link.is_none() => {
                match self.rules.classify(event) {
                    Some(rule) => {
                        self.capture(event, rule);
                        NavigationDecision::Veto
                    }
                    None => {
                        tracing::debug!("Navigation allowed: {}", event.url);
                        NavigationDecision::Proceed
                    }
                }
            }
            Stage::Processing if self.rules.classify(event).is_some() => {
                tracing::debug!("Duplicate download request blocked: {}", event.url);
                NavigationDecision::Veto
            }
            _ => NavigationDecision::Proceed,
        }
    }

    fn capture(&mut self, event: &NavigationEvent, rule: MatchedRule) {
        tracing::info!("Download link captured by rule {rule}: {}", event.url);
        self.captured_link = Some(event.url.clone());
        self.analysis_result = None;
        self.ticket += 1;
        self.request_issued = false;
        self.outbox.push(FlowEvent::LinkCaptured {
            url: event.url.clone(),
            rule,
        });
        self.transition(Stage::Processing);
    }

    /// The one backend request for the current capture. `None` after the first call.
    pub fn take_analysis_request(&mut self) -> Option<AnalysisRequest> {
        if self.stage != Stage::Processing || self.request_issued {
            return None;
        }
        let download_url = self.captured_link.clone()?;
        self.request_issued = true;
        self.outbox.push(FlowEvent::AnalysisRequested {
            download_url: download_url.clone(),
            username: self.username.clone(),
        });
        Some(AnalysisRequest {
            download_url,
            username: self.username.clone(),
            ticket: self.ticket,
        })
    }

    /// Apply the backend outcome. Returns `false` if the completion was stale and ignored.
    ///
    /// Either way the session ends up at `Home`; on failure the result stays
    /// empty and a notice is set.
    pub fn complete_analysis(
        &mut self,
        ticket: u64,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> bool {
        if self.stage != Stage::Processing || ticket != self.ticket || !self.request_issued {
            tracing::warn!(
                "Ignoring analysis completion for ticket {ticket} (current {}, stage {})",
                self.ticket,
                self.stage
            );
            self.outbox.push(FlowEvent::StaleResultIgnored { ticket });
            return false;
        }

        match outcome {
            Ok(result) => {
                tracing::info!(
                    "Analysis complete: {} metrics, {} user lists",
                    result.all_metrics.len(),
                    result.user_lists.len()
                );
                self.outbox.push(FlowEvent::AnalysisSucceeded {
                    metric_count: result.all_metrics.len(),
                });
                self.analysis_result = Some(result);
                self.notice = None;
            }
            Err(e) => {
                tracing::warn!("Analysis failed: {e}");
                self.outbox.push(FlowEvent::AnalysisFailed {
                    error: e.to_string(),
                });
                self.analysis_result = None;
                self.notice = Some(Notice::from(&e));
            }
        }
        self.request_issued = false;
        self.transition(Stage::Home);
        true
    }

    fn transition(&mut self, to: Stage) {
        let from = self.stage;
        if from == to {
            return;
        }
        tracing::info!("Stage {from} -> {to}");
        self.stage = to;
        self.outbox.push(FlowEvent::StageChanged { from, to });
    }
}
