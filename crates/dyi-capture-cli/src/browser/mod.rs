//! Embedded browser surface abstraction.
//!
//! Defines the `BrowserSurface` trait the capture flow drives. The surface
//! hands over each intercepted request and waits for a proceed/veto answer
//! before letting it continue (currently Chromium via chromiumoxide).

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use dyi_capture::{NavigationDecision, NavigationEvent};

/// A request paused on the surface, waiting for a decision.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    /// Surface-specific handle used to resume or fail the request.
    pub id: String,
    /// What the capture detector sees.
    pub event: NavigationEvent,
}

/// Whether a loaded page has its requests paused for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    Off,
    On,
}

/// A single browser tab the flow can drive.
#[async_trait]
pub trait BrowserSurface: Send {
    /// Start loading `url`. Returns once the load has been issued, not finished.
    async fn load(&mut self, url: &str, interception: Interception) -> Result<()>;
    /// Wait for the next paused request. `None` once the tab is gone or
    /// interception is off.
    async fn next_request(&mut self) -> Result<Option<InterceptedRequest>>;
    /// Resume (`Proceed`) or fail (`Veto`) a paused request.
    async fn resolve(
        &mut self,
        request: InterceptedRequest,
        decision: NavigationDecision,
    ) -> Result<()>;
    /// Close the tab.
    async fn close(self: Box<Self>) -> Result<()>;
}
