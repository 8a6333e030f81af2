//! Async drivers connecting a [`Session`] to a browser surface and an analysis backend.
//!
//! The session answers each paused request synchronously; only the surface
//! round-trip and the single backend call are awaited.

use std::time::Duration;

use anyhow::{bail, Result};
use dyi_capture::{AnalysisError, NavigationEvent, Session, Stage};

use crate::backend::AnalysisBackend;
use crate::browser::BrowserSurface;
use crate::events::EventBus;

/// Feed paused requests to the session until it captures a link or the surface goes away.
///
/// Returns the captured link, or `None` if the surface closed first.
pub async fn watch_for_download(
    session: &mut Session,
    surface: &mut dyn BrowserSurface,
    bus: &EventBus,
) -> Result<Option<String>> {
    if session.stage() != Stage::DownloadFlow {
        bail!("cannot watch for a download in stage {}", session.stage());
    }

    while session.stage() == Stage::DownloadFlow {
        let Some(request) = surface.next_request().await? else {
            tracing::info!("Browser surface closed before a download started");
            break;
        };
        let decision = session.observe(&request.event);
        bus.publish_from(session);
        surface.resolve(request, decision).await?;
    }

    Ok(session.captured_link().map(str::to_string))
}

/// Treat a pasted URL as a navigation on the download page.
///
/// Fails (and returns the session to `Home`) when the URL is not a recognized
/// download link.
pub fn submit_pasted_link(session: &mut Session, url: &str, bus: &EventBus) -> Result<()> {
    if let Err(e) = session.start_download_flow() {
        bus.publish_from(session);
        return Err(e.into());
    }
    session.observe(&NavigationEvent::new(url.trim()));
    let captured = session.stage() == Stage::Processing;
    if !captured {
        session.back();
    }
    bus.publish_from(session);
    if !captured {
        bail!("not a recognized data-export download link: {url}");
    }
    Ok(())
}

/// Issue the one backend request for the current capture and apply its outcome.
///
/// Returns `true` when a result was stored. A `false` return leaves a notice
/// on the session explaining the failure.
pub async fn run_analysis(
    session: &mut Session,
    backend: &dyn AnalysisBackend,
    timeout: Duration,
    bus: &EventBus,
) -> bool {
    let Some(request) = session.take_analysis_request() else {
        tracing::warn!("No analysis to run in stage {}", session.stage());
        return false;
    };
    bus.publish_from(session);

    let outcome = match tokio::time::timeout(timeout, backend.analyze(&request)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(AnalysisError::TimedOut(timeout.as_secs())),
    };

    let applied = session.complete_analysis(request.ticket, outcome);
    bus.publish_from(session);
    applied && session.analysis_result().is_some()
}
