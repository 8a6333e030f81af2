//! Chromium-based surface using chromiumoxide.
//!
//! Interception uses the CDP Fetch domain: every request pauses once before
//! it is sent (URL rules) and once more when headers arrive (content-type
//! rule). Proceed maps to `Fetch.continueRequest`, veto to `Fetch.failRequest`.

use super::{BrowserSurface, InterceptedRequest, Interception};
use crate::config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestId,
    RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::Page;
use dyi_capture::{NavigationDecision, NavigationEvent};
use futures::StreamExt;
use tokio::task::JoinHandle;

/// A launched Chromium instance.
pub struct ChromiumBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumBrowser {
    /// Launch Chromium. Headed by default: the user has to log in to Instagram.
    pub async fn launch(headless: bool) -> Result<Self> {
        let chrome_path = config::find_chromium().with_context(|| {
            format!(
                "Chromium not found. Install Chrome or set {}.",
                config::CHROMIUM_PATH_ENV
            )
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(config::resolve_profile_dir())
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        builder = if headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };
        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Chromium handler error: {e}");
                }
            }
        });

        Ok(Self { browser, handler })
    }

    /// Open a new blank tab.
    pub async fn new_surface(&self) -> Result<Box<dyn BrowserSurface>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        Ok(Box::new(ChromiumSurface { page, paused: None }))
    }

    /// Close the browser and stop the handler task.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("Chromium close failed: {e}");
        }
        self.handler.abort();
        Ok(())
    }
}

/// A single Chromium tab.
pub struct ChromiumSurface {
    page: Page,
    paused: Option<EventStream<EventRequestPaused>>,
}

impl ChromiumSurface {
    async fn enable_interception(&mut self) -> Result<()> {
        let params = EnableParams::builder()
            .pattern(
                RequestPattern::builder()
                    .url_pattern("*")
                    .request_stage(RequestStage::Request)
                    .build(),
            )
            .pattern(
                RequestPattern::builder()
                    .url_pattern("*")
                    .request_stage(RequestStage::Response)
                    .build(),
            )
            .build();

        // Subscribe before enabling so no paused request slips past.
        let stream = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .context("failed to listen for paused requests")?;
        self.page
            .execute(params)
            .await
            .context("failed to enable request interception")?;
        self.paused = Some(stream);
        Ok(())
    }
}

#[async_trait]
impl BrowserSurface for ChromiumSurface {
    async fn load(&mut self, url: &str, interception: Interception) -> Result<()> {
        if interception == Interception::On && self.paused.is_none() {
            self.enable_interception().await?;
        }

        // With interception on, `goto` only resolves after we answer the paused
        // document request, so it cannot be awaited here.
        let page = self.page.clone();
        let target = url.to_string();
        tokio::spawn(async move {
            if let Err(e) = page.goto(target.as_str()).await {
                tracing::warn!("Navigation to {target} did not complete: {e}");
            }
        });
        tracing::info!("Loading {url} (interception {:?})", interception);
        Ok(())
    }

    async fn next_request(&mut self) -> Result<Option<InterceptedRequest>> {
        let Some(stream) = self.paused.as_mut() else {
            return Ok(None);
        };
        let Some(event) = stream.next().await else {
            return Ok(None);
        };

        let content_type = event.response_headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case("content-type"))
                .map(|h| h.value.clone())
        });
        let mut nav = NavigationEvent::new(event.request.url.clone());
        nav.content_type = content_type;

        Ok(Some(InterceptedRequest {
            id: event.request_id.inner().clone(),
            event: nav,
        }))
    }

    async fn resolve(
        &mut self,
        request: InterceptedRequest,
        decision: NavigationDecision,
    ) -> Result<()> {
        let id = RequestId::new(request.id);
        let outcome = match decision {
            NavigationDecision::Proceed => self
                .page
                .execute(ContinueRequestParams::new(id))
                .await
                .map(|_| ()),
            NavigationDecision::Veto => self
                .page
                .execute(FailRequestParams::new(id, ErrorReason::BlockedByClient))
                .await
                .map(|_| ()),
        };
        // The request may already be gone (tab navigated away); not fatal.
        if let Err(e) = outcome {
            tracing::debug!("Could not resolve {}: {e}", request.event.url);
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_surface_without_interception() {
        let browser = ChromiumBrowser::launch(true)
            .await
            .expect("failed to launch browser");
        let mut surface = browser.new_surface().await.expect("failed to open tab");

        surface
            .load("data:text/html,<h1>Hello</h1>", Interception::Off)
            .await
            .expect("load failed");

        // Nothing is paused when interception is off.
        let next = surface.next_request().await.expect("next_request failed");
        assert!(next.is_none());

        surface.close().await.expect("close failed");
        browser.shutdown().await.expect("shutdown failed");
    }
}
