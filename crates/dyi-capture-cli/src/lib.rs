//! dyi-capture host — drives a Chromium tab through Instagram's data-export flow,
//! captures the download link, and submits it to the analysis backend.

pub mod backend;
pub mod browser;
pub mod config;
pub mod events;
pub mod flow;
pub mod report;

pub use backend::{AnalysisBackend, HttpBackend};
pub use browser::{BrowserSurface, InterceptedRequest, Interception};
pub use config::{resolve_backend_timeout, resolve_backend_url};
pub use events::EventBus;
