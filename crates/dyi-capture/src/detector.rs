//! Download-link detection rules.
//!
//! Classification only: [`DetectionRules::classify`] says which rule (if any)
//! an event matches. Turning that into a proceed/veto answer and a stage
//! change is the session's job.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::NavigationEvent;

/// Host Meta serves DYI export archives from.
pub const BULK_FILE_HOST: &str = "bigzipfiles.instagram.com";

/// Which rule recognized a download. Variants are listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedRule {
    BulkHost,
    ArchiveExtension,
    FileParameter,
    ContentType,
}

impl MatchedRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchedRule::BulkHost => "bulk_host",
            MatchedRule::ArchiveExtension => "archive_extension",
            MatchedRule::FileParameter => "file_parameter",
            MatchedRule::ContentType => "content_type",
        }
    }
}

impl std::fmt::Display for MatchedRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ordered predicate set. All comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRules {
    pub hosts: Vec<String>,
    pub extensions: Vec<String>,
    pub parameters: Vec<String>,
    pub content_types: Vec<String>,
}

impl Default for DetectionRules {
    fn default() -> Self {
        Self {
            hosts: vec![BULK_FILE_HOST.to_string()],
            extensions: vec![".zip".to_string()],
            parameters: vec![
                "download_url".to_string(),
                "download_file_secure".to_string(),
                "data_file".to_string(),
            ],
            content_types: vec![
                "application/zip".to_string(),
                "application/x-zip-compressed".to_string(),
                "application/octet-stream".to_string(),
            ],
        }
    }
}

impl DetectionRules {
    /// Add a bulk-file host, e.g. when the provider moves its CDN.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into().to_ascii_lowercase());
        self
    }

    /// First matching rule in priority order, or `None` for an ordinary navigation.
    pub fn classify(&self, event: &NavigationEvent) -> Option<MatchedRule> {
        let raw = event.url.to_ascii_lowercase();
        let parsed = Url::parse(&event.url).ok();

        if self.matches_host(parsed.as_ref(), &raw) {
            return Some(MatchedRule::BulkHost);
        }
        if self.matches_extension(parsed.as_ref(), &raw) {
            return Some(MatchedRule::ArchiveExtension);
        }
        if let Some(url) = parsed.as_ref() {
            if self.matches_parameter(url) {
                return Some(MatchedRule::FileParameter);
            }
        }
        if let Some(ct) = event.content_type.as_deref() {
            if self.matches_content_type(ct) {
                return Some(MatchedRule::ContentType);
            }
        }
        None
    }

    fn matches_host(&self, parsed: Option<&Url>, raw: &str) -> bool {
        match parsed {
            Some(url) => match url.host_str() {
                Some(host) => {
                    let host = host.to_ascii_lowercase();
                    self.hosts.iter().any(|h| host.contains(&h.to_ascii_lowercase()))
                }
                None => false,
            },
            // Unparseable: fall back to a plain substring check.
            None => self
                .hosts
                .iter()
                .any(|h| raw.contains(&h.to_ascii_lowercase())),
        }
    }

    fn matches_extension(&self, parsed: Option<&Url>, raw: &str) -> bool {
        let path = match parsed {
            Some(url) => url.path().to_ascii_lowercase(),
            None => raw
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        self.extensions
            .iter()
            .any(|ext| path.ends_with(&ext.to_ascii_lowercase()))
    }

    fn matches_parameter(&self, url: &Url) -> bool {
        url.query_pairs().any(|(name, _)| {
            self.parameters
                .iter()
                .any(|p| p.eq_ignore_ascii_case(name.as_ref()))
        })
    }

    fn matches_content_type(&self, content_type: &str) -> bool {
        let ct = content_type.to_ascii_lowercase();
        self.content_types
            .iter()
            .any(|t| ct.contains(&t.to_ascii_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(url: &str) -> Option<MatchedRule> {
        DetectionRules::default().classify(&NavigationEvent::new(url))
    }

    #[test]
    fn test_custom_rule_values_ignore_case() {
        let rules = DetectionRules {
            hosts: vec!["Exports.Example.NET".into()],
            extensions: vec![".ZIP".into()],
            parameters: vec!["Export_File".into()],
            content_types: vec!["Application/Zip".into()],
        };
        let check = |url: &str, ct: Option<&str>| {
            let mut event = NavigationEvent::new(url);
            event.content_type = ct.map(str::to_string);
            rules.classify(&event)
        };
        assert_eq!(
            check("https://exports.example.net/d/1", None),
            Some(MatchedRule::BulkHost)
        );
        assert_eq!(
            check("https://cdn.example.org/me.zip", None),
            Some(MatchedRule::ArchiveExtension)
        );
        assert_eq!(
            check("https://cdn.example.org/get?export_file=1", None),
            Some(MatchedRule::FileParameter)
        );
        assert_eq!(
            check("https://cdn.example.org/get", Some("application/zip")),
            Some(MatchedRule::ContentType)
        );
    }

    #[test]
    fn test_bulk_host_matches() {
        assert_eq!(
            classify("https://bigzipfiles.instagram.com/d/abc123"),
            Some(MatchedRule::BulkHost)
        );
        assert_eq!(
            classify("https://BIGZIPFILES.instagram.com/d/abc123?x=1"),
            Some(MatchedRule::BulkHost)
        );
    }

    #[test]
    fn test_accounts_center_is_ordinary_navigation() {
        assert_eq!(
            classify("https://accountscenter.instagram.com/info_and_permissions/dyi/"),
            None
        );
        assert_eq!(classify(crate::types::DATA_DOWNLOAD_URL), None);
        assert_eq!(classify("https://www.instagram.com/download/request/"), None);
    }

    #[test]
    fn test_host_rule_ignores_path_mentions() {
        // Host appears only in a query value; the host rule must not fire.
        assert_eq!(
            classify("https://l.instagram.com/?next=bigzipfiles.instagram.com"),
            None
        );
    }

    #[test]
    fn test_archive_extension_fallback() {
        assert_eq!(
            classify("https://cdn.example.net/exports/instagram-user-2025.ZIP?sig=1"),
            Some(MatchedRule::ArchiveExtension)
        );
    }

    #[test]
    fn test_file_parameter_fallback() {
        assert_eq!(
            classify("https://www.instagram.com/dyi/fetch/?download_url=abc"),
            Some(MatchedRule::FileParameter)
        );
        assert_eq!(
            classify("https://www.instagram.com/dyi/?foo=1&data_file=xyz"),
            Some(MatchedRule::FileParameter)
        );
        // Parameter name must match exactly, not as a prefix of another name.
        assert_eq!(classify("https://www.instagram.com/?download_urls=abc"), None);
    }

    #[test]
    fn test_content_type_fallback() {
        let rules = DetectionRules::default();
        let event = NavigationEvent::new("https://scontent.cdninstagram.com/v/t1/blob")
            .with_content_type("Application/Octet-Stream; charset=binary");
        assert_eq!(rules.classify(&event), Some(MatchedRule::ContentType));

        let html = NavigationEvent::new("https://scontent.cdninstagram.com/v/t1/blob")
            .with_content_type("text/html");
        assert_eq!(rules.classify(&html), None);
    }

    #[test]
    fn test_priority_order() {
        let event = NavigationEvent::new("https://bigzipfiles.instagram.com/export.zip?data_file=1")
            .with_content_type("application/zip");
        assert_eq!(
            DetectionRules::default().classify(&event),
            Some(MatchedRule::BulkHost)
        );
    }

    #[test]
    fn test_unparseable_url_uses_substring_checks() {
        assert_eq!(
            classify("bigzipfiles.instagram.com/d/abc"),
            Some(MatchedRule::BulkHost)
        );
        assert_eq!(classify("not a url/export.zip"), Some(MatchedRule::ArchiveExtension));
        assert_eq!(classify("not a url"), None);
    }

    #[test]
    fn test_extra_host() {
        let rules = DetectionRules::default().with_host("Exports.FBCDN.net");
        let event = NavigationEvent::new("https://exports.fbcdn.net/a/b");
        assert_eq!(rules.classify(&event), Some(MatchedRule::BulkHost));
    }
}
