//! Core data types for the capture flow: stages, navigation events, and analysis payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Entry point of the data-request flow on Meta's Accounts Center.
pub const DATA_REQUEST_URL: &str =
    "https://accountscenter.instagram.com/info_and_permissions/dyi/?entry_point=deeplink_screen";

/// Entry point of the download flow. Same page; the export list lives there once ready.
pub const DATA_DOWNLOAD_URL: &str =
    "https://accountscenter.instagram.com/info_and_permissions/dyi/?entry_point=deeplink_screen";

/// Where a session currently is in the request → download → analyze flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Idle. Dashboard shows the last analysis, if any.
    Home,
    /// Browser shows the data-request page. No interception.
    RequestFlow,
    /// Browser shows the download page. Interception active.
    DownloadFlow,
    /// Link captured, waiting on the analysis backend.
    Processing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Home => "home",
            Stage::RequestFlow => "request_flow",
            Stage::DownloadFlow => "download_flow",
            Stage::Processing => "processing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One navigation or sub-resource request observed on the browser surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEvent {
    pub url: String,
    /// Declared content type, when the surface's network layer exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl NavigationEvent {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Answer handed back to the browser host for a single navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationDecision {
    /// Let the surface load the resource itself.
    Proceed,
    /// Block the load; the app consumes the link instead.
    Veto,
}

impl NavigationDecision {
    pub fn should_proceed(&self) -> bool {
        matches!(self, NavigationDecision::Proceed)
    }
}

/// Body sent to the analysis backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub download_url: String,
    pub username: String,
    /// Identifies the capture this request belongs to. Never sent on the wire.
    #[serde(skip)]
    pub ticket: u64,
}

/// Metrics and user lists returned by the analysis backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(alias = "metrics")]
    pub all_metrics: BTreeMap<String, i64>,
    #[serde(alias = "userLists")]
    pub user_lists: BTreeMap<String, Vec<String>>,
}

impl AnalysisResult {
    /// Value of a metric by its wire name.
    pub fn metric(&self, name: &str) -> Option<i64> {
        self.all_metrics.get(name).copied()
    }

    /// Usernames behind a metric.
    ///
    /// Accepts either a metric name (`blocked_count`) or a list key
    /// (`blocked_list`). Known metrics use their paired list; otherwise a
    /// `_count` suffix is swapped for `_list`.
    pub fn users_for(&self, name: &str) -> Option<&[String]> {
        let key = match Metric::from_name(name).and_then(|m| m.list_key()) {
            Some(key) => key.to_string(),
            None => match name.strip_suffix("_count") {
                Some(stem) => format!("{stem}_list"),
                None => name.to_string(),
            },
        };
        self.user_lists.get(&key).map(Vec::as_slice)
    }

    /// Metrics in dashboard order: known metrics first, then anything else the backend sent.
    pub fn ordered_metrics(&self) -> Vec<(&str, i64)> {
        let mut out: Vec<(&str, i64)> = Metric::ALL
            .iter()
            .filter_map(|m| self.metric(m.name()).map(|v| (m.name(), v)))
            .collect();
        out.extend(
            self.all_metrics
                .iter()
                .filter(|(k, _)| Metric::from_name(k).is_none())
                .map(|(k, v)| (k.as_str(), *v)),
        );
        out
    }
}

/// Metrics the dashboard knows how to label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalFollowers,
    TotalFollowing,
    MutualFollowingCount,
    NotFollowingBackCount,
    YouNotFollowingCount,
    UnfollowedCount,
    RecentFollowersCount,
    AcceptedRequestsCount,
    PendingRequestsCount,
    BlockedCount,
    HideStoryCount,
    RestrictedProfilesCount,
}

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::TotalFollowers,
        Metric::TotalFollowing,
        Metric::MutualFollowingCount,
        Metric::NotFollowingBackCount,
        Metric::YouNotFollowingCount,
        Metric::UnfollowedCount,
        Metric::RecentFollowersCount,
        Metric::AcceptedRequestsCount,
        Metric::PendingRequestsCount,
        Metric::BlockedCount,
        Metric::HideStoryCount,
        Metric::RestrictedProfilesCount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::TotalFollowers => "total_followers",
            Metric::TotalFollowing => "total_following",
            Metric::MutualFollowingCount => "mutual_following_count",
            Metric::NotFollowingBackCount => "not_following_back_count",
            Metric::YouNotFollowingCount => "you_not_following_count",
            Metric::UnfollowedCount => "unfollowed_count",
            Metric::RecentFollowersCount => "recent_followers_count",
            Metric::AcceptedRequestsCount => "accepted_requests_count",
            Metric::PendingRequestsCount => "pending_requests_count",
            Metric::BlockedCount => "blocked_count",
            Metric::HideStoryCount => "hide_story_count",
            Metric::RestrictedProfilesCount => "restricted_profiles_count",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::TotalFollowers => "Followers",
            Metric::TotalFollowing => "Following",
            Metric::MutualFollowingCount => "Mutual follows",
            Metric::NotFollowingBackCount => "Not following you back",
            Metric::YouNotFollowingCount => "You don't follow back",
            Metric::UnfollowedCount => "Recently unfollowed",
            Metric::RecentFollowersCount => "Recent followers",
            Metric::AcceptedRequestsCount => "Accepted follow requests",
            Metric::PendingRequestsCount => "Pending follow requests",
            Metric::BlockedCount => "Blocked accounts",
            Metric::HideStoryCount => "Hidden from your story",
            Metric::RestrictedProfilesCount => "Restricted accounts",
        }
    }

    /// Key of the paired username list. Totals have none.
    pub fn list_key(&self) -> Option<&'static str> {
        match self {
            Metric::TotalFollowers | Metric::TotalFollowing => None,
            Metric::MutualFollowingCount => Some("mutual_following_list"),
            Metric::NotFollowingBackCount => Some("not_following_back_list"),
            Metric::YouNotFollowingCount => Some("you_not_following_list"),
            Metric::UnfollowedCount => Some("unfollowed_list"),
            Metric::RecentFollowersCount => Some("recent_followers_list"),
            Metric::AcceptedRequestsCount => Some("accepted_requests_list"),
            Metric::PendingRequestsCount => Some("pending_requests_list"),
            Metric::BlockedCount => Some("blocked_list"),
            Metric::HideStoryCount => Some("hide_story_list"),
            Metric::RestrictedProfilesCount => Some("restricted_profiles_list"),
        }
    }

    pub fn from_name(name: &str) -> Option<Metric> {
        Metric::ALL.iter().copied().find(|m| m.name() == name)
    }
}
