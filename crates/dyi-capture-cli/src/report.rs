//! Plain-text dashboard for an analysis result.

use std::fmt::Write;

use dyi_capture::{AnalysisResult, Metric};

/// Render the metric table.
pub fn render_dashboard(username: &str, result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Analysis for @{username}");
    let _ = writeln!(out);

    let rows = result.ordered_metrics();
    let width = rows
        .iter()
        .map(|(name, _)| label_for(name).len())
        .max()
        .unwrap_or(0);

    for (name, value) in rows {
        let _ = writeln!(out, "  {:<width$}  {value:>7}", label_for(name));
    }
    out
}

/// Render the usernames behind one metric, or `None` if the backend sent no such list.
pub fn render_user_list(result: &AnalysisResult, metric: &str) -> Option<String> {
    let users = result.users_for(metric)?;
    let mut out = String::new();
    let _ = writeln!(out, "  {} ({})", label_for(metric), users.len());
    if users.is_empty() {
        let _ = writeln!(out, "    (none)");
    }
    for user in users {
        let _ = writeln!(out, "    @{user}");
    }
    Some(out)
}

fn label_for(name: &str) -> String {
    match Metric::from_name(name) {
        Some(m) => m.label().to_string(),
        None => name.replace('_', " "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> AnalysisResult {
        let mut r = AnalysisResult::default();
        r.all_metrics.insert("total_followers".into(), 250);
        r.all_metrics.insert("not_following_back_count".into(), 2);
        r.all_metrics.insert("close_friends_count".into(), 1);
        r.user_lists.insert(
            "not_following_back_list".into(),
            vec!["alice".into(), "bob".into()],
        );
        r
    }

    #[test]
    fn test_dashboard_lists_labels_in_order() {
        let text = render_dashboard("someone", &result());
        let followers = text.find("Followers").unwrap();
        let not_back = text.find("Not following you back").unwrap();
        let unknown = text.find("close friends count").unwrap();
        assert!(followers < not_back && not_back < unknown);
        assert!(text.contains("@someone"));
        assert!(text.contains("250"));
    }

    #[test]
    fn test_user_list() {
        let text = render_user_list(&result(), "not_following_back_count").unwrap();
        assert!(text.contains("Not following you back (2)"));
        assert!(text.contains("@alice"));
        assert!(render_user_list(&result(), "blocked_count").is_none());
    }
}
