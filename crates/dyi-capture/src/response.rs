//! Validation of analysis backend responses.

use serde::Deserialize;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::types::AnalysisResult;

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Option<Value>,
}

/// Turn an HTTP status and body into a result or a failure.
///
/// Success requires a 2xx status, `"status": "success"` and a `results`
/// object carrying both `all_metrics` and `user_lists`.
pub fn parse_analysis_response(http_status: u16, body: &str) -> Result<AnalysisResult, AnalysisError> {
    let ok = (200..300).contains(&http_status);

    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(env) => env,
        Err(e) if ok => {
            return Err(AnalysisError::Malformed(format!("response is not JSON: {e}")));
        }
        Err(_) => {
            return Err(AnalysisError::Server {
                status: http_status,
                message: None,
            });
        }
    };

    if !ok || envelope.status.as_deref() != Some("success") {
        return Err(AnalysisError::Server {
            status: http_status,
            message: envelope.message,
        });
    }

    let results = envelope
        .results
        .ok_or_else(|| AnalysisError::Malformed("missing `results`".to_string()))?;

    serde_json::from_value::<AnalysisResult>(results)
        .map_err(|e| AnalysisError::Malformed(format!("invalid `results`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success() {
        let body = json!({
            "status": "success",
            "results": {
                "all_metrics": { "mutual_following_count": 3, "blocked_count": 0 },
                "user_lists": { "mutual_following_list": ["a", "b", "c"], "blocked_list": [] }
            }
        })
        .to_string();
        let result = parse_analysis_response(200, &body).unwrap();
        assert_eq!(result.metric("mutual_following_count"), Some(3));
        assert_eq!(result.users_for("mutual_following_count").unwrap().len(), 3);
    }

    #[test]
    fn test_error_status_carries_message() {
        let body = json!({ "status": "error", "message": "link expired" }).to_string();
        let err = parse_analysis_response(500, &body).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Server {
                status: 500,
                message: Some("link expired".into())
            }
        );
    }

    #[test]
    fn test_non_success_status_with_200() {
        let body = json!({ "status": "error" }).to_string();
        let err = parse_analysis_response(200, &body).unwrap_err();
        assert!(matches!(err, AnalysisError::Server { message: None, .. }));
    }

    #[test]
    fn test_success_without_lists_is_malformed() {
        let body = json!({
            "status": "success",
            "results": { "all_metrics": { "blocked_count": 1 } }
        })
        .to_string();
        assert!(matches!(
            parse_analysis_response(200, &body),
            Err(AnalysisError::Malformed(_))
        ));

        let no_results = json!({ "status": "success" }).to_string();
        assert!(matches!(
            parse_analysis_response(200, &no_results),
            Err(AnalysisError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        let body = json!({
            "status": "success",
            "results": { "all_metrics": { "blocked_count": "many" }, "user_lists": {} }
        })
        .to_string();
        assert!(matches!(
            parse_analysis_response(200, &body),
            Err(AnalysisError::Malformed(_))
        ));
    }

    #[test]
    fn test_html_error_page() {
        let err = parse_analysis_response(502, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Server {
                status: 502,
                message: None
            }
        );
        assert!(matches!(
            parse_analysis_response(200, "<html>ok?</html>"),
            Err(AnalysisError::Malformed(_))
        ));
    }
}
