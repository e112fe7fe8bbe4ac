use regex::Regex;
use serde_json::Value;

pub const PARSE_ERROR_TITLE: &str = "[PARSE ERROR]";
pub const NO_TITLE: &str = "[No Title]";

/// Maximum amount of raw text carried into a synthetic error candidate.
const RAW_SNIPPET_LEN: usize = 500;

/// A job candidate extracted from a raw search response.
///
/// Candidates with `parse_error` set are kept visible to the reviewer
/// instead of being dropped, so a bad response never fails silently.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCandidate {
    pub title: String,
    pub company: String,
    pub url: Option<String>,
    pub requirements: String,
    pub parse_error: bool,
}

impl JobCandidate {
    fn error(requirements: impl Into<String>) -> Self {
        Self {
            title: PARSE_ERROR_TITLE.to_string(),
            company: "Unknown".to_string(),
            url: None,
            requirements: requirements.into(),
            parse_error: true,
        }
    }
}

/// Find the JSON payload inside a raw API response.
///
/// The response may contain markdown fencing or prose around the array.
/// Tried in order: the whole string, each fenced code block, the first
/// bracketed `[...]` substring.
fn extract_json(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    if serde_json::from_str::<Value>(raw).is_ok() {
        return Some(raw.to_string());
    }

    let code_block = Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("valid regex");
    for captures in code_block.captures_iter(raw) {
        let candidate = captures[1].trim();
        if serde_json::from_str::<Value>(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }

    let array = Regex::new(r"\[[\s\S]*\]").expect("valid regex");
    if let Some(found) = array.find(raw) {
        if serde_json::from_str::<Value>(found.as_str()).is_ok() {
            return Some(found.as_str().to_string());
        }
    }

    None
}

fn truncate_raw(raw: &str) -> String {
    raw.chars().take(RAW_SNIPPET_LEN).collect()
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Parse a raw API response into job candidates.
///
/// Never returns an empty list: when nothing structured can be extracted,
/// a single synthetic parse-error candidate carries a snippet of the raw
/// input so the failure surfaces during review.
pub fn parse_jobs(raw: &str) -> Vec<JobCandidate> {
    let Some(json_str) = extract_json(raw) else {
        let requirements = if raw.is_empty() {
            "Empty response".to_string()
        } else {
            truncate_raw(raw)
        };
        return vec![JobCandidate::error(requirements)];
    };

    let data: Value = match serde_json::from_str(&json_str) {
        Ok(value) => value,
        Err(e) => {
            return vec![JobCandidate::error(format!("JSON decode error: {}", e))];
        }
    };

    let items = match data {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut candidates = Vec::new();
    for item in items {
        let Value::Object(obj) = item else {
            continue;
        };

        let mut candidate = JobCandidate {
            title: string_field(&obj, "title").unwrap_or_else(|| NO_TITLE.to_string()),
            company: string_field(&obj, "company").unwrap_or_else(|| "Unknown".to_string()),
            url: string_field(&obj, "url"),
            requirements: string_field(&obj, "requirements").unwrap_or_default(),
            parse_error: false,
        };

        // A title/company without a resolvable link is not actionable.
        if let Some(url) = &candidate.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                candidate.url = None;
                candidate.parse_error = true;
            }
        }

        candidates.push(candidate);
    }

    if candidates.is_empty() {
        return vec![JobCandidate::error("No valid jobs found in response")];
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_json_array() {
        let raw = r#"[{"title":"Data Analyst","company":"Uniswap","url":"https://x.com/1","requirements":"SQL"}]"#;
        let jobs = parse_jobs(raw);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Data Analyst");
        assert_eq!(jobs[0].company, "Uniswap");
        assert_eq!(jobs[0].url.as_deref(), Some("https://x.com/1"));
        assert_eq!(jobs[0].requirements, "SQL");
        assert!(!jobs[0].parse_error);
    }

    #[test]
    fn test_one_candidate_per_array_element() {
        let raw = r#"[
            {"title":"A","company":"X","url":"https://x.com/a","requirements":""},
            {"title":"B","company":"Y","url":"https://x.com/b","requirements":""},
            {"title":"C","company":"Z","url":"https://x.com/c","requirements":""}
        ]"#;
        let jobs = parse_jobs(raw);
        assert_eq!(jobs.len(), 3);
        assert!(jobs.iter().all(|j| !j.parse_error));
    }

    #[test]
    fn test_prose_yields_single_error_candidate() {
        let jobs = parse_jobs("no json here");

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, PARSE_ERROR_TITLE);
        assert_eq!(jobs[0].company, "Unknown");
        assert_eq!(jobs[0].url, None);
        assert_eq!(jobs[0].requirements, "no json here");
        assert!(jobs[0].parse_error);
    }

    #[test]
    fn test_empty_input() {
        let jobs = parse_jobs("");

        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].parse_error);
        assert_eq!(jobs[0].requirements, "Empty response");
    }

    #[test]
    fn test_error_requirements_truncated_to_500_chars() {
        let raw = "x".repeat(2000);
        let jobs = parse_jobs(&raw);

        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].parse_error);
        assert_eq!(jobs[0].requirements.chars().count(), 500);
    }

    #[test]
    fn test_extracts_from_fenced_code_block() {
        let raw = "Here are the jobs:\n```json\n[{\"title\":\"Analyst\",\"company\":\"Aave\",\"url\":\"https://a.com/1\"}]\n```\nHope that helps!";
        let jobs = parse_jobs(raw);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Analyst");
        assert!(!jobs[0].parse_error);
    }

    #[test]
    fn test_extracts_from_unlabeled_fence() {
        let raw = "```\n[{\"title\":\"Dev\",\"company\":\"Lido\",\"url\":\"https://l.fi/1\"}]\n```";
        let jobs = parse_jobs(raw);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Lido");
    }

    #[test]
    fn test_extracts_bracketed_substring() {
        let raw = "I found one posting: [{\"title\":\"Eng\",\"company\":\"OP\",\"url\":\"https://op.io/1\"}] posted recently.";
        let jobs = parse_jobs(raw);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Eng");
    }

    #[test]
    fn test_single_object_is_wrapped() {
        let raw = r#"{"title":"Solo","company":"Maker","url":"https://m.com/1"}"#;
        let jobs = parse_jobs(raw);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Solo");
        assert!(!jobs[0].parse_error);
    }

    #[test]
    fn test_non_object_elements_are_skipped() {
        let raw = r#"["garbage", 42, {"title":"Real","company":"X","url":"https://x.com/1"}]"#;
        let jobs = parse_jobs(raw);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Real");
    }

    #[test]
    fn test_all_non_object_elements_yield_error_candidate() {
        let jobs = parse_jobs(r#"["a", "b", 3]"#);

        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].parse_error);
        assert_eq!(jobs[0].requirements, "No valid jobs found in response");
    }

    #[test]
    fn test_empty_array_yields_error_candidate() {
        let jobs = parse_jobs("[]");

        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].parse_error);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let jobs = parse_jobs(r#"[{"url":"https://x.com/1"}]"#);

        assert_eq!(jobs[0].title, NO_TITLE);
        assert_eq!(jobs[0].company, "Unknown");
        assert_eq!(jobs[0].requirements, "");
        assert!(!jobs[0].parse_error);
    }

    #[test]
    fn test_non_http_url_is_nulled_and_flagged() {
        let jobs = parse_jobs(
            r#"[{"title":"Analyst","company":"Aave","url":"ftp://a.com/1","requirements":"SQL"}]"#,
        );

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].url, None);
        assert!(jobs[0].parse_error);
        // Other fields survive normalization.
        assert_eq!(jobs[0].title, "Analyst");
    }

    #[test]
    fn test_missing_url_is_not_a_parse_error() {
        let jobs = parse_jobs(r#"[{"title":"Analyst","company":"Aave"}]"#);

        assert_eq!(jobs[0].url, None);
        assert!(!jobs[0].parse_error);
    }
}
