use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";
const API_KEY_VAR: &str = "PERPLEXITY_API_KEY";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_BODY_SNIPPET: usize = 500;

pub const SYSTEM_PROMPT: &str = "You are a job search assistant. Find crypto/web3 job postings and return them as a JSON array.\n\n\
For each job found, include these fields:\n\
- title: job title\n\
- company: company name\n\
- url: direct link to the job posting (must be a valid URL)\n\
- requirements: key requirements/skills mentioned (as a string)\n\n\
IMPORTANT: Return ONLY a valid JSON array, no explanation or markdown. Example format:\n\
[{\"title\": \"Data Analyst\", \"company\": \"Uniswap\", \"url\": \"https://...\", \"requirements\": \"SQL, Python, 3+ years\"}]\n\n\
If you cannot find any jobs, return an empty array: []";

pub const DEFAULT_QUERY: &str = "Find remote crypto/web3 jobs posted in the last 7 days that \
require SQL or data analytics skills. Return up to 10 results.";

/// Seam for the external search service, so the discovery loop can run
/// against a canned provider in tests.
pub trait SearchProvider {
    /// One search round-trip; returns the raw response text for the parser.
    fn search(&self, query: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    // Low temperature for consistent JSON output
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

pub struct PerplexityClient {
    api_key: String,
    client: reqwest::blocking::Client,
}

impl PerplexityClient {
    /// Fails fast with a configuration error when the credential is
    /// missing, before any network traffic.
    pub fn new() -> Result<Self> {
        let api_key = env::var(API_KEY_VAR).map_err(|_| {
            Error::Config(format!(
                "{} environment variable not set. Set it with: export {}=your-key-here",
                API_KEY_VAR, API_KEY_VAR
            ))
        })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Unexpected(e.to_string()))?;
        Ok(Self { api_key, client })
    }
}

impl SearchProvider for PerplexityClient {
    fn search(&self, query: &str) -> Result<String> {
        let request = ChatRequest {
            model: "sonar".to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: query.to_string(),
                },
            ],
            temperature: 0.1,
            max_tokens: 2000,
        };

        tracing::debug!(query, "sending search request");

        let response = self
            .client
            .post(PERPLEXITY_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: body.chars().take(MAX_BODY_SNIPPET).collect(),
            });
        }

        let envelope: ChatResponse = response
            .json()
            .map_err(|e| Error::Unexpected(format!("Failed to parse API response: {}", e)))?;

        envelope
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Unexpected("No choices in API response".to_string()))
    }
}

fn classify_send_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else if e.is_connect() || e.is_request() || e.is_redirect() {
        Error::Transport(e.to_string())
    } else {
        Error::Unexpected(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Both tests mutate the same process-wide variable.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_client_requires_api_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = env::var(API_KEY_VAR).ok();
        unsafe {
            env::remove_var(API_KEY_VAR);
        }

        let result = PerplexityClient::new();

        if let Some(val) = original {
            unsafe {
                env::set_var(API_KEY_VAR, val);
            }
        }

        let err = result.err().expect("client should fail without a key");
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("PERPLEXITY_API_KEY"));
    }

    #[test]
    fn test_client_with_api_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            env::set_var(API_KEY_VAR, "test-key");
        }

        let result = PerplexityClient::new();
        assert!(result.is_ok());

        unsafe {
            env::remove_var(API_KEY_VAR);
        }
    }

    #[test]
    fn test_default_query_targets_recent_analytics_roles() {
        assert!(DEFAULT_QUERY.contains("SQL"));
        assert!(DEFAULT_QUERY.contains("last 7 days"));
        assert!(DEFAULT_QUERY.contains("10 results"));
    }

    #[test]
    fn test_system_prompt_constrains_output_shape() {
        assert!(SYSTEM_PROMPT.contains("JSON array"));
        for field in ["title", "company", "url", "requirements"] {
            assert!(SYSTEM_PROMPT.contains(field));
        }
    }
}
