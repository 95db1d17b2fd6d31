/// Pre-publish moderation gate
///
/// Content is classified before a draft ever reaches the canonical feed:
/// a local keyword screen rejects the obvious cases without a network
/// round trip, then the classifier service is asked for a one-word
/// verdict. An unreachable or garbled classifier FAILS OPEN: after the
/// retry budget the content is treated as safe, because publish
/// availability outranks classification coverage here. A definitive
/// UNSAFE is never retried.
use crate::api::types::ModerateRequest;
use crate::config::ModerationConfig;
use crate::error::{EngineError, Result};
use crate::retry::{with_retry, RetryConfig};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Unsafe,
}

/// Substring screen over a fixed denylist, case-insensitive
#[derive(Debug, Clone)]
pub struct KeywordScreen {
    keywords: Vec<String>,
}

const DEFAULT_DENYLIST: &[&str] = &[
    "18+", "gore", "nsfw", "xxx", "nude", "explicit", "kill yourself",
];

impl Default for KeywordScreen {
    fn default() -> Self {
        KeywordScreen {
            keywords: DEFAULT_DENYLIST.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

impl KeywordScreen {
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        KeywordScreen {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// First denylisted term found in the text, if any
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(|k| k.as_str())
    }
}

/// The classifier answers with free text; only an embedded token decides.
/// No recognizable token is a transport-class failure, not a verdict.
pub fn parse_verdict(body: &str) -> Option<Verdict> {
    let upper = body.to_uppercase();
    if upper.contains("UNSAFE") {
        Some(Verdict::Unsafe)
    } else if upper.contains("SAFE") {
        Some(Verdict::Safe)
    } else {
        None
    }
}

pub struct ModerationGateway {
    http: reqwest::Client,
    url: String,
    retry: RetryConfig,
    screen: KeywordScreen,
}

impl ModerationGateway {
    pub fn new(config: &ModerationConfig, retry: RetryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| EngineError::Internal(format!("http client: {}", e)))?;
        Ok(ModerationGateway {
            http,
            url: config.url.clone(),
            retry,
            screen: KeywordScreen::default(),
        })
    }

    pub fn with_screen(mut self, screen: KeywordScreen) -> Self {
        self.screen = screen;
        self
    }

    /// Classify a draft. Never returns an error: unavailability resolves
    /// to `Safe` once the retry budget is spent.
    pub async fn classify(&self, text: &str) -> Verdict {
        if let Some(keyword) = self.screen.first_match(text) {
            debug!("draft rejected by keyword screen: {:?}", keyword);
            return Verdict::Unsafe;
        }

        let outcome = with_retry(&self.retry, "moderation.classify", || {
            let http = self.http.clone();
            let url = self.url.clone();
            let text = text.to_string();
            async move {
                let response = http
                    .post(&url)
                    .json(&ModerateRequest { text })
                    .send()
                    .await?
                    .error_for_status()?;
                let body = response.text().await?;
                parse_verdict(&body).ok_or_else(|| {
                    EngineError::Transport(format!(
                        "unrecognized moderation verdict: {:.80}",
                        body
                    ))
                })
            }
        })
        .await;

        match outcome {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("moderation service unavailable, failing open: {}", e);
                Verdict::Safe
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_token_wins_over_surrounding_prose() {
        assert_eq!(parse_verdict("SAFE"), Some(Verdict::Safe));
        assert_eq!(parse_verdict("unsafe"), Some(Verdict::Unsafe));
        assert_eq!(
            parse_verdict("The content appears to be SAFE for the community."),
            Some(Verdict::Safe)
        );
        // UNSAFE contains SAFE as a substring; the stronger token wins
        assert_eq!(
            parse_verdict("This is UNSAFE, do not publish."),
            Some(Verdict::Unsafe)
        );
        assert_eq!(parse_verdict("I cannot help with that."), None);
        assert_eq!(parse_verdict(""), None);
    }

    #[test]
    fn keyword_screen_is_case_insensitive() {
        let screen = KeywordScreen::default();
        assert_eq!(screen.first_match("totally NSFW stuff"), Some("nsfw"));
        assert_eq!(screen.first_match("a calm study plan"), None);
    }

    #[test]
    fn custom_denylist_replaces_the_default() {
        let screen = KeywordScreen::new(vec!["homework answers".to_string()]);
        assert!(screen.first_match("selling homework ANSWERS here").is_some());
        assert!(screen.first_match("nsfw").is_none());
    }
}
