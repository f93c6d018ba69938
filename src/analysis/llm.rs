//! Scorer backed by an OpenAI-compatible chat completions endpoint

use super::scorer::{dedup_themes, AnalysisError, Scorer};
use crate::config::LlmSettings;
use crate::network::HttpClient;
use crate::providers::{ProviderError, ProviderRequest};
use crate::results::{AnalysisResult, SearchResult, Sentiment};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const SYSTEM_PROMPT: &str = "You analyze music press coverage. Reply with a single JSON object \
with the keys sentiment (one of positive, neutral, negative, mixed), relevanceScore (0-100), \
authority (0-100, how authoritative the publication is), themes (up to four short lowercase \
labels) and summary (one sentence).";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    sentiment: String,
    relevance_score: f64,
    authority: f64,
    #[serde(default)]
    themes: Vec<String>,
    #[serde(default)]
    summary: String,
}

/// Asks a chat model to analyze each result
pub struct LlmScorer {
    client: HttpClient,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl LlmScorer {
    pub fn new(client: HttpClient, settings: &LlmSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
        }
    }

    fn request(&self, result: &SearchResult) -> Result<ProviderRequest, AnalysisError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AnalysisError::Unavailable("LLM API key not configured".into()))?;

        let article = format!(
            "Title: {}\nSource: {}\nPublished: {}\nSnippet: {}",
            result.title,
            result.source,
            result.publish_date.format("%Y-%m-%d"),
            result.snippet
        );

        Ok(ProviderRequest::post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(json!({
                "model": self.model,
                "temperature": 0.2,
                "response_format": { "type": "json_object" },
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": article }
                ]
            })))
    }

    /// Turn the model's JSON reply into an analysis record
    fn parse_content(content: &str) -> Result<AnalysisResult, AnalysisError> {
        // models sometimes wrap the object in a fenced block
        let body = content
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        let raw: RawAnalysis =
            serde_json::from_str(body).map_err(|e| AnalysisError::Parse(e.to_string()))?;
        let sentiment: Sentiment = raw.sentiment.parse().map_err(AnalysisError::Parse)?;

        Ok(AnalysisResult {
            sentiment,
            relevance_score: clamp_score(raw.relevance_score),
            authority: clamp_score(raw.authority),
            themes: dedup_themes(raw.themes.into_iter().map(|t| t.trim().to_lowercase())),
            summary: raw.summary.trim().to_string(),
        })
    }
}

fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 100.0) as u8
    }
}

impl From<ProviderError> for AnalysisError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Configuration(msg) => Self::Unavailable(msg),
            ProviderError::Http { status } => Self::Http { status },
            ProviderError::Transport(msg) => Self::Transport(msg),
            ProviderError::Parse(msg) => Self::Parse(msg),
        }
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    fn name(&self) -> &str {
        "llm"
    }

    async fn score(&self, result: &SearchResult) -> Result<AnalysisResult, AnalysisError> {
        let request = self.request(result)?;
        let response = self.client.execute(request).await?.error_for_status()?;
        let chat: ChatResponse = response.json()?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AnalysisError::Parse("reply has no content".into()))?;

        Self::parse_content(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scorer(endpoint: String, api_key: Option<&str>) -> LlmScorer {
        LlmScorer::new(
            HttpClient::new().unwrap(),
            &LlmSettings {
                endpoint,
                model: "test-model".to_string(),
                api_key: api_key.map(str::to_string),
            },
        )
    }

    fn reply(content: &str) -> serde_json::Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    fn result() -> SearchResult {
        SearchResult::new("https://pitchfork.com/r", "OK Computer review", "Pitchfork")
            .with_snippet("A landmark.")
    }

    #[tokio::test]
    async fn test_llm_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(
                r#"{"sentiment":"Positive","relevanceScore":104.2,"authority":87,
                   "themes":["Innovation","innovation","production quality"],
                   "summary":" Glowing. "}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let scorer = scorer(format!("{}/v1/chat/completions", server.uri()), Some("sk-test"));
        let analysis = scorer.score(&result()).await.unwrap();

        assert_eq!(analysis.sentiment, Sentiment::Positive);
        assert_eq!(analysis.relevance_score, 100);
        assert_eq!(analysis.authority, 87);
        assert_eq!(analysis.themes, vec!["innovation", "production quality"]);
        assert_eq!(analysis.summary, "Glowing.");
    }

    #[tokio::test]
    async fn test_llm_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let scorer = scorer(server.uri(), Some("sk-test"));
        assert_eq!(
            scorer.score(&result()).await.unwrap_err(),
            AnalysisError::Http { status: 429 }
        );
    }

    #[tokio::test]
    async fn test_llm_without_key() {
        let scorer = scorer("http://127.0.0.1:9".to_string(), None);
        assert!(matches!(
            scorer.score(&result()).await,
            Err(AnalysisError::Unavailable(_))
        ));
    }

    #[test]
    fn test_parse_content() {
        let fenced = "```json\n{\"sentiment\":\"mixed\",\"relevanceScore\":-3,\"authority\":50.6}\n```";
        let analysis = LlmScorer::parse_content(fenced).unwrap();
        assert_eq!(analysis.sentiment, Sentiment::Mixed);
        assert_eq!(analysis.relevance_score, 0);
        assert_eq!(analysis.authority, 51);
        assert!(analysis.themes.is_empty());

        let unknown = r#"{"sentiment":"ecstatic","relevanceScore":1,"authority":1}"#;
        assert!(matches!(
            LlmScorer::parse_content(unknown),
            Err(AnalysisError::Parse(_))
        ));
        assert!(LlmScorer::parse_content("not json").is_err());
    }
}
