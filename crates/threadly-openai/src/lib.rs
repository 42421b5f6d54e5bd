// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-backed classifier and reply generator for Threadly.
//!
//! Implements [`AnalyzerAdapter`]: `analyze` asks for a JSON classification
//! document, `generate_reply` asks for a single short reply.

pub mod client;
pub mod types;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use threadly_config::model::OpenAiConfig;
use threadly_core::{
    AnalyzerAdapter, GenerateRequest, MentionAnalysis, MentionAuthor, MentionType, ThreadlyError,
};
use tracing::{info, warn};

use crate::client::OpenAiClient;
use crate::types::{AnalysisResult, ChatMessage, ChatRequest, ChatResponse, ResponseFormat};

const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an AI assistant that analyzes social media mentions for a business account.
Your task is to classify mentions and determine the appropriate response strategy.

You must respond with a valid JSON object containing exactly these fields:
- mention_type: one of "complaint", "positive", "question", "neutral", "spam"
- sentiment: a number from -1.0 (very negative) to 1.0 (very positive)
- intent: brief description of what the user wants (e.g., "seeking_resolution", "giving_praise", "asking_question", "general_comment")
- urgency: one of "high", "medium", "low"
- keywords: array of 1-5 key words/phrases from the mention
- suggested_tone: recommended tone for reply (e.g., "apologetic", "grateful", "helpful", "friendly")

Classification guidelines:
- complaint: negative feedback, issues, problems, frustration
- positive: praise, compliments, thanks, recommendations
- question: seeking information, how-to, availability inquiries
- neutral: general mentions without strong sentiment
- spam: promotional content, bots, irrelevant mentions"#;

const REPLY_SYSTEM_PROMPT: &str = "You are a helpful social media manager. Generate a brief, professional reply to a mention.
Keep the reply concise (under 280 characters), friendly, and appropriate for the context.
Do not use hashtags unless specifically relevant. Sign off naturally without formal signatures.";

/// Token ceiling for generated replies.
const REPLY_MAX_TOKENS: u32 = 150;

/// OpenAI implementation of [`AnalyzerAdapter`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiAnalyzer {
    client: OpenAiClient,
    model: String,
    max_tokens: u32,
}

impl OpenAiAnalyzer {
    pub fn new(config: &OpenAiConfig) -> Result<Self, ThreadlyError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(model = %config.model, "OpenAI analyzer initialized");

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: OpenAiClient, config: &OpenAiConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    fn analysis_request(&self, text: &str, author: &MentionAuthor) -> ChatRequest {
        let user_prompt = format!(
            "Analyze this social media mention:\n\nAuthor: @{}\nContent: \"{}\"\n\nProvide your analysis as a JSON object.",
            author.username, text
        );
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
                ChatMessage::user(user_prompt),
            ],
            max_tokens: self.max_tokens,
            response_format: Some(ResponseFormat::json_object()),
        }
    }

    fn reply_request(&self, request: &GenerateRequest) -> ChatRequest {
        let hint = request.hint.as_deref().unwrap_or_default();
        let user_prompt = format!(
            "Generate a reply to this mention:\n\nAuthor: @{}\nContent: \"{}\"\n\nAnalysis:\n- Type: {}\n- Sentiment: {:.2}\n- Suggested tone: {}\n\n{}\n\nGenerate a single reply message.",
            request.author.username,
            request.text,
            request.analysis.mention_type,
            request.analysis.sentiment,
            request.analysis.suggested_tone,
            hint,
        );
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(REPLY_SYSTEM_PROMPT),
                ChatMessage::user(user_prompt),
            ],
            max_tokens: REPLY_MAX_TOKENS,
            response_format: None,
        }
    }
}

fn first_content(response: ChatResponse) -> Result<String, ThreadlyError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ThreadlyError::Provider {
            message: "no response from OpenAI".into(),
            source: None,
        })
}

/// Converts the model's JSON document into a [`MentionAnalysis`].
///
/// Unknown mention types fall back to `neutral`; sentiment is clamped to
/// `[-1.0, 1.0]`.
fn parse_analysis(content: &str) -> Result<MentionAnalysis, ThreadlyError> {
    let result: AnalysisResult =
        serde_json::from_str(content).map_err(|e| ThreadlyError::Provider {
            message: format!("failed to parse classification: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mention_type =
        MentionType::from_str(result.mention_type.trim().to_lowercase().as_str())
            .unwrap_or_else(|_| {
                warn!(mention_type = %result.mention_type, "unknown mention type, using neutral");
                MentionType::Neutral
            });

    let sentiment = if result.sentiment.is_finite() {
        result.sentiment.clamp(-1.0, 1.0)
    } else {
        0.0
    };

    Ok(MentionAnalysis {
        mention_type,
        sentiment,
        intent: result.intent,
        urgency: result.urgency,
        keywords: result.keywords,
        suggested_tone: result.suggested_tone,
        raw_analysis: content.to_string(),
    })
}

fn resolve_api_key(config_key: &Option<String>) -> Result<SecretString, ThreadlyError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(SecretString::from(key.clone()));
    }

    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            ThreadlyError::Config(
                "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
            )
        })
}

#[async_trait]
impl AnalyzerAdapter for OpenAiAnalyzer {
    async fn analyze(
        &self,
        text: &str,
        author: &MentionAuthor,
    ) -> Result<MentionAnalysis, ThreadlyError> {
        let response = self.client.complete(&self.analysis_request(text, author)).await?;
        parse_analysis(&first_content(response)?)
    }

    async fn generate_reply(&self, request: GenerateRequest) -> Result<String, ThreadlyError> {
        let response = self.client.complete(&self.reply_request(&request)).await?;
        let reply = first_content(response)?.trim().to_string();
        if reply.is_empty() {
            return Err(ThreadlyError::Provider {
                message: "OpenAI returned an empty reply".into(),
                source: None,
            });
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> OpenAiConfig {
        OpenAiConfig {
            api_key: Some("sk-test".into()),
            base_url: base_url.to_string(),
            ..OpenAiConfig::default()
        }
    }

    fn analyzer(base_url: &str) -> OpenAiAnalyzer {
        let cfg = config(base_url);
        let client = OpenAiClient::new(
            &SecretString::from("sk-test"),
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
        .with_retry_delay(Duration::from_millis(10));
        OpenAiAnalyzer::with_client(client, &cfg)
    }

    fn author() -> MentionAuthor {
        MentionAuthor::new("u-1", "carol", None, false)
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
        })
    }

    #[test]
    fn resolve_api_key_from_config() {
        assert!(resolve_api_key(&Some("sk-abc".into())).is_ok());
    }

    #[test]
    fn parse_analysis_clamps_and_defaults() {
        let a = parse_analysis(
            r#"{"mention_type":"Rant","sentiment":-3.5,"intent":"vent","urgency":"high","keywords":["slow"],"suggested_tone":"calm"}"#,
        )
        .unwrap();
        assert_eq!(a.mention_type, MentionType::Neutral);
        assert_eq!(a.sentiment, -1.0);
        assert_eq!(a.keywords, vec!["slow".to_string()]);
        assert!(a.raw_analysis.contains("Rant"));
    }

    #[test]
    fn parse_analysis_rejects_non_json() {
        assert!(parse_analysis("I think it's a complaint").is_err());
    }

    #[tokio::test]
    async fn analyze_requests_json_and_maps_result() {
        let server = MockServer::start().await;
        let doc = r#"{"mention_type":"complaint","sentiment":-0.6,"intent":"seeking_resolution","urgency":"high","keywords":["broken","fix"],"suggested_tone":"apologetic"}"#;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 500,
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(doc)))
            .expect(1)
            .mount(&server)
            .await;

        let analysis = analyzer(&server.uri())
            .analyze("This app is broken, please fix it", &author())
            .await
            .unwrap();
        assert_eq!(analysis.mention_type, MentionType::Complaint);
        assert_eq!(analysis.sentiment, -0.6);
        assert_eq!(analysis.suggested_tone, "apologetic");
        assert_eq!(analysis.raw_analysis, doc);
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = analyzer(&server.uri())
            .analyze("hi", &author())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no response from OpenAI"));
    }

    #[tokio::test]
    async fn generate_reply_uses_fixed_token_ceiling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"max_tokens": 150})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("  Sorry about that, we're on it!  ")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = GenerateRequest {
            text: "This app is broken".into(),
            author: author(),
            analysis: MentionAnalysis {
                mention_type: MentionType::Complaint,
                sentiment: -0.6,
                intent: "seeking_resolution".into(),
                urgency: "high".into(),
                keywords: vec![],
                suggested_tone: "apologetic".into(),
                raw_analysis: "{}".into(),
            },
            hint: None,
        };
        let reply = analyzer(&server.uri()).generate_reply(request).await.unwrap();
        assert_eq!(reply, "Sorry about that, we're on it!");
    }

    #[test]
    fn reply_prompt_carries_analysis() {
        let a = analyzer("http://localhost:1");
        let request = GenerateRequest {
            text: "where is my order".into(),
            author: author(),
            analysis: MentionAnalysis {
                mention_type: MentionType::Question,
                sentiment: 0.1,
                intent: "asking_question".into(),
                urgency: "medium".into(),
                keywords: vec![],
                suggested_tone: "helpful".into(),
                raw_analysis: "{}".into(),
            },
            hint: Some("Mention the tracking page.".into()),
        };
        let chat = a.reply_request(&request);
        let prompt = &chat.messages[1].content;
        assert!(prompt.contains("Author: @carol"));
        assert!(prompt.contains("- Type: question"));
        assert!(prompt.contains("- Sentiment: 0.10"));
        assert!(prompt.contains("Mention the tracking page."));
        assert!(chat.response_format.is_none());
    }
}
