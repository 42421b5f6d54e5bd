// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply composition: first matching template, else AI generation.

use std::sync::Arc;

use threadly_core::template::render;
use threadly_core::{
    AnalyzerAdapter, GenerateRequest, Mention, MentionAnalysis, Template, TemplateRepository,
    TemplateVariables, ThreadlyError,
};
use tracing::{debug, warn};

/// Reply text plus the template it came from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedReply {
    pub content: String,
    pub template_id: Option<String>,
}

/// Picks the first template whose conditions hold. `templates` must already
/// be in precedence order.
pub fn select_template<'a>(
    templates: &'a [Template],
    analysis: &MentionAnalysis,
) -> Option<&'a Template> {
    templates.iter().find(|t| t.matches_conditions(analysis))
}

pub struct ReplyComposer {
    templates: Arc<dyn TemplateRepository>,
    analyzer: Arc<dyn AnalyzerAdapter>,
}

impl ReplyComposer {
    pub fn new(templates: Arc<dyn TemplateRepository>, analyzer: Arc<dyn AnalyzerAdapter>) -> Self {
        Self {
            templates,
            analyzer,
        }
    }

    /// Composes reply text for `mention`.
    ///
    /// A template that fails to render falls through to generation. Errors
    /// come only from the template lookup or the generator.
    pub async fn compose(
        &self,
        mention: &Mention,
        analysis: &MentionAnalysis,
    ) -> Result<ComposedReply, ThreadlyError> {
        let templates = self
            .templates
            .list_active_templates(&mention.account_id, analysis.mention_type)
            .await?;

        if let Some(template) = select_template(&templates, analysis) {
            let vars = TemplateVariables::from_mention(mention, analysis);
            match render(&template.content, &vars) {
                Ok(content) => {
                    debug!(mention_id = %mention.id, template_id = %template.id, "reply rendered from template");
                    return Ok(ComposedReply {
                        content,
                        template_id: Some(template.id.clone()),
                    });
                }
                Err(e) => {
                    warn!(
                        mention_id = %mention.id,
                        template_id = %template.id,
                        error = %e,
                        "template render failed, falling back to generation"
                    );
                }
            }
        }

        let content = self
            .analyzer
            .generate_reply(GenerateRequest {
                text: mention.content.clone(),
                author: mention.author.clone(),
                analysis: analysis.clone(),
                hint: None,
            })
            .await?;
        debug!(mention_id = %mention.id, "reply generated");

        Ok(ComposedReply {
            content,
            template_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use threadly_core::{MentionAuthor, MentionType, TemplateConditions};
    use threadly_test_utils::{MemoryStore, MockAnalyzer, analysis};

    const ACCOUNT: &str = "acct-1";

    fn mention() -> Mention {
        Mention::new_pending(
            ACCOUNT,
            "post-1",
            MentionAuthor::new("u-1", "alice", Some("Alice".into()), false),
            "the app crashes on login",
            vec![],
            Utc::now(),
        )
    }

    fn threshold(t: f64) -> TemplateConditions {
        TemplateConditions {
            keywords: vec![],
            sentiment_threshold: Some(t),
        }
    }

    async fn setup(templates: Vec<Template>) -> (ReplyComposer, Arc<MockAnalyzer>) {
        let store = Arc::new(MemoryStore::new());
        for t in &templates {
            store.create_template(t).await.unwrap();
        }
        let analyzer = Arc::new(MockAnalyzer::new());
        (ReplyComposer::new(store, analyzer.clone()), analyzer)
    }

    fn a_and_b() -> (Template, Template) {
        let a = Template::new(ACCOUNT, "A", MentionType::Complaint, "Sorry @{{username}}!")
            .with_priority(1)
            .with_conditions(threshold(0.0));
        let b = Template::new(ACCOUNT, "B", MentionType::Complaint, "Hi {{display_name}}")
            .with_priority(2);
        (a, b)
    }

    #[test]
    fn threshold_decides_between_a_and_b() {
        let (a, b) = a_and_b();
        let templates = vec![a.clone(), b.clone()];

        let positive = analysis(MentionType::Complaint, 0.5);
        assert_eq!(select_template(&templates, &positive).map(|t| &t.id), Some(&b.id));

        let negative = analysis(MentionType::Complaint, -0.5);
        assert_eq!(select_template(&templates, &negative).map(|t| &t.id), Some(&a.id));
    }

    #[tokio::test]
    async fn renders_the_selected_template() {
        let (a, b) = a_and_b();
        let (composer, analyzer) = setup(vec![b, a.clone()]).await;

        let reply = composer
            .compose(&mention(), &analysis(MentionType::Complaint, -0.5))
            .await
            .unwrap();
        assert_eq!(reply.content, "Sorry @alice!");
        assert_eq!(reply.template_id, Some(a.id));
        assert_eq!(analyzer.generate_calls(), 0);
    }

    #[tokio::test]
    async fn other_types_and_inactive_templates_are_ignored() {
        let question = Template::new(ACCOUNT, "Q", MentionType::Question, "Q!");
        let inactive = Template::new(ACCOUNT, "I", MentionType::Complaint, "I!").inactive();
        let (composer, analyzer) = setup(vec![question, inactive]).await;

        let reply = composer
            .compose(&mention(), &analysis(MentionType::Complaint, -0.5))
            .await
            .unwrap();
        assert_eq!(reply.template_id, None);
        assert_eq!(analyzer.generate_calls(), 1);
    }

    #[tokio::test]
    async fn broken_template_falls_back_to_generation() {
        let broken = Template::new(ACCOUNT, "X", MentionType::Complaint, "Hi {{nickname}}");
        let (composer, analyzer) = setup(vec![broken]).await;
        analyzer.push_reply("We're looking into it.");

        let reply = composer
            .compose(&mention(), &analysis(MentionType::Complaint, -0.5))
            .await
            .unwrap();
        assert_eq!(reply.content, "We're looking into it.");
        assert_eq!(reply.template_id, None);

        let requests = analyzer.generate_requests();
        assert_eq!(requests[0].hint, None);
        assert_eq!(requests[0].author.username, "alice");
    }

    #[tokio::test]
    async fn generation_failure_is_returned() {
        let (composer, analyzer) = setup(vec![]).await;
        analyzer.push_reply_error("model unavailable");
        let err = composer
            .compose(&mention(), &analysis(MentionType::Neutral, 0.0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model unavailable"));
    }
}
