// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder substitution for reply templates.
//!
//! Placeholders take the form `{{name}}`. A leading `.` and surrounding
//! whitespace are tolerated (`{{ .Username }}`), and names compare
//! case-insensitively with underscores ignored, so `display_name`,
//! `DisplayName` and `displayname` are the same variable.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ThreadlyError;
use crate::types::{Mention, MentionAnalysis};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid placeholder regex")
});

/// Values available to a template body.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateVariables {
    pub username: String,
    pub display_name: String,
    pub content: String,
    pub mention_type: String,
    pub sentiment: f64,
}

impl TemplateVariables {
    pub fn from_mention(mention: &Mention, analysis: &MentionAnalysis) -> Self {
        Self {
            username: mention.author.username.clone(),
            display_name: mention.author.display_name.clone(),
            content: mention.content.clone(),
            mention_type: analysis.mention_type.to_string(),
            sentiment: analysis.sentiment,
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match normalize(name).as_str() {
            "username" => Some(self.username.clone()),
            "displayname" => Some(self.display_name.clone()),
            "content" => Some(self.content.clone()),
            "mentiontype" => Some(self.mention_type.clone()),
            "sentiment" => Some(format!("{:.2}", self.sentiment)),
            _ => None,
        }
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Renders `body`, failing on unknown variables or stray braces.
pub fn render(body: &str, vars: &TemplateVariables) -> Result<String, ThreadlyError> {
    let mut out = String::with_capacity(body.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(body) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let literal = &body[last..whole.start()];
        check_literal(literal)?;
        out.push_str(literal);

        let value = vars.lookup(name.as_str()).ok_or_else(|| {
            ThreadlyError::InvalidState(format!("unknown template variable: {}", name.as_str()))
        })?;
        out.push_str(&value);
        last = whole.end();
    }

    let tail = &body[last..];
    check_literal(tail)?;
    out.push_str(tail);
    Ok(out)
}

fn check_literal(segment: &str) -> Result<(), ThreadlyError> {
    if segment.contains("{{") || segment.contains("}}") {
        return Err(ThreadlyError::InvalidState(format!(
            "malformed template placeholder near {segment:?}"
        )));
    }
    Ok(())
}

/// Lists the distinct variable names referenced by `body`, in order of first use.
pub fn extract_variables(body: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in PLACEHOLDER.captures_iter(body) {
        if let Some(name) = caps.get(1) {
            let name = name.as_str().to_string();
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vars() -> TemplateVariables {
        TemplateVariables {
            username: "alice".into(),
            display_name: "Alice A".into(),
            content: "my order is late".into(),
            mention_type: "complaint".into(),
            sentiment: -0.6,
        }
    }

    #[test]
    fn substitutes_all_known_variables() {
        let out = render(
            "Hi @{{username}} ({{display_name}}): {{mention_type}} {{sentiment}} / {{content}}",
            &vars(),
        )
        .unwrap();
        assert_eq!(
            out,
            "Hi @alice (Alice A): complaint -0.60 / my order is late"
        );
    }

    #[test]
    fn tolerates_dot_prefix_whitespace_and_case() {
        let out = render("{{ .Username }} / {{.DisplayName}}", &vars()).unwrap();
        assert_eq!(out, "alice / Alice A");
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let err = render("Hello {{nickname}}", &vars()).unwrap_err();
        assert!(err.to_string().contains("nickname"));
    }

    #[test]
    fn unclosed_placeholder_is_an_error() {
        assert!(render("Hello {{username", &vars()).is_err());
        assert!(render("Hello username}}", &vars()).is_err());
    }

    #[test]
    fn substituted_values_may_contain_braces() {
        let mut v = vars();
        v.content = "literal {{ braces }}".into();
        let out = render("> {{content}}", &v).unwrap();
        assert_eq!(out, "> literal {{ braces }}");
    }

    #[test]
    fn extracts_distinct_names_in_order() {
        assert_eq!(
            extract_variables("{{username}} {{ .Content }} {{username}}"),
            vec!["username".to_string(), "Content".to_string()]
        );
    }

    proptest! {
        #[test]
        fn brace_free_text_renders_verbatim(s in "[^{}]*") {
            prop_assert_eq!(render(&s, &vars()).unwrap(), s);
        }
    }
}
