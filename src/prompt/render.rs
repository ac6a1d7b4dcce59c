//! Prompt Builder - render the rewrite instruction with Handlebars
//!
//! The template is fixed; only the request's constraints, the original text,
//! the length threshold and the version number are substituted. The version
//! number appears in the closing line only, so every attempt of one version
//! sends a byte-identical prompt.

use handlebars::Handlebars;
use serde::Serialize;

use crate::domain::RewriteRequest;
use crate::error::{Result, RewriteError};

/// Placeholder for an empty keyword list or empty required content
pub const NONE_MARKER: &str = "(none)";

const REWRITE_TEMPLATE: &str = r#"Rewrite the article below.

Required keywords:
{{keyword_block}}

Required content:
{{required_block}}
{{#if additional_instructions}}

Additional instructions:
{{additional_instructions}}
{{/if}}
{{#if image_count}}

{{image_count}} reference image(s) are attached. Analyse each image and weave what it shows naturally into the text.
{{/if}}

Original article:
{{original_text}}

Rewriting guidelines:
1. Length: write at least {{min_chars}} characters, not counting whitespace. Shorter output will be rejected.
2. Include every required keyword above naturally.
3. Cover the required content in full.
4. If images are attached, describe what they show and relate it to the text.
5. Paragraph layout:
   - Separate paragraphs with one blank line
   - Keep each paragraph to two or three sentences
   - Use two blank lines when the topic changes
   - Use subheadings, with one blank line above and below each
   - Put long sentences and enumerations in their own paragraphs
6. Talking to the reader:
   - Use inclusive words such as "you", "we" and "together"
   - Ask the occasional question
   - Write so the reader feels understood, as if in conversation
   - Avoid stiff, formal closing phrases
7. SEO:
   - Main keywords: 1-2
   - Sub keywords: 2-3
   - Place the required keywords near the start of paragraphs
   - Use clear sentence structures that search engines parse easily
   - Keep keyword density around 2-3% of the text
8. Content:
   - Present objective facts and data
   - Include concrete examples or cases
   - Give the reader something actionable
   - Keep the overall flow natural
9. Style by source type:
   - Blogs and communities: shared experience and empathy
   - Social media and trends: current trends and public reaction
   - Experts and reviews: professional analysis and practical advice
   - Academic, government and news: objective, data-driven narration
10. Originality:
   - No three consecutive sentences may be more than 50% similar to the original
   - Keep at least 90% of the core keywords
   - Stay expert while keeping a friendly tone

Example layout:
[Subheading]

The first paragraph. A following sentence on the same point continues here.

The second paragraph starts after one blank line. New points are separated like this.


[Next subheading]

The first paragraph of the new section...

Rewrite this as version {{version_index}} in its own distinct style. Follow the layout example above exactly, keep the tone expert yet friendly and relaxed, and observe every guideline above."#;

#[derive(Serialize)]
struct PromptContext<'a> {
    keyword_block: String,
    required_block: &'a str,
    additional_instructions: Option<&'a str>,
    image_count: Option<usize>,
    original_text: &'a str,
    min_chars: usize,
    version_index: u32,
}

/// Renders the generation instruction for one version of a request
pub struct PromptBuilder {
    handlebars: Handlebars<'static>,
    min_chars: usize,
}

impl PromptBuilder {
    /// `min_chars` is stated in the prompt in the same unit the acceptance
    /// loop checks: characters excluding whitespace
    pub fn new(min_chars: usize) -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars, min_chars }
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// Render the prompt. Same inputs always give the same text.
    pub fn build(&self, request: &RewriteRequest, version_index: u32) -> Result<String> {
        let context = PromptContext {
            keyword_block: keyword_block(request.keywords()),
            required_block: required_block(request.required_content()),
            additional_instructions: request.additional_instructions(),
            image_count: match request.images().len() {
                0 => None,
                n => Some(n),
            },
            original_text: request.original_text(),
            min_chars: self.min_chars,
            version_index,
        };

        self.handlebars
            .render_template(REWRITE_TEMPLATE, &context)
            .map_err(|e| RewriteError::Prompt(format!("Failed to render template: {}", e)))
    }
}

/// One `- keyword` line per keyword, or the none marker
pub fn keyword_block(keywords: &[String]) -> String {
    if keywords.is_empty() {
        NONE_MARKER.to_string()
    } else {
        keywords
            .iter()
            .map(|k| format!("- {}", k))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn required_block(content: &str) -> &str {
    if content.trim().is_empty() { NONE_MARKER } else { content }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImageAttachment;

    fn request() -> RewriteRequest {
        RewriteRequest::new("Solar panels convert sunlight into electricity.").unwrap()
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::new(1500);
        let req = request().with_keywords(["solar"]);
        assert_eq!(builder.build(&req, 1).unwrap(), builder.build(&req, 1).unwrap());
    }

    #[test]
    fn test_empty_constraints_use_none_marker() {
        let prompt = PromptBuilder::new(1500).build(&request(), 1).unwrap();
        assert!(prompt.contains("Required keywords:\n(none)"));
        assert!(prompt.contains("Required content:\n(none)"));
    }

    #[test]
    fn test_keywords_rendered_as_list() {
        let req = request().with_keywords(["solar", "grid parity"]);
        let prompt = PromptBuilder::new(1500).build(&req, 1).unwrap();
        assert!(prompt.contains("Required keywords:\n- solar\n- grid parity"));
    }

    #[test]
    fn test_keywords_only_change_keyword_block() {
        let builder = PromptBuilder::new(1500);
        let a = request().with_keywords(["solar"]);
        let b = request().with_keywords(["wind", "storage"]);

        let prompt_a = builder.build(&a, 2).unwrap();
        let prompt_b = builder.build(&b, 2).unwrap();

        assert_ne!(prompt_a, prompt_b);
        let swapped = prompt_a.replacen(&keyword_block(a.keywords()), &keyword_block(b.keywords()), 1);
        assert_eq!(swapped, prompt_b);
    }

    #[test]
    fn test_version_index_only_changes_closing_line() {
        let builder = PromptBuilder::new(1500);
        let v1 = builder.build(&request(), 1).unwrap();
        let v2 = builder.build(&request(), 2).unwrap();

        assert!(v1.contains("Rewrite this as version 1 in its own distinct style"));
        assert!(v2.contains("Rewrite this as version 2 in its own distinct style"));
        assert_eq!(v1.replace("as version 1 ", "as version 2 "), v2);
    }

    #[test]
    fn test_additional_instructions_only_when_present() {
        let builder = PromptBuilder::new(1500);
        let without = builder.build(&request(), 1).unwrap();
        assert!(!without.contains("Additional instructions:"));

        let with = builder
            .build(&request().with_additional_instructions("Mention local subsidies"), 1)
            .unwrap();
        assert!(with.contains("Additional instructions:\nMention local subsidies"));
    }

    #[test]
    fn test_image_notice_only_when_images_present() {
        let builder = PromptBuilder::new(1500);
        assert!(!builder.build(&request(), 1).unwrap().contains("reference image(s)"));

        let image = ImageAttachment::new("image/png", vec![0u8; 4]).unwrap();
        let req = request().with_images(vec![image.clone(), image]);
        let prompt = builder.build(&req, 1).unwrap();
        assert!(prompt.contains("2 reference image(s) are attached"));
    }

    #[test]
    fn test_original_text_verbatim_and_unescaped() {
        let original = "Costs <fell> by \"40%\" & more";
        let req = RewriteRequest::new(original).unwrap();
        let prompt = PromptBuilder::new(1500).build(&req, 1).unwrap();
        assert!(prompt.contains(original));
    }

    #[test]
    fn test_threshold_stated_in_prompt() {
        let prompt = PromptBuilder::new(1234).build(&request(), 1).unwrap();
        assert!(prompt.contains("at least 1234 characters, not counting whitespace"));
    }

    #[test]
    fn test_required_content_rendered() {
        let req = request().with_required_content("Installation costs in 2024");
        let prompt = PromptBuilder::new(1500).build(&req, 1).unwrap();
        assert!(prompt.contains("Required content:\nInstallation costs in 2024"));
    }
}
