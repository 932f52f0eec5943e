/*!
 * Prompt construction for batch string translation.
 *
 * One prompt carries a whole batch: a role line, optional game context, the
 * glossary, style and technical rules, a few examples, then the batch as a
 * JSON array between fixed section headers.
 */

use serde::{Deserialize, Serialize};

use crate::records::Glossary;

/// Header that opens the input section
pub const INPUT_HEADER: &str = "## INPUT DATA";

/// Header that closes the prompt
pub const OUTPUT_HEADER: &str = "## JSON OUTPUT";

/// One protected record as the model sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEntry {
    /// Record index
    pub index: u64,
    /// Protected text
    pub text: String,
}

/// Template for the instruction part of the prompt
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Default instructions for game string translation
    pub const GAME_TRANSLATOR: &'static str = r#"You are a veteran game localizer acting as a JSON API. Translate every string from {source_language} to {target_language}, keeping the tone and terminology of the game.

## GAME CONTEXT
{game_context}

## GLOSSARY (follow strictly)
{glossary}

## STYLE RULES
1. Use natural, idiomatic {target_language} suited to the setting of the game.
2. Adapt forms of address to the speaker and listener where the context makes them clear.
3. Keep the register consistent across the batch; avoid modern slang unless the source uses it.

## TECHNICAL RULES (mistakes break the game)
1. Never translate or alter tokens such as `__PROTECTED_0__` or `__PROTECTED_1__`. Keep them exactly as written.
2. Return ONLY a valid JSON array. Each object must be `{"index": <number>, "translation": "<text>"}`. Return exactly {count} objects. No explanations, no markdown.
3. Preserve all leading and trailing whitespace and line breaks (\n) of each string.
4. Never translate or alter anything that looks like a variable, tag, path or other technical marker.

## EXAMPLES
INPUT: {"index": 999, "text": "You have broken through to the next realm."}
OUTPUT: {"index": 999, "translation": "<the sentence in {target_language}>"}
INPUT: {"index": 998, "text": "Fellow traveler, this __PROTECTED_0__ is a rare treasure."}
OUTPUT: {"index": 998, "translation": "<the sentence in {target_language}, keeping __PROTECTED_0__>"}"#;

    /// Create a new prompt template
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Render the template
    pub fn render(
        &self,
        source_language: &str,
        target_language: &str,
        game_context: &str,
        glossary: &str,
        count: usize,
    ) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
            .replace("{game_context}", game_context)
            .replace("{glossary}", glossary)
            .replace("{count}", &count.to_string())
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(Self::GAME_TRANSLATOR)
    }
}

/// Builds the prompt for one batch
#[derive(Debug, Clone)]
pub struct BatchPromptBuilder {
    source_language: String,
    target_language: String,
    game_context: Option<String>,
    template: PromptTemplate,
}

impl BatchPromptBuilder {
    /// Create a builder for a language pair
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            game_context: None,
            template: PromptTemplate::default(),
        }
    }

    /// Describe the game being translated
    pub fn with_game_context(mut self, context: Option<&str>) -> Self {
        self.game_context = context.filter(|c| !c.trim().is_empty()).map(str::to_string);
        self
    }

    /// Use a custom template
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Build the full prompt for the given entries
    pub fn build(&self, entries: &[PromptEntry], glossary: &Glossary) -> String {
        let glossary_block = if glossary.is_empty() {
            "No glossary terms provided.".to_string()
        } else {
            glossary
                .terms()
                .iter()
                .map(|(source, target)| format!("- {}: {}", source, target))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let context = self.game_context.as_deref().unwrap_or("No additional context provided.");

        let instructions = self.template.render(
            &self.source_language,
            &self.target_language,
            context,
            &glossary_block,
            entries.len(),
        );

        // Serializing plain strings and integers cannot fail
        let input = serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string());

        format!("{}\n\n{}\n{}\n\n{}\n", instructions, INPUT_HEADER, input, OUTPUT_HEADER)
    }
}

/// Recover the input entries from a prompt built by [`BatchPromptBuilder`]
pub fn extract_entries(prompt: &str) -> Option<Vec<PromptEntry>> {
    let start = prompt.rfind(INPUT_HEADER)? + INPUT_HEADER.len();
    let end = prompt.rfind(OUTPUT_HEADER)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(prompt[start..end].trim()).ok()
}
