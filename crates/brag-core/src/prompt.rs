//! Prompt construction.
//!
//! Wording is replaceable through [`PromptBuilder`]; the merger only relies on
//! the combined text and tone being embedded verbatim.

/// Builds the prompts sent to the summarization backend.
pub trait PromptBuilder: Send + Sync {
    /// First-pass prompt over a chunk of raw items.
    fn batch_prompt(&self, items: &[String], tone: &str) -> String;

    /// Prompt asking for one cohesive summary of already-summarized sections.
    fn merge_prompt(&self, combined: &str, tone: &str) -> String;

    /// Prompt asking for the single most impactful accomplishment in a section.
    fn section_prompt(&self, section: &str) -> String;
}

/// Brag-sheet prompts for performance reviews.
#[derive(Debug, Default, Clone)]
pub struct DefaultPrompts;

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

impl PromptBuilder for DefaultPrompts {
    fn batch_prompt(&self, items: &[String], tone: &str) -> String {
        format!(
            "Rewrite the following raw accomplishment notes in a {tone} tone, \
             suitable for a performance review or LinkedIn bullet points.\n\n\
             Raw notes:\n{}\n\nPolished Output:\n",
            numbered(items)
        )
    }

    fn merge_prompt(&self, combined: &str, tone: &str) -> String {
        format!(
            "You are an expert technical resume reviewer and writer.\n\n\
             Combine the following brag sheet sections into a single cohesive summary.\n\n\
             Sections to merge:\n{combined}\n\n\
             Instructions:\n\
             - Maintain a {tone} tone\n\
             - Use clear, assertive writing\n\
             - Preserve structure where it is logical\n"
        )
    }

    fn section_prompt(&self, section: &str) -> String {
        format!(
            "You are a technical resume reviewer for Staff and Tech Lead roles.\n\n\
             Identify the single most impactful technical accomplishment in this section.\n\n\
             Input section:\n{section}\n\n\
             Output requirements:\n\
             - 1-2 sentences\n\
             - Specific and factual; include measurable results if available\n\
             - Do not invent or exaggerate details\n\
             - If there is no clear accomplishment, reply \"No clear technical accomplishments found in the input\"\n"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_prompt_numbers_items_in_order() {
        let prompt = DefaultPrompts.batch_prompt(
            &["Shipped search".to_string(), "Mentored two engineers".to_string()],
            "Confident",
        );

        assert!(prompt.contains("in a Confident tone"));
        let first = prompt.find("1. Shipped search").unwrap();
        let second = prompt.find("2. Mentored two engineers").unwrap();
        assert!(first < second);
    }

    #[test]
    fn merge_prompt_embeds_text_and_tone() {
        let prompt = DefaultPrompts.merge_prompt("Section A\n\nSection B", "Professional");

        assert!(prompt.contains("Section A\n\nSection B"));
        assert!(prompt.contains("Maintain a Professional tone"));
    }

    #[test]
    fn section_prompt_embeds_section() {
        let prompt = DefaultPrompts.section_prompt("Led the billing migration");
        assert!(prompt.contains("Led the billing migration"));
    }
}
