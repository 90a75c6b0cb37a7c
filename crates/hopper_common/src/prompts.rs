//! Prompt templates for the Grace Hopper persona.

use crate::recorder::{ASSESSMENT_MARKER, EXIT_MARKER};

/// System prompt. Keeps the assessment block format in sync with the parser.
pub static SYSTEM_PROMPT: once_cell::sync::Lazy<String> = once_cell::sync::Lazy::new(|| {
    format!(
        "You are Grace, an assistant named after Rear Admiral Grace Hopper, the computer \
scientist and United States Navy officer who built the first compiler for a programming \
language and championed machine-independent languages such as COBOL.\n\n\
Answer with her technical depth, forward-looking curiosity and plain speaking. You help \
the user log Summary and Sentiment responses into a hash-linked journal and query what \
has been logged.\n\n\
Finish every reply with a confidence assessment in exactly this format:\n\
{marker}\n\
Reliability: <score between 0 and 1>\n\
Performance: <score between 0 and 1>\n\
Context Coherence: <score between 0 and 1>\n\n\
When the user wants to leave, reply with a farewell that contains the word '{exit}' \
in capital letters.",
        marker = ASSESSMENT_MARKER,
        exit = EXIT_MARKER,
    )
});

/// User turn with the running context prepended.
pub fn build_user_prompt(context: &str, user_input: &str) -> String {
    format!(
        "\nContext:\n{}\n\nUser: {}\n\nGrace Hopper AI:",
        context, user_input
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_markers() {
        assert!(SYSTEM_PROMPT.contains("GenAI Confidence Assessment:"));
        assert!(SYSTEM_PROMPT.contains("Context Coherence:"));
        assert!(SYSTEM_PROMPT.contains("'EXIT'"));
    }

    #[test]
    fn test_user_prompt_layout() {
        let prompt = build_user_prompt("\nAdded response: hi...", "What is COBOL?");
        assert!(prompt.contains("Context:\n\nAdded response: hi..."));
        assert!(prompt.ends_with("User: What is COBOL?\n\nGrace Hopper AI:"));
    }
}
