//! # Text Cleanup Prompts
//!
//! Prompt material for turning raw partition output (OCR noise, split sentences,
//! mangled formulas) into clean study text.

use crate::providers::ai::ChatMessage;

/// The system prompt used to instruct the LLM to clean extracted document text.
pub const CLEANUP_SYSTEM_PROMPT: &str = r#"You are a text cleanup assistant for study materials that were extracted from uploaded documents with OCR and layout analysis. Rewrite the text you are given so that it is clean and readable while following these rules:
1. Fix OCR errors such as misread characters, broken words, and stray hyphenation.
2. Reconstruct sentences that were fragmented across lines, columns, or pages.
3. Normalize mathematical and chemical notation into a consistent plain-text form (for example x^2, H2O, sqrt(x), ->).
4. Remove noise characters, page artifacts, repeated headers, and decorative symbols.
5. Preserve the original meaning, terminology, facts, and ordering of the content. Do not summarize or omit information.
6. Output only the cleaned text. Do not add commentary, explanations, headings, or notes of your own."#;

/// Garbled input paired with the cleaned output the model should produce.
pub const CLEANUP_FEW_SHOT_EXAMPLES: [(&str, &str); 3] = [
    (
        "Th e mitochon- dria is the p0wer house of the ce ll . It pro duces A TP thr ough cellular resp iration.",
        "The mitochondria is the powerhouse of the cell. It produces ATP through cellular respiration.",
    ),
    (
        "The quadratic formu la is x = -b ± √ b 2 - 4ac / 2a wh ere a ≠ 0 | | Page 3 | |",
        "The quadratic formula is x = (-b ± sqrt(b^2 - 4ac)) / (2a), where a ≠ 0.",
    ),
    (
        "Photosynthesis: 6C O 2 + 6H 2 O → C 6 H 12 O 6 + 6O 2 ••• Chlorophyll ab- sorbs light ~~ energy",
        "Photosynthesis: 6CO2 + 6H2O -> C6H12O6 + 6O2. Chlorophyll absorbs light energy.",
    ),
];

/// Builds the ordered conversation: the few-shot pairs as alternating
/// user/assistant turns, then the raw text as the final user turn.
pub fn build_cleanup_messages(raw_text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(CLEANUP_FEW_SHOT_EXAMPLES.len() * 2 + 1);
    for (garbled, cleaned) in CLEANUP_FEW_SHOT_EXAMPLES {
        messages.push(ChatMessage::user(garbled));
        messages.push(ChatMessage::assistant(cleaned));
    }
    messages.push(ChatMessage::user(raw_text));
    messages
}
