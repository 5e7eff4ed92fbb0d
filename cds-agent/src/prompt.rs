//! Prompt construction: system contracts, context formatting, and the
//! bounded history window.

use cds_core::{ChatMessage, ModelMessage, Role};
use cds_rag::RetrievalResult;

/// Number of prior session messages included in a generation prompt.
pub const HISTORY_WINDOW: usize = 20;

/// Rendered in place of retrieved passages when the result set is empty.
const NO_CONTEXT_LINE: &str = "No relevant guideline passages were retrieved.";

/// The behavioral contract for conversational Q&A.
pub const CHAT_SYSTEM_PROMPT: &str = r#"You are an NG12 Clinical Knowledge Assistant. Your sole purpose is to
answer questions about the NICE NG12 guidelines ("Suspected cancer: recognition and referral")
using ONLY the retrieved guideline passages provided below.

## CRITICAL OUTPUT RULES:
- Your ENTIRE response must be a single valid JSON object. No text before or after the JSON.
- Do NOT repeat the retrieved passages verbatim. SYNTHESIZE and SUMMARIZE the information
  in your own words, organized clearly for the reader.
- When the user asks to "summarize", provide a concise, well-structured summary with
  key points — do NOT copy-paste the raw guideline text.

## Handling Greetings & Non-Clinical Messages:
If the user sends a greeting or non-clinical message, respond with:
{"answer": "Hi there! I'm the NG12 Clinical Knowledge Assistant. I can help you with questions about the NICE NG12 guidelines on suspected cancer recognition and referral.", "citations": []}

## Strict Rules:
1. ONLY use information from the RETRIEVED CONTEXT below. Never use your own knowledge.
2. ALWAYS include citations for every clinical statement — use the chunk_id, page number,
   and a short excerpt (1-2 sentences max) from the retrieved passage.
3. NEVER invent or guess:
   - Age thresholds (e.g., "refer if over 40") unless the retrieved text explicitly states them.
   - Investigation intervals or timelines not found in the retrieved text.
   - Referral criteria not present in the retrieved text.
4. NEVER reference documents other than NG12.
5. If the retrieved context does not contain enough information to answer the question,
   you MUST say: "I couldn't find clear support in the NG12 guidelines for that question."
   and return an empty citations list.
6. When the user asks a follow-up, use the conversation history for context but still
   ground your answer in the retrieved guideline passages.

## Output Format:
Respond with ONLY this JSON (no markdown, no extra text):
{
  "answer": "<your synthesized, well-structured answer — NOT a verbatim copy of the passages>",
  "citations": [
    {
      "source": "NG12 PDF",
      "page": <page number>,
      "chunk_id": "<chunk identifier>",
      "excerpt": "<1-2 sentence excerpt from the guideline>"
    }
  ]
}"#;

/// The canned reply for greetings; retrieval and generation are skipped.
pub const GREETING_RESPONSE: &str = "Hi there! I'm the NG12 Clinical Knowledge Assistant. I can help you with \
questions about the NICE NG12 guidelines on suspected cancer recognition \
and referral. Feel free to ask about symptoms, referral criteria, \
investigations, or any topic covered by the guidelines.";

/// The fixed reply when retrieved evidence is too weak to ground an answer.
pub const LOW_EVIDENCE_ANSWER: &str = "I couldn't find support in the NG12 text for that question. \
The retrieved guideline passages did not contain relevant information. \
Please try rephrasing your question or ask about specific cancer types, \
symptoms, or referral criteria covered by the NG12 guidelines.";

/// Render retrieved passages for inclusion in the prompt, each with its id,
/// page, and distance marker.
pub fn format_context(results: &[RetrievalResult]) -> String {
    if results.is_empty() {
        return NO_CONTEXT_LINE.to_string();
    }
    results
        .iter()
        .map(|r| {
            format!(
                "[Chunk {} | Page {} | Distance {:.3}]\n{}",
                r.chunk_id, r.page, r.distance, r.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// The windowed slice of prior turns for a prompt: everything except the
/// just-appended current user message, capped to the most recent
/// [`HISTORY_WINDOW`] messages.
pub fn history_window(history: &[ChatMessage]) -> &[ChatMessage] {
    let prior = &history[..history.len().saturating_sub(1)];
    let start = prior.len().saturating_sub(HISTORY_WINDOW);
    &prior[start..]
}

/// Assemble the full message sequence for one conversational turn.
pub fn build_chat_messages(
    history: &[ChatMessage],
    results: &[RetrievalResult],
    question: &str,
) -> Vec<ModelMessage> {
    let mut messages = vec![ModelMessage::system(CHAT_SYSTEM_PROMPT)];

    for message in history_window(history) {
        messages.push(match message.role {
            Role::User => ModelMessage::user(&message.content),
            Role::Assistant => ModelMessage::assistant(&message.content),
        });
    }

    messages.push(ModelMessage::user(format!(
        "RETRIEVED CONTEXT:\n{}\n\nUSER QUESTION:\n{question}",
        format_context(results)
    )));

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, page: u32, distance: f32) -> RetrievalResult {
        RetrievalResult {
            chunk_id: id.to_string(),
            page,
            text: format!("passage {id}"),
            distance,
        }
    }

    #[test]
    fn context_renders_id_page_and_distance() {
        let rendered = format_context(&[result("ng12_p004_c0002", 4, 0.8121)]);
        assert!(rendered.starts_with("[Chunk ng12_p004_c0002 | Page 4 | Distance 0.812]"));
        assert!(rendered.contains("passage ng12_p004_c0002"));
    }

    #[test]
    fn empty_context_renders_fixed_line() {
        assert_eq!(format_context(&[]), "No relevant guideline passages were retrieved.");
    }

    #[test]
    fn window_excludes_current_message_and_caps_at_twenty() {
        let history: Vec<ChatMessage> =
            (0..25).map(|i| ChatMessage::user(format!("turn {i}"))).collect();
        let window = history_window(&history);
        assert_eq!(window.len(), HISTORY_WINDOW);
        assert_eq!(window.first().unwrap().content, "turn 4");
        assert_eq!(window.last().unwrap().content, "turn 23");
    }

    #[test]
    fn prompt_ends_with_context_and_question() {
        let history = vec![ChatMessage::user("breast lump referral?")];
        let messages = build_chat_messages(&history, &[result("c1", 2, 0.9)], "breast lump referral?");
        assert_eq!(messages.len(), 2, "system + final user turn, no prior history");
        let last = &messages.last().unwrap().content;
        assert!(last.starts_with("RETRIEVED CONTEXT:"));
        assert!(last.ends_with("USER QUESTION:\nbreast lump referral?"));
    }
}
