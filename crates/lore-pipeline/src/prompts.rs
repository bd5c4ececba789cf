//! Prompt templates for answer generation.
//!
//! Templates are structural: each pairs retrieved context with the user's
//! question and steers the response shape for its intent. The exact wording
//! carries no behavioral guarantees.

use lore_core::IntentCategory;

const OVERVIEW_TEMPLATE: &str = "Using only the indexed content below, write a \
structured overview answering the question. Organize by topic and mention \
which areas the content covers.\n\nContent:\n{context}\n\nQuestion: \
{question}\n\nOverview:";

const HOWTO_TEMPLATE: &str = "Using only the indexed content below, answer the \
question with clear numbered steps. If prerequisites appear in the content, \
list them first.\n\nContent:\n{context}\n\nQuestion: {question}\n\nSteps:";

const COMPARISON_TEMPLATE: &str = "Using only the indexed content below, \
compare the alternatives the question asks about. Cover similarities, \
differences, and trade-offs present in the content.\n\nContent:\n{context}\n\n\
Question: {question}\n\nComparison:";

const FACTUAL_TEMPLATE: &str = "Using only the indexed content below, answer \
the question concisely and directly. If the content does not state the \
answer, say so.\n\nContent:\n{context}\n\nQuestion: {question}\n\nAnswer:";

const AGGREGATION_TEMPLATE: &str = "The following are summaries of documents \
in a collection. Using only these summaries, write a structured answer to \
the question, describing what the collection covers.\n\nSummaries:\n{context}\n\n\
Question: {question}\n\nAnswer:";

/// Render the intent-specific answer prompt.
pub fn answer_prompt(intent: IntentCategory, context: &str, question: &str) -> String {
    let template = match intent {
        IntentCategory::Overview => OVERVIEW_TEMPLATE,
        IntentCategory::HowTo => HOWTO_TEMPLATE,
        IntentCategory::Comparison => COMPARISON_TEMPLATE,
        IntentCategory::Factual => FACTUAL_TEMPLATE,
    };
    render(template, context, question)
}

/// Render the summary-aggregation prompt used by the overview fast path.
pub fn aggregation_prompt(summary_block: &str, question: &str) -> String {
    render(AGGREGATION_TEMPLATE, summary_block, question)
}

fn render(template: &str, context: &str, question: &str) -> String {
    template
        .replace("{context}", context)
        .replace("{question}", question)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_render_both_slots() {
        for intent in IntentCategory::ALL {
            let prompt = answer_prompt(intent, "CTX-MARKER", "Q-MARKER");
            assert!(prompt.contains("CTX-MARKER"), "{intent} missing context");
            assert!(prompt.contains("Q-MARKER"), "{intent} missing question");
            assert!(!prompt.contains("{context}"));
            assert!(!prompt.contains("{question}"));
        }
    }

    #[test]
    fn test_aggregation_prompt_renders() {
        let prompt = aggregation_prompt("SUMMARIES", "what is covered?");
        assert!(prompt.contains("SUMMARIES"));
        assert!(prompt.contains("what is covered?"));
    }

    #[test]
    fn test_templates_differ_by_intent() {
        let overview = answer_prompt(IntentCategory::Overview, "c", "q");
        let howto = answer_prompt(IntentCategory::HowTo, "c", "q");
        assert_ne!(overview, howto);
    }
}
