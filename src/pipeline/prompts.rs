//! Prompt templates for the three generation calls the pipeline issues.

/// Stage-one prompt: reduce one chunk to a short factual bullet list.
pub(crate) fn chunk_prompt(chunk_text: &str) -> String {
    format!(
        "Extract the key points from this document as brief bullet points.\n\
         Be concise and factual. Use 3-5 bullet points maximum.\n\n\
         Content:\n{chunk_text}\n\nKey Points:\n•"
    )
}

/// Single-pass prompt for documents short enough to skip chunking.
pub(crate) fn single_pass_prompt(text: &str) -> String {
    format!(
        "You are a summarization assistant. Create a concise summary of this document.\n\n\
         Focus on:\n\
         - Key concepts and definitions\n\
         - Main arguments or ideas\n\
         - Important facts\n\n\
         Document:\n{text}\n\nSummary:"
    )
}

/// Stage-two prompt: synthesize the per-chunk bullets into one coherent summary.
pub(crate) fn merge_prompt(combined_bullets: &str) -> String {
    format!(
        "You are a summarization assistant. Below are key points extracted from different \
         sections of a document.\n\
         Synthesize these into a clear, coherent summary. Remove any redundancy and organize \
         logically.\n\n\
         Key Points from Document:\n{combined_bullets}\n\nFinal Summary:"
    )
}
