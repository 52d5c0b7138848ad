//! Map and reduce stages of the summarization pipeline.
//!
//! Stage one reduces each chunk to a short bullet list, fanning out over a bounded
//! worker pool for larger documents while keeping results in document order. Stage
//! two synthesizes the ordered bullets into one summary, degrading to the raw
//! bullets when the merge call times out.

use super::prompts;
use super::types::{Chunk, SegmentSummary, SummaryError, SummaryOptions};
use crate::llm::{GenerationRequest, LlmBackend};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const CHUNK_TEMPERATURE: f32 = 0.1;
const SINGLE_PASS_TEMPERATURE: f32 = 0.15;
const MERGE_TEMPERATURE: f32 = 0.2;
const TOP_P: f32 = 0.9;
const CHUNK_MAX_TOKENS: u32 = 512;
const FINAL_MAX_TOKENS: u32 = 1024;

/// Chunk counts at or below this run sequentially; dispatch overhead is not worth it.
const SEQUENTIAL_CHUNK_LIMIT: usize = 2;

/// Header prefixed to the combined bullets when the merge call times out.
pub(crate) const FALLBACK_HEADER: &str = "Key Points:";

/// Result of the merge stage.
#[derive(Debug)]
pub(crate) struct MergeOutcome {
    pub(crate) text: String,
    /// True when the merge timed out and `text` holds the combined bullets.
    pub(crate) degraded: bool,
}

/// Summarize one chunk into a bullet list.
///
/// Never fails: backend errors are absorbed into a sentinel naming the chunk, so a
/// single bad chunk cannot abort the pipeline. The result always starts with a
/// bullet marker.
pub(crate) async fn summarize_chunk(
    backend: &dyn LlmBackend,
    chunk: &Chunk,
    options: &SummaryOptions,
) -> SegmentSummary {
    let request = GenerationRequest {
        model: options.model.clone(),
        prompt: prompts::chunk_prompt(&chunk.text),
        temperature: CHUNK_TEMPERATURE,
        top_p: TOP_P,
        max_tokens: CHUNK_MAX_TOKENS,
        timeout: options.chunk_timeout,
    };

    match backend.generate(request).await {
        Ok(text) => SegmentSummary {
            index: chunk.index,
            text: ensure_bullet(text),
            failed: false,
        },
        Err(error) => {
            tracing::warn!(
                chunk = chunk.index,
                error = %error,
                "Chunk summarization failed; recording sentinel"
            );
            let reason: String = error.to_string().chars().take(50).collect();
            SegmentSummary {
                index: chunk.index,
                text: failure_sentinel(chunk.index, &reason),
                failed: true,
            }
        }
    }
}

/// Summarize every chunk, preserving document order in the output.
///
/// Output length always equals input length and `output[i]` belongs to `chunks[i]`
/// regardless of completion order: concurrent workers write into index-addressed
/// slots rather than a shared list. Two or fewer chunks run sequentially; larger
/// documents fan out under a semaphore-bounded worker pool.
pub(crate) async fn summarize_all(
    backend: &Arc<dyn LlmBackend>,
    chunks: &[Chunk],
    options: &SummaryOptions,
) -> Vec<SegmentSummary> {
    if chunks.len() <= SEQUENTIAL_CHUNK_LIMIT {
        let mut summaries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            summaries.push(summarize_chunk(backend.as_ref(), chunk, options).await);
        }
        return summaries;
    }

    let permits = Arc::new(Semaphore::new(options.workers.max(1)));
    let mut tasks = JoinSet::new();
    for chunk in chunks.iter().cloned() {
        let backend = Arc::clone(backend);
        let permits = Arc::clone(&permits);
        let options = options.clone();
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .expect("summary worker semaphore closed");
            summarize_chunk(backend.as_ref(), &chunk, &options).await
        });
    }

    let mut slots: Vec<Option<SegmentSummary>> = Vec::new();
    slots.resize_with(chunks.len(), || None);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(summary) => {
                let index = summary.index;
                slots[index] = Some(summary);
            }
            Err(error) => {
                tracing::warn!(error = %error, "Chunk summarization task aborted");
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| SegmentSummary {
                index,
                text: failure_sentinel(index, "task aborted"),
                failed: true,
            })
        })
        .collect()
}

/// Merge the ordered segment summaries into one final summary.
///
/// A timeout degrades to the combined bullets under [`FALLBACK_HEADER`], preserving
/// partial value. Any other backend error is fatal to this stage.
pub(crate) async fn merge_summaries(
    backend: &dyn LlmBackend,
    summaries: &[SegmentSummary],
    options: &SummaryOptions,
) -> Result<MergeOutcome, SummaryError> {
    let combined = summaries
        .iter()
        .map(|summary| summary.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let request = GenerationRequest {
        model: options.model.clone(),
        prompt: prompts::merge_prompt(&combined),
        temperature: MERGE_TEMPERATURE,
        top_p: TOP_P,
        max_tokens: FINAL_MAX_TOKENS,
        timeout: options.merge_timeout,
    };

    match backend.generate(request).await {
        Ok(text) => Ok(MergeOutcome {
            text,
            degraded: false,
        }),
        Err(error) if error.is_timeout() => {
            tracing::warn!(error = %error, "Merge timed out; returning combined chunk bullets");
            Ok(MergeOutcome {
                text: format!("{FALLBACK_HEADER}\n{combined}"),
                degraded: true,
            })
        }
        Err(error) => Err(SummaryError::Synthesis(error)),
    }
}

/// Summarize a short document in one backend call, skipping chunking.
///
/// Unlike the merge stage there is no partial value to fall back on, so timeouts
/// propagate as synthesis failures here.
pub(crate) async fn single_pass_summary(
    backend: &dyn LlmBackend,
    text: &str,
    options: &SummaryOptions,
) -> Result<String, SummaryError> {
    let request = GenerationRequest {
        model: options.model.clone(),
        prompt: prompts::single_pass_prompt(text),
        temperature: SINGLE_PASS_TEMPERATURE,
        top_p: TOP_P,
        max_tokens: FINAL_MAX_TOKENS,
        timeout: options.merge_timeout,
    };

    backend
        .generate(request)
        .await
        .map_err(SummaryError::Synthesis)
}

fn ensure_bullet(summary: String) -> String {
    if !summary.is_empty() && !summary.trim_start().starts_with('•') {
        format!("• {summary}")
    } else {
        summary
    }
}

fn failure_sentinel(index: usize, reason: &str) -> String {
    format!("• [Chunk {} unavailable: {reason}]", index + 1)
}
