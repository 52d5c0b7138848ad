use std::{env, sync::Once};

use docdigest::{
    config, llm,
    pipeline::{SummaryOptions, SummaryService},
    status::NullStatusSink,
    store::MemorySummaryStore,
};
use std::sync::Arc;

static INIT: Once = Once::new();

fn set_default_env(key: &str, value: &str) {
    let needs_value = env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true);
    if needs_value {
        // SAFETY: Tests run serially via Once and we intentionally mutate process env.
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn init_config_once() {
    INIT.call_once(|| {
        set_default_env("OLLAMA_URL", "http://127.0.0.1:11434");
        set_default_env("SUMMARY_MODEL", "llama3.2:3b");
        config::init_config();
    });
}

#[tokio::test]
#[ignore = "Requires live Ollama"]
async fn live_ollama_single_pass_summary() {
    init_config_once();
    let service = SummaryService::new(
        llm::get_llm_backend(),
        Arc::new(MemorySummaryStore::new()),
        Arc::new(NullStatusSink),
        SummaryOptions::from_config(config::get_config()),
    );

    let outcome = service
        .generate_summary(
            "Rust is a systems programming language focused on safety and concurrency. \
             It achieves memory safety without garbage collection through ownership.",
        )
        .await
        .expect("failed to generate summary against live Ollama");

    assert!(!outcome.summary.trim().is_empty());
}

#[tokio::test]
#[ignore = "Requires live Ollama"]
async fn live_ollama_chunked_summary() {
    init_config_once();
    let service = SummaryService::new(
        llm::get_llm_backend(),
        Arc::new(MemorySummaryStore::new()),
        Arc::new(NullStatusSink),
        SummaryOptions::from_config(config::get_config()),
    );

    let paragraph = "The borrow checker enforces aliasing rules at compile time. \
                     Lifetimes describe how long references remain valid. ";
    let outcome = service
        .generate_summary(&paragraph.repeat(40))
        .await
        .expect("failed to generate chunked summary against live Ollama");

    assert!(!outcome.summary.trim().is_empty());
    assert!(outcome.chunk_count >= 1);
}
