use thiserror::Error;

/// Errors that end a run. Per-item resolution and lookup failures never
/// show up here; the stage that hits them logs and drops the item.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("error while reading input")]
    Input(#[from] std::io::Error),
    #[error("no resolution workers were provided")]
    NoResolvers,
    #[error("failed to spawn {stage} worker")]
    Spawn {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{count} {stage} worker(s) panicked")]
    WorkerPanicked { stage: &'static str, count: usize },
}
