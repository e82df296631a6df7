use thiserror::Error;

/// Errors surfaced by the pipeline entry points.
///
/// Adapter failures never show up here: they are folded into the affected
/// keyword record instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no keywords to collect")]
    NoKeywords,

    #[error("keyword at position {index} is blank")]
    InvalidKeyword { index: usize },

    #[error("monitoring store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PipelineError {
    /// Wrap a persistence-layer error.
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PipelineError::Store(Box::new(err))
    }

    /// `true` for errors caused by the caller's input rather than the system.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::NoKeywords | PipelineError::InvalidKeyword { .. }
        )
    }
}
