use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("store error: {0}")]
    Store(#[from] cask_store::StoreError),

    #[error("head error: {0}")]
    Head(#[from] cask_heads::HeadError),

    #[error("collection error: {0}")]
    Gc(#[from] cask_gc::GcError),

    /// A head update stayed contended past the retry budget.
    #[error("head {0} is contended: retry budget exhausted")]
    Contention(String),
}

pub type SdkResult<T> = Result<T, SdkError>;
