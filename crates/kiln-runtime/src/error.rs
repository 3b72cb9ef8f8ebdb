use thiserror::Error;

pub type Result<T> = std::result::Result<T, HostError>;

/// Why a host could not take a state write.
///
/// The driver never surfaces these to callers. A failed write resumes the
/// handler's continuation with `None` and the handler decides what to do.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("component is unmounted")]
    Unmounted,

    #[error("state write rejected: {reason}")]
    Rejected { reason: String },
}

impl HostError {
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}
