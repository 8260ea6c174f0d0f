use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum LangReason {
    #[error("rule parse error")]
    Parse,
    #[error("rule schema error")]
    Schema,
    #[error("rule validation error")]
    Validation,
    #[error("rule dependency error")]
    Dependency,
    #[error("plan emit error")]
    PlanEmit,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for LangReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::Parse => 1001,
            Self::Schema => 1002,
            Self::Validation => 1003,
            Self::Dependency => 1004,
            Self::PlanEmit => 1005,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type LangError = StructError<LangReason>;
pub type LangResult<T> = Result<T, LangError>;
