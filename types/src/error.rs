use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid contestant type: {0}")]
    InvalidContestantType(String),

    #[error("client id must not be empty")]
    EmptyClientId,

    #[error("client id is {0} bytes, longer than the limit")]
    ClientIdTooLong(usize),
}
