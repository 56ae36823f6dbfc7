use thiserror::Error;

/// Rejected attempts to build an outgoing [`Payload`](crate::Payload).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Message text is empty")]
    EmptyText,

    #[error("Please select an image file")]
    NotAnImage,
}
