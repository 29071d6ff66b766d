//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding frames.
///
/// A decode error means one message was malformed. Whether that is
/// survivable (drop and log) or marks the whole channel unhealthy is
/// decided above this layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a command argument failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// An argument document was not valid JSON or did not match its schema.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The frame had no tag part.
    #[error("frame is missing its tag")]
    MissingTag,

    /// The tag is not part of the protocol vocabulary.
    #[error("unknown tag: {0:?}")]
    UnknownTag(String),

    /// An event topic did not have the `<gameID>:<tag>` form.
    #[error("malformed event topic: {0:?}")]
    BadTopic(String),

    /// A keyword argument key arrived without its value document.
    #[error("dangling keyword argument: {0:?}")]
    DanglingKey(String),

    /// A required argument was absent (or explicitly null).
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The reply status marks a transport-level error. Game-level
    /// failure replies decode normally; this does not.
    #[error("transport-level error status: {0:?}")]
    BadStatus(String),
}
