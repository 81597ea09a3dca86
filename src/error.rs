use serde::Serialize;

/// Engine-wide error type. Every fallible operation returns `Result<T, EngineError>`.
/// Serializes cleanly so host shells get structured error messages.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("History fetch error: {0}")]
    History(String),

    #[error("Outbound dispatch error: {0}")]
    Outbound(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

/// We serialize as `{ error: "...", kind: "..." }` for host consumption.
impl Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("EngineError", 2)?;
        s.serialize_field("error", &self.to_string())?;
        s.serialize_field(
            "kind",
            match self {
                EngineError::History(_) => "history",
                EngineError::Outbound(_) => "outbound",
                EngineError::Serde(_) => "serde",
                EngineError::Internal(_) => "internal",
            },
        )?;
        s.end()
    }
}
