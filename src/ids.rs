use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Correlation id for one dispatched request, backed by a ULID.
///
/// Transports that already carry a trace id can pass it in with
/// [`RequestId::from_trace_or_new`]; otherwise a fresh id is generated.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    /// Generate a new id.
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse a transport trace id when it is a valid ULID, else generate one.
    #[must_use]
    pub fn from_trace_or_new(trace_id: Option<&str>) -> Self {
        trace_id
            .and_then(|s| s.parse::<RequestId>().ok())
            .unwrap_or_default()
    }

    /// Creation time in milliseconds since the Unix epoch.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id_is_reused_when_valid() {
        let original = RequestId::new();
        let text = original.to_string();
        assert_eq!(RequestId::from_trace_or_new(Some(&text)), original);
    }

    #[test]
    fn test_invalid_trace_id_generates_new() {
        let id = RequestId::from_trace_or_new(Some("not-a-ulid"));
        assert_eq!(id.to_string().len(), 26);
        assert_ne!(RequestId::from_trace_or_new(None), id);
    }

    #[test]
    fn test_serde_as_string() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<RequestId>("\"nope\"").is_err());
    }
}
