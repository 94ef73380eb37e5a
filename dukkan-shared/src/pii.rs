use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for customer contact details that hides the value in Debug and
/// Display output while serializing transparently in API responses.
///
/// Order and checkout structs carry customer emails and phone numbers; this
/// keeps them out of log lines written with `tracing::info!("{:?}", ...)`.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Masked<T>(pub T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Masked(value)
    }

    pub fn inner(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_is_masked() {
        let email = Masked::new("customer@example.com".to_string());
        assert_eq!(format!("{:?}", email), "<redacted>");
        assert_eq!(email.inner(), "customer@example.com");
    }

    #[test]
    fn test_serializes_real_value() {
        let email = Masked::new("customer@example.com".to_string());
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"customer@example.com\"");
    }
}
