//! Redacting wrapper for tokens and other credentials

use std::fmt;

use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

/// Credential material that must never reach logs.
///
/// `Debug` and `Display` print `[REDACTED]`; the inner value is zeroized on drop.
/// Call [`Secret::expose`] only at the point the raw value goes on the wire.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// True when the wrapped token is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl<'de, T: Zeroize + Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_hide_the_token() {
        let token = Secret::from("pat_live_abc123");
        assert_eq!(format!("{token:?}"), "[REDACTED]");
        assert_eq!(token.to_string(), "[REDACTED]");
    }

    #[test]
    fn expose_returns_raw_token() {
        let token = Secret::new(String::from("pat_live_abc123"));
        assert_eq!(token.expose(), "pat_live_abc123");
    }

    #[test]
    fn blank_detection() {
        assert!(Secret::from("  \n").is_blank());
        assert!(!Secret::from("pat").is_blank());
    }

    #[test]
    fn deserializes_from_plain_string() {
        let token: Secret<String> = serde_json::from_str("\"pat_from_json\"").unwrap();
        assert_eq!(token.expose(), "pat_from_json");
    }
}
