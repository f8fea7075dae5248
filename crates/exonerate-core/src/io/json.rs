//! JSON (de)serialization helpers, the same shape as nextclade's
//! `io::json` module. Core keeps this to in-memory strings rather than
//! nextclade's file-writing variants — the engine itself has no file
//! handles to offer, and `exonerate-cli` owns where bytes land.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

pub fn json_parse<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T> {
  serde_json::from_str(s).map_err(|e| EngineError::InvalidArgument(format!("invalid JSON: {e}")))
}

pub fn json_stringify<T: Serialize>(obj: &T) -> Result<String> {
  serde_json::to_string_pretty(obj).map_err(|e| EngineError::InvalidArgument(format!("failed to serialize JSON: {e}")))
}

/// Whether `t` serializes to JSON `null` — useful with
/// `#[serde(skip_serializing_if = "is_json_value_null")]` on a generic
/// field whose concrete type isn't known at the call site.
pub fn is_json_value_null<T: Serialize>(t: &T) -> bool {
  serde_json::to_value(t).unwrap_or(serde_json::Value::Null).is_null()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::Serialize as _;

  #[derive(Debug, Serialize, Deserialize, PartialEq)]
  struct Point {
    q: i64,
    t: i64,
  }

  #[test]
  fn round_trips_through_json() {
    let p = Point { q: 3, t: 5 };
    let s = json_stringify(&p).unwrap();
    let back: Point = json_parse(&s).unwrap();
    assert_eq!(p, back);
  }

  #[test]
  fn parse_error_is_invalid_argument() {
    let err = json_parse::<Point>("not json").unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
  }
}
