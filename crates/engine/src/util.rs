//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::Validation(format!("invalid {label} id")))
}

/// Encode a list as the JSON text stored in a TEXT column.
pub(crate) fn encode_json_list<T: serde::Serialize>(values: &[T]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a JSON TEXT column back into a list, tolerating legacy garbage.
pub(crate) fn decode_json_list<T: serde::de::DeserializeOwned>(raw: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Validate a weekday assignment array: values in `0..=6`, no duplicates.
pub(crate) fn validate_weekdays(days: &[u8], label: &str) -> ResultEngine<()> {
    let mut seen = [false; 7];
    for &day in days {
        let slot = seen
            .get_mut(usize::from(day))
            .ok_or_else(|| EngineError::Validation(format!("{label}: weekday {day} out of range")))?;
        if *slot {
            return Err(EngineError::Validation(format!(
                "{label}: weekday {day} listed twice"
            )));
        }
        *slot = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekdays_rejects_out_of_range_and_duplicates() {
        assert!(validate_weekdays(&[0, 2, 6], "parent_a_days").is_ok());
        assert!(validate_weekdays(&[7], "parent_a_days").is_err());
        assert!(validate_weekdays(&[1, 1], "parent_a_days").is_err());
    }

    #[test]
    fn json_list_round_trip() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let encoded = encode_json_list(&ids);
        assert_eq!(decode_json_list::<String>(&encoded), ids);
        assert!(decode_json_list::<String>("not json").is_empty());
    }
}
