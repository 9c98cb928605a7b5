//! Deserializers for backend number encodings
//!
//! The backend stores integers as decimals and its JSON encoder writes them
//! as strings (`"age": "25"`), so integer fields accept either form.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(u64),
    Float(f64),
    Text(String),
}

fn integral(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64)
        .then(|| value as u64)
}

/// Unsigned integer given as a JSON number or a numeric string
pub(crate) fn lenient_uint<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let raw = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Int(n) => Some(n),
        NumberOrText::Float(f) => integral(f),
        NumberOrText::Text(text) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral))
        }
    }
    .ok_or_else(|| D::Error::custom("expected a non-negative integer"))?;
    T::try_from(raw).map_err(|_| D::Error::custom(format!("{raw} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "lenient_uint")]
        small: u8,
    }

    fn parse(value: &str) -> Result<u8, serde_json::Error> {
        serde_json::from_str::<Row>(&format!(r#"{{"small": {value}}}"#)).map(|r| r.small)
    }

    #[test]
    fn test_number_and_decimal_string_agree() {
        assert_eq!(parse("7").unwrap(), 7);
        assert_eq!(parse(r#""7""#).unwrap(), 7);
        assert_eq!(parse(r#"" 7 ""#).unwrap(), 7);
        assert_eq!(parse(r#""7.0""#).unwrap(), 7);
        assert_eq!(parse("7.0").unwrap(), 7);
    }

    #[test]
    fn test_rejects_fractions_and_garbage() {
        assert!(parse(r#""7.5""#).is_err());
        assert!(parse(r#""seven""#).is_err());
        assert!(parse("-1").is_err());
        assert!(parse("null").is_err());
    }

    #[test]
    fn test_out_of_range_for_target() {
        assert!(parse(r#""300""#).is_err());
    }
}
