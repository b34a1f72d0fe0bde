//! Serde representation for price and return fields that may be NaN.
//!
//! JSON has no NaN or infinity, and serde_json writes them as `null`, which
//! then fails to read back as `f64`. Finite values stay plain numbers;
//! non-finite values are written as the strings `"NaN"`, `"inf"` and `"-inf"`.
//! `null` reads back as NaN so older artifacts still load.
//!
//! Use with `#[serde(with = "crate::domain::float_serde")]`, or the `vec`
//! submodule for `Vec<f64>` columns.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Wire {
    Number(f64),
    Text(String),
}

pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let v = *value;
    if v.is_finite() {
        serializer.serialize_f64(v)
    } else if v.is_nan() {
        serializer.serialize_str("NaN")
    } else if v > 0.0 {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Wire>::deserialize(deserializer)? {
        None => Ok(f64::NAN),
        Some(Wire::Number(v)) => Ok(v),
        Some(Wire::Text(s)) => s.parse().map_err(D::Error::custom),
    }
}

pub mod vec {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(transparent)]
    struct Float(#[serde(with = "super")] f64);

    pub fn serialize<S>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(values.iter().map(|&v| Float(v)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<Float>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|f| f.0).collect())
    }
}
