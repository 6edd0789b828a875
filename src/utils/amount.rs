//! Serde helpers for `Decimal` amounts on the wire.
//!
//! Amounts go out as JSON numbers (integers when there is no fractional part), or as
//! strings when an `f64` cannot hold them exactly. They come in as JSON numbers or
//! numeric strings. Used with `#[serde(with = "crate::utils::amount")]`.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

pub fn serialize<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if amount.fract().is_zero() {
        if let Some(whole) = amount.to_i64() {
            return serializer.serialize_i64(whole);
        }
    }
    match amount.to_f64() {
        Some(value) if survives_f64(amount, value) => serializer.serialize_f64(value),
        // More digits than an f64 carries; the exact decimal string is still accepted on input.
        _ => serializer.serialize_str(&amount.normalize().to_string()),
    }
}

/// True when the shortest decimal form of `value` reads back as `amount`.
fn survives_f64(amount: &Decimal, value: f64) -> bool {
    value.is_finite() && value.to_string().parse::<Decimal>().ok() == Some(*amount)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(AmountVisitor)
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a numeric amount")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be a finite number"));
        }
        Decimal::from_f64(v).ok_or_else(|| E::custom(format!("amount {} is out of range", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        v.trim()
            .parse::<Decimal>()
            .map_err(|_| E::custom(format!("'{}' is not a valid amount", v)))
    }
}

/// Same encoding for `Option<Decimal>`; `null` and a missing field both map to `None`
/// (pair with `#[serde(default)]`).
pub mod option {
    use super::AmountVisitor;
    use rust_decimal::Decimal;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(amount: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match amount {
            Some(a) => super::serialize(a, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(OptionalAmountVisitor)
    }

    struct OptionalAmountVisitor;

    impl<'de> Visitor<'de> for OptionalAmountVisitor {
        type Value = Option<Decimal>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a numeric amount or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(AmountVisitor).map(Some)
        }
    }
}
