//! Requested-item model handed over by the request-parsing layer.
//!
//! The services that parse user input produce `Requested` values; the
//! calculator consumes them as-is. Quantities deserialize leniently so a
//! malformed amount degrades to 1 instead of rejecting the request.

use serde::{Deserialize, Deserializer, Serialize};

/// Target of a request: a concrete item or any member of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestTarget {
    /// Concrete item, by canonical name.
    #[serde(rename = "name")]
    Item(String),
    /// Tag: any member item satisfies the request.
    #[serde(rename = "tag")]
    Tag(String),
}

/// One requested craftable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requested {
    /// What to craft.
    #[serde(flatten)]
    pub target: RequestTarget,
    /// How many units are wanted; malformed values coerce to 1.
    #[serde(default = "default_amount", deserialize_with = "lenient_amount")]
    pub amount_required: u64,
}

impl Requested {
    /// Requests `amount` units of a concrete item.
    #[must_use]
    pub fn item(name: impl Into<String>, amount: u64) -> Self {
        Self {
            target: RequestTarget::Item(name.into()),
            amount_required: amount,
        }
    }

    /// Requests `amount` units of any member of a tag.
    #[must_use]
    pub fn tag(name: impl Into<String>, amount: u64) -> Self {
        Self {
            target: RequestTarget::Tag(name.into()),
            amount_required: amount,
        }
    }
}

fn default_amount() -> u64 {
    1
}

/// Accepts numbers and numeric strings; anything else becomes 1.
fn lenient_amount<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(value) => value,
        Raw::Float(value) if value >= 0.0 => value as u64,
        Raw::Text(value) => value.trim().parse().unwrap_or(1),
        Raw::Float(_) | Raw::Other(_) => 1,
    })
}
