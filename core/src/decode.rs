//! JSON decoding strategies for typed responses.
//!
//! `Structural` deserializes the body straight into the target type.
//! `Polymorphic` honors embedded type tags: targets declared as internally
//! tagged enums pick their variant from the tag, while untagged payloads
//! decode exactly as they would structurally. `RequireTag` additionally
//! rejects any top-level object that carries no tag.
//!
//! ```
//! use rest_core::Decoding;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! #[serde(tag = "$type")]
//! enum Shape {
//!     #[serde(rename = "circle")]
//!     Circle { radius: f64 },
//!     #[serde(rename = "square")]
//!     Square { side: f64 },
//! }
//!
//! let shape: Shape = Decoding::Polymorphic
//!     .decode(r#"{"$type":"square","side":2.0}"#)
//!     .unwrap();
//! assert!(matches!(shape, Shape::Square { side } if side == 2.0));
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Field name carrying the concrete type in polymorphic payloads.
pub const DEFAULT_TYPE_TAG: &str = "$type";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Decoding {
    /// Deserialize into the target's declared shape.
    #[default]
    Structural,
    /// Let tagged enums in the target pick their variant from the payload.
    Polymorphic,
    /// As `Polymorphic`, but every top-level object must carry `tag`.
    RequireTag { tag: String },
}

impl Decoding {
    /// Strict polymorphic decoding with the default `$type` tag.
    pub fn require_default_tag() -> Self {
        Self::require_tag(DEFAULT_TYPE_TAG)
    }

    pub fn require_tag(tag: impl Into<String>) -> Self {
        Decoding::RequireTag { tag: tag.into() }
    }

    /// Deserialize `body` into `T` according to this strategy.
    ///
    /// # Errors
    /// `ApiError::Deserialization` for malformed JSON, a shape mismatch or an
    /// unknown tag value; `ApiError::MissingTypeTag` when `RequireTag` finds
    /// an untagged object.
    pub fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T> {
        match self {
            Decoding::Structural | Decoding::Polymorphic => Ok(serde_json::from_str(body)?),
            Decoding::RequireTag { tag } => {
                let value: Value = serde_json::from_str(body)?;
                require_tag(&value, tag)?;
                Ok(serde_json::from_value(value)?)
            }
        }
    }
}

/// Maps a "handle types" flag onto `Polymorphic` or `Structural`.
impl From<bool> for Decoding {
    fn from(handle_types: bool) -> Self {
        if handle_types {
            Decoding::Polymorphic
        } else {
            Decoding::Structural
        }
    }
}

fn require_tag(value: &Value, tag: &str) -> Result<()> {
    let tagged = |object: &Value| object.as_object().is_some_and(|map| map.contains_key(tag));
    let ok = match value {
        Value::Array(items) => items.iter().all(tagged),
        Value::Object(_) => tagged(value),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ApiError::MissingTypeTag {
            tag: tag.to_string(),
        })
    }
}
