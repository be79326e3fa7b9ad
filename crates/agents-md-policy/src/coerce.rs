// coerce.rs — Pure conversions from raw directive values to typed values.
//
// Range checks are the caller's job: valid ranges differ per field.

use crate::error::CoercionError;

/// Accepted spellings for `true`.
pub const TRUE_VALUES: &[&str] = &["true", "yes", "1", "on"];

/// Accepted spellings for `false`.
pub const FALSE_VALUES: &[&str] = &["false", "no", "0", "off"];

/// Convert a raw value to a boolean (case-insensitive, trimmed).
pub fn to_boolean(raw: &str) -> Result<bool, CoercionError> {
    let normalized = raw.trim().to_lowercase();
    if TRUE_VALUES.contains(&normalized.as_str()) {
        Ok(true)
    } else if FALSE_VALUES.contains(&normalized.as_str()) {
        Ok(false)
    } else {
        Err(CoercionError::InvalidBoolean {
            raw: raw.to_string(),
        })
    }
}

/// Convert a raw value to an integer.
///
/// The trimmed input must be exactly the canonical rendering of the parsed
/// number, so `"007"`, `"+5"`, `"-0"` and `"12abc"` are all rejected.
pub fn to_integer(raw: &str) -> Result<i64, CoercionError> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(value) if value.to_string() == trimmed => Ok(value),
        _ => Err(CoercionError::InvalidInteger {
            raw: raw.to_string(),
        }),
    }
}

/// Split a comma-separated value into trimmed, non-empty elements.
pub fn to_string_array(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
