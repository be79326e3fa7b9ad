// error.rs — Error types for value coercion.
//
// Coercion failures never abort a parse. The assembler turns each one into a
// FieldWarning whose message is this error's Display text.

use thiserror::Error;

/// A raw directive value that could not be converted to its typed form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The value is not one of the accepted boolean spellings.
    #[error("unrecognized boolean value \"{raw}\"; expected one of true/false/yes/no/1/0/on/off")]
    InvalidBoolean { raw: String },

    /// The value is not a canonical base-10 integer.
    #[error("invalid integer value \"{raw}\"; expected a base-10 integer with no leading zeros or extra characters")]
    InvalidInteger { raw: String },

    /// The value is not a member of a closed set.
    #[error("unrecognized value \"{raw}\"; expected one of {expected}")]
    UnknownVariant { raw: String, expected: String },
}
