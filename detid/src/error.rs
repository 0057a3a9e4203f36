//! Error types for identifier layouts and the interpreter registry.

use std::fmt;

/// Result type for identifier operations.
pub type DetIdResult<T> = Result<T, DetIdError>;

/// Errors that can occur when building layouts, registering interpreters,
/// or packing identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetIdError {
    /// A field's bit range is reversed or extends past bit 31.
    FieldOutOfRange {
        field: String,
        start_bit: u8,
        end_bit: u8,
    },

    /// Two fields in one layout claim the same bit.
    OverlappingFields { first: String, second: String },

    /// Two fields in one layout share a name.
    DuplicateFieldName { field: String },

    /// An interpreter for this tag (and signature) is already registered.
    /// `mask` and `value` are zero for a plain tag registration.
    DuplicateInterpreter { tag: u8, mask: u32, value: u32 },

    /// Subdetector tag does not fit in the six tag bits.
    InvalidTag { tag: u32 },

    /// A field name passed to `pack` is not part of the layout.
    UnknownField { field: String },
}

impl fmt::Display for DetIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldOutOfRange {
                field,
                start_bit,
                end_bit,
            } => {
                write!(
                    f,
                    "field '{field}' has invalid bit range {start_bit}..={end_bit}"
                )
            }
            Self::OverlappingFields { first, second } => {
                write!(f, "fields '{first}' and '{second}' overlap")
            }
            Self::DuplicateFieldName { field } => {
                write!(f, "duplicate field name '{field}'")
            }
            Self::DuplicateInterpreter { tag, mask, value } => {
                if *mask == 0 {
                    write!(f, "attempted to replace interpreter for subdetector {tag}")
                } else {
                    write!(
                        f,
                        "attempted to replace interpreter for subdetector {tag} mask 0x{mask:08x} value 0x{value:08x}"
                    )
                }
            }
            Self::InvalidTag { tag } => {
                write!(f, "subdetector tag {tag} does not fit in 6 bits")
            }
            Self::UnknownField { field } => {
                write!(f, "no field named '{field}' in layout")
            }
        }
    }
}

impl std::error::Error for DetIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_duplicate_interpreter_plain() {
        let err = DetIdError::DuplicateInterpreter {
            tag: 5,
            mask: 0,
            value: 0,
        };
        assert_eq!(
            err.to_string(),
            "attempted to replace interpreter for subdetector 5"
        );
    }

    #[test]
    fn display_duplicate_interpreter_signature() {
        let err = DetIdError::DuplicateInterpreter {
            tag: 5,
            mask: 0x0300_0000,
            value: 0x0100_0000,
        };
        let msg = err.to_string();
        assert!(msg.contains("0x03000000"));
        assert!(msg.contains("0x01000000"));
    }

    #[test]
    fn display_field_out_of_range() {
        let err = DetIdError::FieldOutOfRange {
            field: "layer".to_string(),
            start_bit: 30,
            end_bit: 33,
        };
        let msg = err.to_string();
        assert!(msg.contains("layer"));
        assert!(msg.contains("30..=33"));
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<DetIdError>();
    }
}
