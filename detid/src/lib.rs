//! Packed 32-bit detector identifiers and their field interpreters.
//!
//! Every readout channel and geometry element is named by a single `u32`
//! whose top six bits carry a subdetector tag and whose remaining bits are
//! split into named fields (layer, module, cell, strip, ...). This crate
//! provides:
//! - [`DetectorId`], the raw identifier newtype
//! - [`FieldLayout`], a validated list of named bit ranges with pack/unpack
//! - [`InterpreterRegistry`], the tag → layout map with a generic fallback
//!
//! # Design Principles
//!
//! - **Explicit registry** - Layouts live in a value you construct and pass
//!   around, not in process-wide state.
//! - **Always interpretable** - Unknown tags fall back to `subdetector` +
//!   `payload`.
//! - **Explicit errors** - Layout and registration failures return
//!   structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use detid::{DetectorId, InterpreterRegistry};
//!
//! let registry = InterpreterRegistry::with_standard_layouts().unwrap();
//! let id = DetectorId::new(0x1402_100a);
//! let fields = registry.unpack(id);
//! assert_eq!(fields.get("layer"), Some(1));
//! assert_eq!(fields.get("cell"), Some(10));
//! ```

mod error;
mod field;
mod id;
mod registry;
mod standard;

pub use error::{DetIdError, DetIdResult};
pub use field::{FieldLayout, FieldLayoutBuilder, FieldValues, IdField};
pub use id::{
    subdetector, DetectorId, ECAL_CELL_TYPE_MASK, ECAL_CELL_TYPE_PRECISION, ECAL_CELL_TYPE_SHIFT,
    ECAL_CELL_TYPE_TRIGGER, SUBDETECTOR_MASK, SUBDETECTOR_SHIFT,
};
pub use registry::{with_tag, InterpreterRegistry, Signature};
