//! Registry of field layouts keyed by subdetector tag.

use std::collections::BTreeMap;

use crate::error::{DetIdError, DetIdResult};
use crate::field::{FieldLayout, FieldValues};
use crate::id::{DetectorId, SUBDETECTOR_MASK, SUBDETECTOR_SHIFT};

/// Extra bits that select a layout within one subdetector.
///
/// An identifier matches when `raw & mask == value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Bits the signature inspects.
    pub mask: u32,
    /// Required value of the masked bits.
    pub value: u32,
}

impl Signature {
    /// Creates a signature; `value` bits outside `mask` are dropped.
    #[must_use]
    pub const fn new(mask: u32, value: u32) -> Self {
        Self {
            mask,
            value: value & mask,
        }
    }

    /// Returns `true` if the identifier carries this signature.
    #[must_use]
    pub const fn matches(self, id: DetectorId) -> bool {
        id.raw() & self.mask == self.value
    }
}

#[derive(Debug, Clone, Default)]
struct TagLayouts {
    plain: Option<FieldLayout>,
    signed: Vec<(Signature, FieldLayout)>,
}

/// Maps subdetector tags to field layouts.
///
/// Lookups never fail: an identifier whose tag has no registered layout is
/// interpreted with the generic `subdetector` + `payload` layout. The
/// registry is built once and then shared by reference; it has no interior
/// mutability.
#[derive(Debug, Clone)]
pub struct InterpreterRegistry {
    generic: FieldLayout,
    by_tag: BTreeMap<u8, TagLayouts>,
}

impl Default for InterpreterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterRegistry {
    /// Creates a registry holding only the generic layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generic: crate::standard::generic_layout(),
            by_tag: BTreeMap::new(),
        }
    }

    /// Creates a registry with every built-in subdetector layout.
    pub fn with_standard_layouts() -> DetIdResult<Self> {
        let mut registry = Self::new();
        crate::standard::register_standard_layouts(&mut registry)?;
        Ok(registry)
    }

    /// Registers the layout used for every identifier with this tag.
    pub fn register(&mut self, tag: u8, layout: FieldLayout) -> DetIdResult<()> {
        check_tag(tag)?;
        let entry = self.by_tag.entry(tag).or_default();
        if entry.plain.is_some() {
            return Err(DetIdError::DuplicateInterpreter {
                tag,
                mask: 0,
                value: 0,
            });
        }
        entry.plain = Some(layout);
        Ok(())
    }

    /// Registers a layout for identifiers with this tag that also carry the
    /// given signature. Signature layouts take precedence over the plain
    /// layout of the same tag and are tried in registration order.
    pub fn register_with_signature(
        &mut self,
        tag: u8,
        signature: Signature,
        layout: FieldLayout,
    ) -> DetIdResult<()> {
        check_tag(tag)?;
        let entry = self.by_tag.entry(tag).or_default();
        if entry.signed.iter().any(|(existing, _)| *existing == signature) {
            return Err(DetIdError::DuplicateInterpreter {
                tag,
                mask: signature.mask,
                value: signature.value,
            });
        }
        entry.signed.push((signature, layout));
        Ok(())
    }

    /// Returns the layout for an identifier.
    #[must_use]
    pub fn lookup(&self, id: DetectorId) -> &FieldLayout {
        let Some(entry) = self.by_tag.get(&id.subdetector()) else {
            return &self.generic;
        };
        entry
            .signed
            .iter()
            .find(|(signature, _)| signature.matches(id))
            .map(|(_, layout)| layout)
            .or(entry.plain.as_ref())
            .unwrap_or(&self.generic)
    }

    /// Returns the plain layout registered for a tag, or the generic layout.
    #[must_use]
    pub fn lookup_tag(&self, tag: u8) -> &FieldLayout {
        self.by_tag
            .get(&tag)
            .and_then(|entry| entry.plain.as_ref())
            .unwrap_or(&self.generic)
    }

    /// Iterates over every layout registered for a tag: signature layouts in
    /// registration order, then the plain layout.
    pub fn layouts_for_tag(
        &self,
        tag: u8,
    ) -> impl Iterator<Item = (Option<Signature>, &FieldLayout)> + '_ {
        let entry = self.by_tag.get(&tag);
        let signed = entry
            .into_iter()
            .flat_map(|entry| entry.signed.iter())
            .map(|(signature, layout)| (Some(*signature), layout));
        let plain = entry
            .and_then(|entry| entry.plain.as_ref())
            .map(|layout| (None, layout));
        signed.chain(plain)
    }

    /// Returns the generic fallback layout.
    #[must_use]
    pub const fn generic(&self) -> &FieldLayout {
        &self.generic
    }

    /// Returns `true` if any layout is registered for the tag.
    #[must_use]
    pub fn contains_tag(&self, tag: u8) -> bool {
        self.by_tag.contains_key(&tag)
    }

    /// Unpacks an identifier with its layout.
    #[must_use]
    pub fn unpack(&self, id: DetectorId) -> FieldValues<'_> {
        self.lookup(id).unpack(id)
    }

    /// Packs named values with the plain layout of `tag`.
    ///
    /// The tag bits are always set from `tag`, whatever the values say.
    pub fn pack<'n, I>(&self, tag: u8, values: I) -> DetIdResult<DetectorId>
    where
        I: IntoIterator<Item = (&'n str, u32)>,
    {
        check_tag(tag)?;
        let id = self.lookup_tag(tag).pack(values)?;
        Ok(with_tag(id, tag))
    }
}

/// Replaces the tag bits of an identifier.
#[must_use]
pub const fn with_tag(id: DetectorId, tag: u8) -> DetectorId {
    let tag_bits = SUBDETECTOR_MASK << SUBDETECTOR_SHIFT;
    DetectorId::new((id.raw() & !tag_bits) | ((tag as u32) << SUBDETECTOR_SHIFT))
}

fn check_tag(tag: u8) -> DetIdResult<()> {
    if u32::from(tag) > SUBDETECTOR_MASK {
        return Err(DetIdError::InvalidTag {
            tag: u32::from(tag),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subdetector;

    fn strip_layout() -> FieldLayout {
        FieldLayout::builder()
            .field("subdetector", 26, 31)
            .field("strip", 0, 7)
            .build()
            .unwrap()
    }

    #[test]
    fn unknown_tag_falls_back_to_generic() {
        let registry = InterpreterRegistry::new();
        let id = DetectorId::from_parts(subdetector::HCAL, 0x1234);
        let values = registry.unpack(id);
        assert_eq!(values.get("subdetector"), Some(6));
        assert_eq!(values.get("payload"), Some(0x1234));
    }

    #[test]
    fn duplicate_plain_registration_fails() {
        let mut registry = InterpreterRegistry::new();
        registry.register(9, strip_layout()).unwrap();
        let err = registry.register(9, strip_layout()).unwrap_err();
        assert_eq!(
            err,
            DetIdError::DuplicateInterpreter {
                tag: 9,
                mask: 0,
                value: 0
            }
        );
    }

    #[test]
    fn duplicate_signature_registration_fails() {
        let mut registry = InterpreterRegistry::new();
        let signature = Signature::new(0x100, 0x100);
        registry
            .register_with_signature(9, signature, strip_layout())
            .unwrap();
        let err = registry
            .register_with_signature(9, signature, strip_layout())
            .unwrap_err();
        assert!(matches!(err, DetIdError::DuplicateInterpreter { tag: 9, .. }));
    }

    #[test]
    fn signature_layout_takes_precedence() {
        let mut registry = InterpreterRegistry::new();
        registry.register(9, strip_layout()).unwrap();
        let special = FieldLayout::builder()
            .field("subdetector", 26, 31)
            .field("flag", 8, 8)
            .field("pad", 0, 7)
            .build()
            .unwrap();
        registry
            .register_with_signature(9, Signature::new(0x100, 0x100), special)
            .unwrap();

        let plain_id = DetectorId::from_parts(9, 0x05);
        let flagged_id = DetectorId::from_parts(9, 0x105);
        assert_eq!(registry.unpack(plain_id).get("strip"), Some(5));
        assert_eq!(registry.unpack(flagged_id).get("pad"), Some(5));
        assert_eq!(registry.unpack(flagged_id).get("strip"), None);
    }

    #[test]
    fn signature_only_tag_falls_back_to_generic() {
        let mut registry = InterpreterRegistry::new();
        registry
            .register_with_signature(9, Signature::new(0x100, 0x100), strip_layout())
            .unwrap();
        let id = DetectorId::from_parts(9, 0x05);
        assert_eq!(registry.lookup(id), registry.generic());
    }

    #[test]
    fn invalid_tag_rejected() {
        let mut registry = InterpreterRegistry::new();
        let err = registry.register(64, strip_layout()).unwrap_err();
        assert_eq!(err, DetIdError::InvalidTag { tag: 64 });
    }

    #[test]
    fn pack_forces_tag_bits() {
        let mut registry = InterpreterRegistry::new();
        registry.register(9, strip_layout()).unwrap();
        let id = registry.pack(9, [("strip", 3)]).unwrap();
        assert_eq!(id.subdetector(), 9);
        assert_eq!(id.payload(), 3);
    }

    #[test]
    fn layouts_for_tag_lists_signatures_first() {
        let mut registry = InterpreterRegistry::new();
        registry.register(9, strip_layout()).unwrap();
        registry
            .register_with_signature(9, Signature::new(0x100, 0x100), strip_layout())
            .unwrap();
        let signatures: Vec<Option<Signature>> =
            registry.layouts_for_tag(9).map(|(sig, _)| sig).collect();
        assert_eq!(signatures, [Some(Signature::new(0x100, 0x100)), None]);
        assert_eq!(registry.layouts_for_tag(10).count(), 0);
    }

    #[test]
    fn with_tag_replaces_tag() {
        let id = DetectorId::from_parts(5, 0x42);
        let retagged = with_tag(id, 6);
        assert_eq!(retagged.subdetector(), 6);
        assert_eq!(retagged.payload(), 0x42);
    }
}
