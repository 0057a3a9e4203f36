//! Bit-field definitions and per-subdetector layouts.

use std::collections::HashSet;

use crate::error::{DetIdError, DetIdResult};
use crate::DetectorId;

/// One named bit range within a packed identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdField {
    name: String,
    start_bit: u8,
    end_bit: u8,
}

impl IdField {
    /// Creates a field covering `start_bit..=end_bit`.
    ///
    /// The range is checked when the field is added to a [`FieldLayout`].
    #[must_use]
    pub fn new(name: impl Into<String>, start_bit: u8, end_bit: u8) -> Self {
        Self {
            name: name.into(),
            start_bit,
            end_bit,
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the lowest bit of the field.
    #[must_use]
    pub const fn start_bit(&self) -> u8 {
        self.start_bit
    }

    /// Returns the highest bit of the field (inclusive).
    #[must_use]
    pub const fn end_bit(&self) -> u8 {
        self.end_bit
    }

    /// Returns the field width in bits, or zero for a reversed range.
    #[must_use]
    pub const fn width(&self) -> u8 {
        if self.end_bit < self.start_bit {
            0
        } else {
            (self.end_bit - self.start_bit).saturating_add(1)
        }
    }

    /// Returns the in-place mask of the field. Bits above 31 are dropped,
    /// so an out-of-range field masks only what fits in a `u32`.
    #[must_use]
    pub const fn bit_mask(&self) -> u32 {
        if self.end_bit < self.start_bit || self.start_bit > 31 {
            return 0;
        }
        let end = if self.end_bit > 31 { 31 } else { self.end_bit };
        let ones = (1u64 << (end - self.start_bit + 1)) - 1;
        (ones << self.start_bit) as u32
    }

    /// Extracts this field's value from a raw identifier.
    #[must_use]
    pub const fn extract(&self, raw: u32) -> u32 {
        match (raw & self.bit_mask()).checked_shr(self.start_bit as u32) {
            Some(value) => value,
            None => 0,
        }
    }

    /// Places `value` into this field's bit range, truncating excess bits.
    #[must_use]
    pub const fn place(&self, value: u32) -> u32 {
        match value.checked_shl(self.start_bit as u32) {
            Some(placed) => placed & self.bit_mask(),
            None => 0,
        }
    }

    fn validate(&self) -> DetIdResult<()> {
        if self.start_bit > self.end_bit || self.end_bit > 31 {
            return Err(DetIdError::FieldOutOfRange {
                field: self.name.clone(),
                start_bit: self.start_bit,
                end_bit: self.end_bit,
            });
        }
        Ok(())
    }
}

/// An ordered, validated list of fields describing one identifier format.
///
/// Field indices are positions in the list. Bit ranges never overlap and stay
/// within 32 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    fields: Vec<IdField>,
}

impl FieldLayout {
    /// Creates a layout after validation.
    pub fn new(fields: Vec<IdField>) -> DetIdResult<Self> {
        let layout = Self { fields };
        layout.validate()?;
        Ok(layout)
    }

    /// Wraps fields already known to satisfy the layout invariants.
    pub(crate) const fn from_trusted(fields: Vec<IdField>) -> Self {
        Self { fields }
    }

    /// Creates a layout builder.
    #[must_use]
    pub fn builder() -> FieldLayoutBuilder {
        FieldLayoutBuilder { fields: Vec::new() }
    }

    /// Validates layout invariants.
    pub fn validate(&self) -> DetIdResult<()> {
        let mut names = HashSet::new();
        for (i, field) in self.fields.iter().enumerate() {
            field.validate()?;
            if !names.insert(field.name()) {
                return Err(DetIdError::DuplicateFieldName {
                    field: field.name.clone(),
                });
            }
            for earlier in &self.fields[..i] {
                if earlier.bit_mask() & field.bit_mask() != 0 {
                    return Err(DetIdError::OverlappingFields {
                        first: earlier.name.clone(),
                        second: field.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns the fields in index order.
    #[must_use]
    pub fn fields(&self) -> &[IdField] {
        &self.fields
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the layout has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the field with the given name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&IdField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns the index of the field with the given name.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Splits a raw identifier into field values. Bits outside every field
    /// are ignored.
    #[must_use]
    pub fn unpack(&self, id: DetectorId) -> FieldValues<'_> {
        let raw = id.raw();
        FieldValues {
            layout: self,
            values: self.fields.iter().map(|field| field.extract(raw)).collect(),
        }
    }

    /// Builds an identifier from named field values. Fields that are not
    /// supplied are zero.
    pub fn pack<'n, I>(&self, values: I) -> DetIdResult<DetectorId>
    where
        I: IntoIterator<Item = (&'n str, u32)>,
    {
        let mut raw = 0u32;
        for (name, value) in values {
            let field = self.field(name).ok_or_else(|| DetIdError::UnknownField {
                field: name.to_string(),
            })?;
            raw |= field.place(value);
        }
        Ok(DetectorId::new(raw))
    }

    /// Builds an identifier from values given in field-index order.
    ///
    /// Missing trailing values are zero; extra values are ignored.
    #[must_use]
    pub fn pack_ordered(&self, values: &[u32]) -> DetectorId {
        let raw = self
            .fields
            .iter()
            .zip(values)
            .fold(0u32, |raw, (field, value)| raw | field.place(*value));
        DetectorId::new(raw)
    }
}

/// Builder for `FieldLayout`.
#[derive(Debug, Default)]
pub struct FieldLayoutBuilder {
    fields: Vec<IdField>,
}

impl FieldLayoutBuilder {
    /// Appends a field covering `start_bit..=end_bit`.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, start_bit: u8, end_bit: u8) -> Self {
        self.fields.push(IdField::new(name, start_bit, end_bit));
        self
    }

    /// Builds the layout after validation.
    pub fn build(self) -> DetIdResult<FieldLayout> {
        FieldLayout::new(self.fields)
    }
}

/// Field values unpacked from one identifier, in layout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValues<'a> {
    layout: &'a FieldLayout,
    values: Vec<u32>,
}

impl<'a> FieldValues<'a> {
    /// Returns the layout the values were unpacked with.
    #[must_use]
    pub const fn layout(&self) -> &'a FieldLayout {
        self.layout
    }

    /// Returns the value of the named field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u32> {
        self.layout.field_index(name).map(|i| self.values[i])
    }

    /// Returns the values in field-index order.
    #[must_use]
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Iterates over `(name, value)` pairs in field-index order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, u32)> + '_ {
        self.layout
            .fields
            .iter()
            .zip(&self.values)
            .map(|(field, value)| (field.name(), *value))
    }
}
