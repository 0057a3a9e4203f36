//! The packed 32-bit identifier.

use std::fmt;

/// Bit position of the subdetector tag.
pub const SUBDETECTOR_SHIFT: u8 = 26;

/// Mask of the subdetector tag (before shifting).
pub const SUBDETECTOR_MASK: u32 = 0x3F;

/// Subdetector tags carried in the top six bits of every identifier.
pub mod subdetector {
    /// No subdetector; also the tag of the generic layout.
    pub const NULL: u8 = 0;
    /// Tagger tracker.
    pub const TRACKER_TAGGER: u8 = 1;
    /// Trigger scintillator pads.
    pub const TRIGGER_SCINT: u8 = 2;
    /// Recoil tracker.
    pub const TRACKER_RECOIL: u8 = 4;
    /// Electromagnetic calorimeter.
    pub const ECAL: u8 = 5;
    /// Hadronic calorimeter.
    pub const HCAL: u8 = 6;
    /// Simulation-only special identifiers.
    pub const SIM_SPECIAL: u8 = 7;
}

/// Bit position of the ECal cell-type selector.
pub const ECAL_CELL_TYPE_SHIFT: u8 = 24;

/// Mask of the ECal cell-type selector (before shifting).
pub const ECAL_CELL_TYPE_MASK: u32 = 0x3;

/// ECal cell-type value for precision readout cells.
pub const ECAL_CELL_TYPE_PRECISION: u32 = 0;

/// ECal cell-type value for trigger cells.
pub const ECAL_CELL_TYPE_TRIGGER: u32 = 1;

/// A raw packed detector identifier.
///
/// The top six bits hold the subdetector tag; the remaining 26 bits are a
/// payload whose meaning depends on the subdetector (see
/// [`InterpreterRegistry`](crate::InterpreterRegistry)).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DetectorId(u32);

impl DetectorId {
    /// The null identifier.
    pub const NULL: Self = Self(0);

    /// Creates an identifier from its raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Creates an identifier from a subdetector tag and a 26-bit payload.
    ///
    /// Payload bits above bit 25 are discarded.
    #[must_use]
    pub const fn from_parts(tag: u8, payload: u32) -> Self {
        Self(
            ((tag as u32 & SUBDETECTOR_MASK) << SUBDETECTOR_SHIFT)
                | (payload & ((1 << SUBDETECTOR_SHIFT) - 1)),
        )
    }

    /// ECal precision cell identifier.
    #[must_use]
    pub const fn ecal(layer: u32, module: u32, cell: u32) -> Self {
        Self::from_parts(
            subdetector::ECAL,
            ((layer & 0x3F) << 17) | ((module & 0x1F) << 12) | (cell & 0xFFF),
        )
    }

    /// ECal trigger cell identifier.
    #[must_use]
    pub const fn ecal_trigger(layer: u32, module: u32, cell: u32) -> Self {
        Self::from_parts(
            subdetector::ECAL,
            (ECAL_CELL_TYPE_TRIGGER << ECAL_CELL_TYPE_SHIFT)
                | ((layer & 0x3F) << 17)
                | ((module & 0x1F) << 12)
                | (cell & 0xFFF),
        )
    }

    /// HCal strip identifier.
    #[must_use]
    pub const fn hcal(section: u32, layer: u32, strip: u32) -> Self {
        Self::from_parts(
            subdetector::HCAL,
            ((section & 0x7) << 18) | ((layer & 0xFF) << 10) | (strip & 0xFF),
        )
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the subdetector tag.
    #[must_use]
    pub const fn subdetector(self) -> u8 {
        ((self.0 >> SUBDETECTOR_SHIFT) & SUBDETECTOR_MASK) as u8
    }

    /// Returns the 26-bit payload below the tag.
    #[must_use]
    pub const fn payload(self) -> u32 {
        self.0 & ((1 << SUBDETECTOR_SHIFT) - 1)
    }

    /// Returns `true` for the null identifier.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns the identifier with only the bits in `mask` retained.
    #[must_use]
    pub const fn masked(self, mask: u32) -> Self {
        Self(self.0 & mask)
    }
}

impl From<u32> for DetectorId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<DetectorId> for u32 {
    fn from(id: DetectorId) -> Self {
        id.0
    }
}

impl fmt::Debug for DetectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DetectorId(0x{:08x})", self.0)
    }
}

impl fmt::Display for DetectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::LowerHex for DetectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecal_id_packs_expected_raw() {
        assert_eq!(DetectorId::ecal(1, 1, 10).raw(), 0x1402_100a);
        assert_eq!(DetectorId::ecal(1, 1, 50).raw(), 0x1402_1032);
    }

    #[test]
    fn subdetector_and_payload() {
        let id = DetectorId::ecal(1, 1, 10);
        assert_eq!(id.subdetector(), subdetector::ECAL);
        assert_eq!(id.payload(), 0x0002_100a);
    }

    #[test]
    fn from_parts_discards_high_payload_bits() {
        let id = DetectorId::from_parts(subdetector::HCAL, 0xFFFF_FFFF);
        assert_eq!(id.subdetector(), subdetector::HCAL);
        assert_eq!(id.payload(), 0x03FF_FFFF);
    }

    #[test]
    fn trigger_cells_differ_from_precision_cells() {
        let precision = DetectorId::ecal(3, 2, 7);
        let trigger = DetectorId::ecal_trigger(3, 2, 7);
        assert_ne!(precision, trigger);
        assert_eq!(precision.subdetector(), trigger.subdetector());
    }

    #[test]
    fn masked_keeps_selected_bits() {
        let id = DetectorId::new(0x1402_100a);
        assert_eq!(id.masked(0xFFFF_0000).raw(), 0x1402_0000);
        assert!(id.masked(0).is_null());
    }

    #[test]
    fn display_is_fixed_width_hex() {
        assert_eq!(DetectorId::new(0xa).to_string(), "0x0000000a");
        assert_eq!(format!("{:?}", DetectorId::new(0xa)), "DetectorId(0x0000000a)");
    }

    #[test]
    fn u32_conversions() {
        let id: DetectorId = 42u32.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 42);
    }
}
