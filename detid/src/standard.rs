//! Built-in layouts for the known subdetectors.

use crate::error::DetIdResult;
use crate::field::{FieldLayout, IdField};
use crate::id::{
    subdetector, ECAL_CELL_TYPE_MASK, ECAL_CELL_TYPE_PRECISION, ECAL_CELL_TYPE_SHIFT,
    ECAL_CELL_TYPE_TRIGGER, SUBDETECTOR_SHIFT,
};
use crate::registry::{InterpreterRegistry, Signature};

type FieldSpec = (&'static str, u8, u8);

const TAG_FIELD: FieldSpec = ("subdetector", SUBDETECTOR_SHIFT, 31);

const ECAL_PRECISION: &[FieldSpec] = &[
    TAG_FIELD,
    ("layer", 17, 22),
    ("module", 12, 16),
    ("cell", 0, 11),
];

const ECAL_TRIGGER: &[FieldSpec] = &[
    TAG_FIELD,
    ("layer", 17, 22),
    ("module", 12, 16),
    ("triggercell", 0, 11),
];

const HCAL: &[FieldSpec] = &[
    TAG_FIELD,
    ("section", 18, 20),
    ("layer", 10, 17),
    ("strip", 0, 7),
];

const TRACKER: &[FieldSpec] = &[TAG_FIELD, ("module", 16, 23), ("layer", 0, 7)];

const TRIGGER_SCINT: &[FieldSpec] = &[TAG_FIELD, ("module", 16, 23), ("bar", 0, 7)];

const SIM_SPECIAL: &[FieldSpec] = &[TAG_FIELD, ("subtype", 22, 25), ("subpayload", 0, 21)];

/// The `subdetector` + `payload` layout every identifier can fall back to.
pub(crate) fn generic_layout() -> FieldLayout {
    // Disjoint and in range by construction.
    let fields = vec![
        IdField::new(TAG_FIELD.0, TAG_FIELD.1, TAG_FIELD.2),
        IdField::new("payload", 0, SUBDETECTOR_SHIFT - 1),
    ];
    FieldLayout::from_trusted(fields)
}

fn layout(specs: &[FieldSpec]) -> DetIdResult<FieldLayout> {
    FieldLayout::new(
        specs
            .iter()
            .map(|(name, start, end)| IdField::new(*name, *start, *end))
            .collect(),
    )
}

/// Registers every built-in layout.
pub(crate) fn register_standard_layouts(registry: &mut InterpreterRegistry) -> DetIdResult<()> {
    let cell_type_mask = ECAL_CELL_TYPE_MASK << ECAL_CELL_TYPE_SHIFT;
    registry.register_with_signature(
        subdetector::ECAL,
        Signature::new(
            cell_type_mask,
            ECAL_CELL_TYPE_PRECISION << ECAL_CELL_TYPE_SHIFT,
        ),
        layout(ECAL_PRECISION)?,
    )?;
    registry.register_with_signature(
        subdetector::ECAL,
        Signature::new(cell_type_mask, ECAL_CELL_TYPE_TRIGGER << ECAL_CELL_TYPE_SHIFT),
        layout(ECAL_TRIGGER)?,
    )?;
    registry.register(subdetector::HCAL, layout(HCAL)?)?;
    registry.register(subdetector::TRACKER_TAGGER, layout(TRACKER)?)?;
    registry.register(subdetector::TRACKER_RECOIL, layout(TRACKER)?)?;
    registry.register(subdetector::TRIGGER_SCINT, layout(TRIGGER_SCINT)?)?;
    registry.register(subdetector::SIM_SPECIAL, layout(SIM_SPECIAL)?)?;
    Ok(())
}
