use detid::{subdetector, DetectorId, InterpreterRegistry};

fn registry() -> InterpreterRegistry {
    InterpreterRegistry::with_standard_layouts().unwrap()
}

#[test]
fn ecal_precision_fields() {
    let registry = registry();
    let fields = registry.unpack(DetectorId::ecal(1, 1, 10));
    let pairs: Vec<(&str, u32)> = fields.iter().collect();
    assert_eq!(
        pairs,
        [("subdetector", 5), ("layer", 1), ("module", 1), ("cell", 10)]
    );
}

#[test]
fn ecal_trigger_cells_use_trigger_layout() {
    let registry = registry();
    let fields = registry.unpack(DetectorId::ecal_trigger(4, 2, 17));
    assert_eq!(fields.get("triggercell"), Some(17));
    assert_eq!(fields.get("cell"), None);
    assert_eq!(fields.get("layer"), Some(4));
}

#[test]
fn unregistered_ecal_cell_type_falls_back_to_generic() {
    let registry = registry();
    let id = DetectorId::from_parts(subdetector::ECAL, 3 << 24);
    let fields = registry.unpack(id);
    assert_eq!(fields.get("payload"), Some(3 << 24));
}

#[test]
fn hcal_fields() {
    let registry = registry();
    let fields = registry.unpack(DetectorId::hcal(1, 1, 5));
    assert_eq!(fields.get("section"), Some(1));
    assert_eq!(fields.get("layer"), Some(1));
    assert_eq!(fields.get("strip"), Some(5));
}

#[test]
fn null_tag_uses_generic_layout() {
    let registry = registry();
    let fields = registry.unpack(DetectorId::new(292));
    assert_eq!(fields.get("subdetector"), Some(0));
    assert_eq!(fields.get("payload"), Some(292));
}

#[test]
fn pack_hcal_from_names() {
    let registry = registry();
    let id = registry
        .pack(subdetector::HCAL, [("section", 1), ("layer", 1), ("strip", 5)])
        .unwrap();
    assert_eq!(id, DetectorId::hcal(1, 1, 5));
}

#[test]
fn duplicate_standard_registration_rejected() {
    let mut registry = registry();
    let layout = registry.lookup_tag(subdetector::HCAL).clone();
    assert!(registry.register(subdetector::HCAL, layout).is_err());
}
