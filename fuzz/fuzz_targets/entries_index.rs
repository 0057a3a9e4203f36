#![no_main]

use conditions::{ConditionDef, ConditionsResolver, RunContext};
use libfuzzer_sys::fuzz_target;
use table::ValueKind;

fuzz_target!(|data: &[u8]| {
    let mut resolver = ConditionsResolver::default();
    if resolver
        .define(ConditionDef::new("fuzz", ValueKind::Integer, ["A"]))
        .is_err()
    {
        return;
    }
    if resolver.load_index("fuzz", data).is_ok() {
        let run = data.first().copied().map_or(0, u32::from);
        let _ = resolver.resolved_window("fuzz", RunContext::data(run));
        let _ = resolver.resolved_window("fuzz", RunContext::simulation(run));
    }
});
