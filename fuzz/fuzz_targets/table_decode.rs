#![no_main]

use detid::InterpreterRegistry;
use libfuzzer_sys::fuzz_target;
use table::{decode, decode_with_registry, encode_to_string, DoubleTable, IntegerTable};

fuzz_target!(|data: &[u8]| {
    // First byte picks the decoder; the rest is the table text.
    let Some((&mode, text)) = data.split_first() else {
        return;
    };

    let mut ints = IntegerTable::new("fuzz", ["A", "B"]);
    let mut doubles = DoubleTable::new("fuzz", ["A"]);
    if mode & 1 == 0 {
        let _ = decode(&mut ints, text);
        let _ = decode(&mut doubles, text);
    } else if let Ok(registry) = InterpreterRegistry::with_standard_layouts() {
        let _ = decode_with_registry(&mut ints, text, &registry);
        let _ = decode_with_registry(&mut doubles, text, &registry);
    }

    // Whatever decoded must survive a re-encode and decode unchanged. A
    // packed null id is dropped on the second pass.
    if ints.find(0u32).is_some() {
        return;
    }
    let image = encode_to_string(&ints, None);
    let mut again = IntegerTable::new("fuzz", ["A", "B"]);
    if decode(&mut again, image.as_bytes()).is_ok() {
        assert_eq!(again, ints);
    }
});
