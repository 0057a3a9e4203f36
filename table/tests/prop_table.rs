use std::collections::BTreeMap;
use std::io::Cursor;

use detid::DetectorId;
use proptest::prelude::*;
use table::{decode, encode_to_string, IntegerTable};

fn rows_strategy() -> impl Strategy<Value = Vec<(u32, [i32; 2])>> {
    prop::collection::vec((any::<u32>(), any::<[i32; 2]>()), 0..64)
}

proptest! {
    #[test]
    fn prop_keys_stay_sorted_and_unique(rows in rows_strategy(), mask in any::<u32>()) {
        let mut table = IntegerTable::new("T", ["a", "b"]);
        table.set_id_mask(mask);
        let mut expected = BTreeMap::new();

        for (id, row) in &rows {
            let inserted = table.add(*id, row).is_ok();
            let fresh = !expected.contains_key(&(id & mask));
            prop_assert_eq!(inserted, fresh);
            expected.entry(id & mask).or_insert(*row);
        }

        prop_assert!(table.keys().windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(table.row_count(), expected.len());
        for (index, (key, row)) in expected.iter().enumerate() {
            prop_assert_eq!(table.find(*key), Some(index));
            prop_assert_eq!(table.row_for(*key).unwrap(), &row[..]);
        }
    }

    #[test]
    fn prop_find_matches_linear_scan(rows in rows_strategy(), probe in any::<u32>()) {
        let mut table = IntegerTable::new("T", ["a", "b"]);
        for (id, row) in &rows {
            let _ = table.add(*id, row);
        }
        let linear = table.keys().iter().position(|key| *key == DetectorId::new(probe));
        prop_assert_eq!(table.find(probe), linear);
        let point = table.find_insertion_point(probe);
        prop_assert!(table.keys()[..point].iter().all(|key| key.raw() < probe));
        prop_assert!(table.keys()[point..].iter().all(|key| key.raw() >= probe));
    }

    #[test]
    fn prop_encode_decode_round_trip(rows in rows_strategy()) {
        let mut original = IntegerTable::new("T", ["a", "b"]);
        for (id, row) in &rows {
            if *id != 0 {
                let _ = original.add(*id, row);
            }
        }
        let text = encode_to_string(&original, None);
        let mut copy = IntegerTable::new("T", ["a", "b"]);
        decode(&mut copy, Cursor::new(text)).unwrap();
        prop_assert_eq!(copy, original);
    }
}
