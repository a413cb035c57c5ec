// tests/props.rs

#![cfg(test)]

use bitlens::{Bits, FindOpts, Kind, Value};
use proptest::prelude::*;

fn arb_bits(max_len: usize) -> impl Strategy<Value = Bits> {
    prop::collection::vec(any::<bool>(), 0..max_len).prop_map(Bits::from_bools)
}

//
// -----------------------------------------------------------------------------
// Container Properties
// -----------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_reverse_is_involution(bits in arb_bits(256)) {
        prop_assert_eq!(bits.reversed().reversed(), bits);
    }
}

proptest! {
    #[test]
    fn prop_not_is_involution(bits in arb_bits(256)) {
        prop_assume!(!bits.is_empty());
        prop_assert_eq!(bits.not().unwrap().not().unwrap(), bits);
    }
}

proptest! {
    #[test]
    fn prop_split_concat_identity(bits in arb_bits(256), at in 0usize..257) {
        let at = at.min(bits.len());
        let head = bits.slice(0..at).unwrap();
        let tail = bits.slice(at..bits.len()).unwrap();
        prop_assert_eq!(head.concat(&tail), bits);
    }
}

proptest! {
    #[test]
    fn prop_slice_step_reverse_matches(bits in arb_bits(128)) {
        prop_assert_eq!(bits.slice_step(None, None, -1).unwrap(), bits.reversed());
    }
}

proptest! {
    #[test]
    fn prop_count_partitions_length(bits in arb_bits(512)) {
        prop_assert_eq!(bits.count(true) + bits.count(false), bits.len());
    }
}

//
// -----------------------------------------------------------------------------
// Codec Round-Trips
// -----------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_uint_round_trip(value in any::<u64>(), extra in 0usize..32) {
        let width = 64 - value.leading_zeros() as usize;
        let len = width.max(1) + extra;
        let bits = Bits::from_uint(value.into(), len).unwrap();
        prop_assert_eq!(bits.len(), len);
        prop_assert_eq!(bits.uint().unwrap(), u128::from(value));
    }
}

proptest! {
    #[test]
    fn prop_int_round_trip(value in any::<i32>()) {
        let bits = Bits::from_int(value.into(), 33).unwrap();
        prop_assert_eq!(bits.int().unwrap(), i128::from(value));
    }
}

proptest! {
    #[test]
    fn prop_endian_byte_reorder(value in any::<u32>()) {
        let be = bitlens::codec::encode(Kind::UintBe, &Value::Uint(value.into()), Some(32)).unwrap();
        let le = bitlens::codec::encode(Kind::UintLe, &Value::Uint(value.into()), Some(32)).unwrap();
        let mut be_bytes = be.to_bytes().unwrap();
        be_bytes.reverse();
        prop_assert_eq!(be_bytes, le.to_bytes().unwrap());
    }
}

proptest! {
    #[test]
    fn prop_hex_round_trip(bytes in prop::collection::vec(any::<u8>(), 1..32)) {
        let bits = Bits::from_bytes(&bytes);
        let hex = bits.hex().unwrap();
        let back = Bits::from_spec(&format!("0x{hex}")).unwrap();
        prop_assert_eq!(back, bits);
    }
}

proptest! {
    #[test]
    fn prop_float64_round_trip(value in any::<f64>()) {
        prop_assume!(!value.is_nan());
        let bits = Bits::from_float(value, 64).unwrap();
        prop_assert_eq!(bits.interpret(Kind::FloatBe).unwrap(), Value::Float(value));
    }
}

//
// -----------------------------------------------------------------------------
// Exp-Golomb Round-Trips
// -----------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_ue_round_trip(value in 0u64..1_000_000_000) {
        let code = bitlens::codec::encode(Kind::Ue, &Value::Uint(value.into()), None).unwrap();
        let decoded = code.interpret(Kind::Ue).unwrap();
        prop_assert_eq!(decoded, Value::Uint(value.into()));
    }
}

proptest! {
    #[test]
    fn prop_se_round_trip(value in -1_000_000i64..1_000_000) {
        let code = bitlens::codec::encode(Kind::Se, &Value::Int(value.into()), None).unwrap();
        let decoded = code.interpret(Kind::Se).unwrap();
        prop_assert_eq!(decoded, Value::Int(value.into()));
    }
}

proptest! {
    #[test]
    fn prop_uie_round_trip(value in 0u64..1_000_000_000) {
        let code = bitlens::codec::encode(Kind::Uie, &Value::Uint(value.into()), None).unwrap();
        let decoded = code.interpret(Kind::Uie).unwrap();
        prop_assert_eq!(decoded, Value::Uint(value.into()));
    }
}

proptest! {
    #[test]
    fn prop_sie_round_trip(value in -1_000_000i64..1_000_000) {
        let code = bitlens::codec::encode(Kind::Sie, &Value::Int(value.into()), None).unwrap();
        let decoded = code.interpret(Kind::Sie).unwrap();
        prop_assert_eq!(decoded, Value::Int(value.into()));
    }
}

proptest! {
    #[test]
    fn prop_golomb_streams_concatenate(values in prop::collection::vec(0u64..100_000, 1..20)) {
        let typed: Vec<Value> = values.iter().map(|&v| Value::Uint(v.into())).collect();
        let spec = vec!["ue"; values.len()].join(", ");
        let packed = bitlens::pack(&spec, &typed).unwrap();
        let decoded = packed.unpack(&spec).unwrap();
        prop_assert_eq!(decoded, typed);
    }
}

//
// -----------------------------------------------------------------------------
// Search Properties
// -----------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_find_result_matches(h in arb_bits(128), n in arb_bits(8)) {
        prop_assume!(!n.is_empty());
        if let Some(p) = h.find(&n, FindOpts::default()).unwrap() {
            prop_assert_eq!(h.slice(p..p + n.len()).unwrap(), n);
        }
    }
}

proptest! {
    #[test]
    fn prop_rfind_is_maximum(h in arb_bits(96), n in arb_bits(6)) {
        prop_assume!(!n.is_empty() && n.len() <= h.len());
        let brute = (0..=h.len() - n.len())
            .filter(|&p| h.slice(p..p + n.len()).unwrap() == n)
            .max();
        prop_assert_eq!(h.rfind(&n, FindOpts::default()).unwrap(), brute);
    }
}

proptest! {
    #[test]
    fn prop_find_all_ascending_and_complete(h in arb_bits(96), n in arb_bits(6)) {
        prop_assume!(!n.is_empty() && n.len() <= h.len());
        let hits: Vec<usize> = h.find_all(&n, FindOpts::default(), None).unwrap().collect();
        let brute: Vec<usize> = (0..=h.len() - n.len())
            .filter(|&p| h.slice(p..p + n.len()).unwrap() == n)
            .collect();
        prop_assert_eq!(hits, brute);
    }
}

proptest! {
    #[test]
    fn prop_split_chunks_rejoin(h in arb_bits(96), d in arb_bits(5)) {
        prop_assume!(!d.is_empty());
        let chunks: Vec<Bits> = h.split(&d, FindOpts::default(), None).unwrap().collect();
        let mut joined = Bits::new();
        for chunk in &chunks {
            joined = joined.concat(chunk);
        }
        prop_assert_eq!(joined, h);
    }
}

//
// -----------------------------------------------------------------------------
// Byte Export
// -----------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_byte_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let bits = Bits::from_bytes(&bytes);
        prop_assert_eq!(bits.to_bytes().unwrap(), bytes);
    }
}

proptest! {
    #[test]
    fn prop_padded_export_appends_zeros(bits in arb_bits(64)) {
        let padded = bits.to_bytes_padded();
        let reloaded = Bits::from_bytes(&padded);
        prop_assert_eq!(reloaded.slice(0..bits.len()).unwrap(), bits.clone());
        // Every bit past the original length is zero.
        let tail = reloaded.slice(bits.len()..reloaded.len()).unwrap();
        prop_assert_eq!(tail.count(true), 0);
    }
}
