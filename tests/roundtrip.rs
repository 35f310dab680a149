//! Property-based tests for both encoding paths.

use bytes::BytesMut;
use proptest::prelude::*;

use structwire::protocol::{BinaryProtocol, ProtocolConfig, ProtocolError, WireType};
use structwire::reflect::{decode_generic, encode_generic};
use structwire::sample::{decode_explicit, encode_explicit, SampleStruct, SAMPLE_DESCRIPTOR};

/// Strategy for generating arbitrary `SampleStruct` instances.
fn arb_sample() -> impl Strategy<Value = SampleStruct> {
    (
        ".*",
        any::<i32>(),
        prop::collection::vec(".{0,16}", 0..10),
    )
        .prop_map(|(string, int, string_list)| SampleStruct {
            string,
            int,
            string_list,
        })
}

fn arb_protocol() -> impl Strategy<Value = BinaryProtocol> {
    (any::<bool>(), any::<bool>())
        .prop_map(|(strict_write, strict_read)| {
            BinaryProtocol::new(ProtocolConfig::new(strict_write, strict_read))
        })
}

fn encode_both(protocol: &BinaryProtocol, value: &SampleStruct) -> (BytesMut, BytesMut) {
    let mut generic = BytesMut::new();
    encode_generic(protocol, value, &SAMPLE_DESCRIPTOR, &mut generic)
        .expect("generic encoding should succeed");
    let mut explicit = BytesMut::new();
    encode_explicit(protocol, value, &mut explicit).expect("explicit encoding should succeed");
    (generic, explicit)
}

proptest! {
    #[test]
    fn paths_produce_identical_bytes(value in arb_sample(), protocol in arb_protocol()) {
        let (generic, explicit) = encode_both(&protocol, &value);
        prop_assert_eq!(generic, explicit);
    }

    #[test]
    fn generic_roundtrip(value in arb_sample()) {
        let protocol = BinaryProtocol::default();
        let (bytes, _) = encode_both(&protocol, &value);

        let mut src = &bytes[..];
        let decoded: SampleStruct = decode_generic(&protocol, &SAMPLE_DESCRIPTOR, &mut src)
            .expect("decoding should succeed");
        prop_assert_eq!(decoded, value);
        prop_assert!(src.is_empty());
    }

    #[test]
    fn explicit_roundtrip(value in arb_sample()) {
        let protocol = BinaryProtocol::default();
        let (_, bytes) = encode_both(&protocol, &value);

        let mut src = &bytes[..];
        let decoded = decode_explicit(&protocol, &mut src).expect("decoding should succeed");
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn encoding_is_deterministic(value in arb_sample()) {
        let protocol = BinaryProtocol::default();
        let (first, _) = encode_both(&protocol, &value);
        let (second, _) = encode_both(&protocol, &value);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_truncation_fails(value in arb_sample(), cut in any::<prop::sample::Index>()) {
        let protocol = BinaryProtocol::default();
        let (bytes, _) = encode_both(&protocol, &value);
        let len = cut.index(bytes.len());

        let mut src = &bytes[..len];
        let generic = decode_generic::<SampleStruct, _>(&protocol, &SAMPLE_DESCRIPTOR, &mut src);
        let generic_ended = matches!(generic, Err(ProtocolError::UnexpectedEndOfData { .. }));
        prop_assert!(generic_ended, "expected end of data, got {:?}", generic);

        let mut src = &bytes[..len];
        let explicit = decode_explicit(&protocol, &mut src);
        let explicit_ended = matches!(explicit, Err(ProtocolError::UnexpectedEndOfData { .. }));
        prop_assert!(explicit_ended, "expected end of data, got {:?}", explicit);
    }
}

#[test]
fn unknown_fields_are_skipped_by_both_paths() {
    let protocol = BinaryProtocol::default();
    let mut buf = BytesMut::new();

    protocol.write_field_begin(&mut buf, 40, WireType::I32).unwrap();
    protocol.write_i32(&mut buf, 7).unwrap();
    protocol.write_field_begin(&mut buf, 3, WireType::List).unwrap();
    protocol.write_list_begin(&mut buf, WireType::String, 0).unwrap();
    protocol.write_field_begin(&mut buf, 2, WireType::I32).unwrap();
    protocol.write_i32(&mut buf, -9).unwrap();
    protocol.write_field_begin(&mut buf, 41, WireType::String).unwrap();
    protocol.write_string(&mut buf, "ignored").unwrap();
    protocol.write_field_begin(&mut buf, 1, WireType::String).unwrap();
    protocol.write_string(&mut buf, "").unwrap();
    protocol.write_field_stop(&mut buf).unwrap();

    let expected = SampleStruct {
        string: String::new(),
        int: -9,
        string_list: Vec::new(),
    };

    let mut src = &buf[..];
    let generic: SampleStruct = decode_generic(&protocol, &SAMPLE_DESCRIPTOR, &mut src).unwrap();
    assert_eq!(generic, expected);

    let mut src = &buf[..];
    assert_eq!(decode_explicit(&protocol, &mut src).unwrap(), expected);
}

#[test]
fn empty_values_take_no_payload_bytes() {
    let protocol = BinaryProtocol::default();
    let (bytes, _) = encode_both(&protocol, &SampleStruct::default());

    // three field headers, two zero lengths/counts, one i32, list element tag, stop
    assert_eq!(bytes.len(), 3 * 3 + 4 + 4 + 1 + 4 + 1);
}

#[test]
fn encoders_reject_what_decoders_reject() {
    let protocol = BinaryProtocol::new(ProtocolConfig {
        max_list_len: 2,
        ..Default::default()
    });
    let mut value = SampleStruct {
        string: "s".to_string(),
        int: 1,
        string_list: vec!["a".to_string(), "b".to_string()],
    };

    // At the limit both paths round trip
    let (generic, explicit) = encode_both(&protocol, &value);
    assert_eq!(generic, explicit);
    let mut src = &generic[..];
    let decoded: SampleStruct = decode_generic(&protocol, &SAMPLE_DESCRIPTOR, &mut src).unwrap();
    assert_eq!(decoded, value);

    // One past it neither path writes a list its own decoder would refuse
    value.string_list.push("c".to_string());
    let mut buf = BytesMut::new();
    assert_eq!(
        encode_generic(&protocol, &value, &SAMPLE_DESCRIPTOR, &mut buf),
        Err(ProtocolError::MalformedLength(3))
    );
    let mut buf = BytesMut::new();
    assert_eq!(
        encode_explicit(&protocol, &value, &mut buf),
        Err(ProtocolError::MalformedLength(3))
    );
}
