use lumenwall_core::ehub::{decode, encode_config, encode_update, HEADER_LEN};
use lumenwall_core::{ConfigRange, EntityUpdate, Frame, ProtocolError};
use proptest::prelude::*;

fn entity() -> impl Strategy<Value = EntityUpdate> {
    (any::<u16>(), any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>())
        .prop_map(|(id, r, g, b, w)| EntityUpdate::new(id, r, g, b, w))
}

fn range() -> impl Strategy<Value = ConfigRange> {
    (any::<u16>(), any::<u16>(), any::<u16>(), any::<u16>())
        .prop_map(|(si, se, ei, ee)| ConfigRange::new(si, se, ei, ee))
}

proptest! {
    #[test]
    fn update_roundtrip(universe in any::<u8>(), entities in prop::collection::vec(entity(), 0..2000)) {
        let packet = encode_update(universe, &entities).unwrap();
        let frame = decode(&packet).unwrap();
        prop_assert_eq!(frame, Frame::Update { universe, entities });
    }

    #[test]
    fn config_roundtrip(universe in any::<u8>(), ranges in prop::collection::vec(range(), 0..500)) {
        let packet = encode_config(universe, &ranges).unwrap();
        let frame = decode(&packet).unwrap();
        prop_assert_eq!(frame, Frame::Config { universe, ranges });
    }

    #[test]
    fn decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode(&data);
    }

    #[test]
    fn foreign_magic_is_rejected(prefix in prop::array::uniform4(any::<u8>()), tail in prop::collection::vec(any::<u8>(), 6..64)) {
        prop_assume!(&prefix != b"eHuB");
        let mut data = prefix.to_vec();
        data.extend_from_slice(&tail);
        prop_assert_eq!(decode(&data), Err(ProtocolError::BadMagic));
    }

    #[test]
    fn overstated_comp_len_is_truncated(entities in prop::collection::vec(entity(), 1..50), extra in 1u16..1000) {
        let mut packet = encode_update(0, &entities).unwrap();
        let comp_len = u16::from_le_bytes([packet[8], packet[9]]);
        prop_assume!(comp_len.checked_add(extra).is_some());
        let claimed = comp_len + extra;
        packet[8..10].copy_from_slice(&claimed.to_le_bytes());

        let result = decode(&packet);
        prop_assert_eq!(
            result,
            Err(ProtocolError::TruncatedPayload {
                expected: claimed as usize,
                available: packet.len() - HEADER_LEN,
            })
        );
    }
}

#[test]
fn test_generator_style_fill_frame() {
    // what a "fill all" generator emits: every id of the wall in one colour
    let entities: Vec<EntityUpdate> = (100..=4000)
        .map(|id| EntityUpdate::new(id, 255, 80, 0, 0))
        .collect();

    let packet = encode_update(0, &entities).unwrap();
    assert!(packet.len() < 65_507, "must fit one UDP datagram");

    match decode(&packet).unwrap() {
        Frame::Update { entities: decoded, .. } => assert_eq!(decoded, entities),
        other => panic!("expected update, got {:?}", other),
    }
}
