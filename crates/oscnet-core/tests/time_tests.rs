//! Time tag tests

use std::time::{Duration, UNIX_EPOCH};

use oscnet_core::time::EPOCH_OFFSET_1900;
use oscnet_core::{codec, Argument, Bundle, Message, Packet, TimeTag};

#[test]
fn test_immediate_is_the_exact_pair() {
    let tag = TimeTag::immediate();
    assert_eq!(tag.seconds(), 0);
    assert_eq!(tag.fraction(), 1);
    assert!(tag.is_immediate());
    assert!(!TimeTag::new(0, 0).is_immediate());
}

#[test]
fn test_immediate_encodes_to_exact_words() {
    let packet = Packet::Bundle(Bundle::immediate(vec![]));
    let encoded = codec::encode(&packet);
    assert_eq!(&encoded[8..12], &0u32.to_be_bytes());
    assert_eq!(&encoded[12..16], &1u32.to_be_bytes());

    match codec::decode(&encoded).unwrap() {
        Packet::Bundle(bundle) => assert!(bundle.time_tag.is_immediate()),
        _ => panic!("expected bundle"),
    }
}

#[test]
fn test_time_tag_argument_roundtrip() {
    let tag = TimeTag::new(0x12345678, 0x9ABCDEF0);
    let packet = Packet::Message(Message::new("/t", vec![Argument::TimeTag(tag)]));
    let decoded = codec::decode(&codec::encode(&packet)).unwrap();
    match decoded {
        Packet::Message(msg) => {
            assert_eq!(msg.arguments()[0], Argument::TimeTag(tag));
        }
        _ => panic!("expected message"),
    }
}

#[test]
fn test_epoch_conversion() {
    // One known calendar instant: 2000-01-01T00:00:00Z = 946684800 Unix
    let date = UNIX_EPOCH + Duration::from_secs(946_684_800);
    let tag = TimeTag::from_system_time(date);
    assert_eq!(tag.seconds() as u64, 946_684_800 + EPOCH_OFFSET_1900);
    assert_eq!(tag.fraction(), 0);
    assert_eq!(tag.to_system_time(), Some(date));
}

#[test]
fn test_fraction_precision() {
    // Half a second is exactly 2^31 fraction units
    let date = UNIX_EPOCH + Duration::from_millis(500);
    let tag = TimeTag::from_system_time(date);
    assert_eq!(tag.fraction(), 1u32 << 31);
}

#[test]
fn test_now_is_not_immediate() {
    let tag = TimeTag::now();
    assert!(!tag.is_immediate());
    assert!(tag.seconds() as u64 > EPOCH_OFFSET_1900);
}

#[test]
fn test_ordering_of_system_times() {
    let early = TimeTag::from_system_time(UNIX_EPOCH + Duration::from_secs(100));
    let late = TimeTag::from_system_time(UNIX_EPOCH + Duration::from_secs(200));
    assert!(early.seconds() < late.seconds());
}

#[test]
fn test_display() {
    assert_eq!(TimeTag::immediate().to_string(), "immediate");
    assert!(TimeTag::new(5, 6).to_string().contains('5'));
}
