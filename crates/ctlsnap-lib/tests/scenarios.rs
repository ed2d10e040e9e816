//! Integration tests: end-to-end enumeration scenarios using MockDevice.
//!
//! These tests go through the public API only: a scripted device is opened,
//! enumerated, and serialized the way a host caller would see it.

use ctlsnap_lib::descriptor::ControlType;
use ctlsnap_lib::device::mock::{MockDevice, MockElement};
use ctlsnap_lib::enumerate::{EnumerationError, list_controls_with};
use ctlsnap_lib::value::{ControlValue, ElementValue};
use serde_json::json;

fn list(elements: Vec<MockElement>) -> Vec<ctlsnap_lib::ControlRecord> {
    list_controls_with("hw:0", move |name| {
        Ok(MockDevice::with_elements(name, elements))
    })
    .unwrap()
}

/// A mixer resembling a small USB interface.
fn mixer() -> Vec<MockElement> {
    let iec958 = MockElement::new("IEC958 Playback Default", 5, &[0]);
    vec![
        MockElement::boolean("Mute", &[true]),
        MockElement::integer("Volume", 0, 100, 1, &[75]),
        MockElement::enumerated("Source", &["Mic", "Line", "Digital"], &[1]),
        MockElement::integer("Master Playback Volume", 0, 87, 1, &[10, 20]),
        MockElement::boolean("Capture Switch", &[true, false]).unreadable(),
        MockElement::integer64("Sample Counter", 0, i64::MAX, 1, &[1 << 40]),
        iec958,
    ]
}

// ── Scenario: single elements ──

#[test]
fn mute_boolean() {
    let records = list(vec![MockElement::boolean("Mute", &[true])]);
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([{"name": "Mute", "type": "BOOLEAN", "value": true}])
    );
}

#[test]
fn volume_integer() {
    let records = list(vec![MockElement::integer("Volume", 0, 100, 1, &[75])]);
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([{
            "name": "Volume", "type": "INTEGER",
            "min": 0, "max": 100, "step": 1, "value": 75
        }])
    );
}

#[test]
fn source_enumerated() {
    let records = list(vec![MockElement::enumerated(
        "Source",
        &["Mic", "Line", "Digital"],
        &[1],
    )]);
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([{
            "name": "Source", "type": "ENUMERATED",
            "items": ["Mic", "Line", "Digital"], "value": 1
        }])
    );
}

#[test]
fn two_channel_integer() {
    let records = list(vec![MockElement::integer("PCM", 0, 255, 1, &[10, 20])]);
    assert_eq!(
        records[0].value,
        Some(ElementValue::Sequence(vec![
            ControlValue::Number(10),
            ControlValue::Number(20)
        ]))
    );
}

// ── Scenario: fatal errors ──

#[test]
fn empty_name_is_argument_error_without_open() {
    let mut opened = false;
    let err = list_controls_with("", |name| {
        opened = true;
        Ok(MockDevice::new(name))
    })
    .unwrap_err();
    assert!(matches!(err, EnumerationError::InvalidArgument(_)));
    assert!(!opened);
}

#[test]
fn load_failure_closes_device_once() {
    let mut dev = MockDevice::with_elements("hw:0", mixer());
    dev.fail_load = true;
    let closes = dev.close_counter();

    let result = list_controls_with("hw:0", move |_| Ok(dev));
    assert!(matches!(result, Err(EnumerationError::LoadFailed { .. })));
    assert_eq!(closes.get(), 1);
}

// ── Properties over a whole mixer ──

#[test]
fn length_and_order_match_device() {
    let elements = mixer();
    let expected: Vec<String> = elements.iter().map(|e| e.name.clone()).collect();
    let records = list(elements);
    let names: Vec<String> = records.iter().map(|r| r.descriptor.name.clone()).collect();
    assert_eq!(names, expected);
}

#[test]
fn bounds_are_well_formed() {
    for r in list(mixer()) {
        if matches!(
            r.descriptor.kind,
            ControlType::Integer | ControlType::Integer64
        ) {
            let b = r.descriptor.bounds().expect("integer types carry bounds");
            assert!(b.min <= b.max, "{}", r.descriptor.name);
            assert!(b.step >= 0, "{}", r.descriptor.name);
        } else {
            assert!(r.descriptor.bounds().is_none(), "{}", r.descriptor.name);
        }
    }
}

#[test]
fn enumerated_items_are_complete() {
    for r in list(mixer()) {
        match r.descriptor.kind {
            ControlType::Enumerated => {
                let items = r.descriptor.items().unwrap();
                assert_eq!(items.len(), 3);
                assert!(items.iter().flatten().all(|name| !name.is_empty()));
            }
            _ => assert!(r.descriptor.items().is_none()),
        }
    }
}

#[test]
fn unreadable_records_have_no_value() {
    for r in list(mixer()) {
        if !r.descriptor.readable {
            assert!(r.value.is_none(), "{}", r.descriptor.name);
        }
    }
}

#[test]
fn multi_slot_values_match_count() {
    for r in list(mixer()) {
        if r.descriptor.readable && r.descriptor.count > 1 {
            match &r.value {
                Some(ElementValue::Sequence(values)) => {
                    assert_eq!(values.len(), r.descriptor.count as usize)
                }
                other => panic!("{}: expected sequence, got {other:?}", r.descriptor.name),
            }
        }
    }
}

#[test]
fn iec958_value_is_null() {
    let records = list(mixer());
    let iec = records
        .iter()
        .find(|r| r.descriptor.kind == ControlType::Iec958)
        .unwrap();
    assert_eq!(iec.value, Some(ElementValue::Scalar(ControlValue::Null)));
    assert_eq!(
        serde_json::to_value(iec).unwrap(),
        json!({"name": "IEC958 Playback Default", "type": "IEC958", "value": null})
    );
}

#[test]
fn repeated_listing_is_identical() {
    assert_eq!(list(mixer()), list(mixer()));
}
