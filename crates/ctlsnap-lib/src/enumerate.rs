//! Control enumeration: open a device, describe and read every element.
//!
//! The device is owned by the enumeration call and released when it goes out
//! of scope, so it is closed exactly once whether the call succeeds, fails to
//! load, or bails out early. Faults on a single element never abort the
//! listing: an element whose descriptor cannot be read is skipped, and an
//! element whose value cannot be read is kept without a value.

use std::fmt;

use serde::Serialize;

use crate::descriptor::{self, ControlDescriptor, Metadata};
use crate::device::{self, ControlDevice, DeviceError};
use crate::value::{self, ElementValue};

/// One element: its descriptor plus the marshaled value, if it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRecord {
    pub descriptor: ControlDescriptor,
    pub value: Option<ElementValue>,
}

/// Wire shape of a [`ControlRecord`].
#[derive(Serialize)]
struct RecordJson<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    type_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<&'a [Option<String>]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a ElementValue>,
}

impl Serialize for ControlRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let d = &self.descriptor;
        let bounds = d.bounds();
        let items = match &d.metadata {
            Metadata::Items(items) => Some(items.as_slice()),
            Metadata::None | Metadata::Bounds(_) => None,
        };
        RecordJson {
            name: &d.name,
            type_name: &d.type_name,
            min: bounds.map(|b| b.min),
            max: bounds.map(|b| b.max),
            step: bounds.map(|b| b.step),
            items,
            value: self.value.as_ref(),
        }
        .serialize(serializer)
    }
}

/// Fatal enumeration errors. Per-element faults are not errors.
#[derive(Debug)]
pub enum EnumerationError {
    /// The device name is empty or not a valid identifier.
    InvalidArgument(String),
    OpenFailed { device: String, source: DeviceError },
    LoadFailed { device: String, source: DeviceError },
}

impl fmt::Display for EnumerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumerationError::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
            EnumerationError::OpenFailed { device, source } => {
                write!(f, "Cannot open device {device}: {source}")
            }
            EnumerationError::LoadFailed { device, source } => {
                write!(f, "Cannot load device {device}: {source}")
            }
        }
    }
}

impl std::error::Error for EnumerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EnumerationError::OpenFailed { source, .. }
            | EnumerationError::LoadFailed { source, .. } => Some(source),
            EnumerationError::InvalidArgument(_) => None,
        }
    }
}

/// Check that `name` can identify a control device.
pub fn validate_device_name(name: &str) -> Result<(), EnumerationError> {
    if name.trim().is_empty() {
        return Err(EnumerationError::InvalidArgument(
            "device name is empty".into(),
        ));
    }
    if name.contains('\0') {
        return Err(EnumerationError::InvalidArgument(format!(
            "device name contains a NUL byte: {name:?}"
        )));
    }
    Ok(())
}

/// List the controls of `device_name` with backend `D`.
pub fn list_controls<D: ControlDevice>(
    device_name: &str,
) -> Result<Vec<ControlRecord>, EnumerationError> {
    list_controls_with(device_name, D::open)
}

/// List the controls of `device_name`, opening it with `open`.
///
/// `open` is not called when the name is invalid.
pub fn list_controls_with<D, F>(
    device_name: &str,
    open: F,
) -> Result<Vec<ControlRecord>, EnumerationError>
where
    D: ControlDevice,
    F: FnOnce(&str) -> device::Result<D>,
{
    validate_device_name(device_name)?;

    let mut device = open(device_name).map_err(|source| EnumerationError::OpenFailed {
        device: device_name.to_string(),
        source,
    })?;

    // `device` drops on return from here on, on both paths.
    device
        .load()
        .map_err(|source| EnumerationError::LoadFailed {
            device: device_name.to_string(),
            source,
        })?;

    Ok(snapshot_device(&device))
}

/// Describe and read every element of a loaded device, in device order.
pub fn snapshot_device<D: ControlDevice>(device: &D) -> Vec<ControlRecord> {
    let elems = device.elements();
    log::debug!("{}: {} elements", device.name(), elems.len());

    elems
        .into_iter()
        .enumerate()
        .fold(Vec::new(), |mut records, (pos, elem)| {
            match snapshot_element(device, elem) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("{}: skipping element #{pos}: {e}", device.name()),
            }
            records
        })
}

fn snapshot_element<D: ControlDevice>(
    device: &D,
    elem: D::Elem,
) -> Result<ControlRecord, descriptor::DescriptorError> {
    let descriptor = descriptor::describe(device, elem)?;

    let value = if descriptor.readable {
        match device.read(elem) {
            Ok(raw) => Some(value::marshal(descriptor.kind, &raw, descriptor.count)),
            Err(e) => {
                log::warn!(
                    "{}: cannot read value of {:?}: {e}",
                    device.name(),
                    descriptor.name
                );
                None
            }
        }
    } else {
        None
    };

    Ok(ControlRecord { descriptor, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Bounds, ControlType};
    use crate::device::mock::{MockDevice, MockElement};
    use crate::value::ControlValue;

    fn mock_opener(
        elements: Vec<MockElement>,
    ) -> impl FnOnce(&str) -> device::Result<MockDevice> {
        move |name| Ok(MockDevice::with_elements(name, elements))
    }

    #[test]
    fn validate_rejects_empty_and_blank() {
        assert!(validate_device_name("").is_err());
        assert!(validate_device_name("   ").is_err());
        assert!(validate_device_name("hw:0").is_ok());
        assert!(validate_device_name("default").is_ok());
    }

    #[test]
    fn validate_rejects_nul() {
        let err = validate_device_name("hw\0").unwrap_err();
        assert!(err.to_string().contains("NUL"));
    }

    #[test]
    fn empty_name_never_opens() {
        let mut opened = false;
        let result = list_controls_with("", |name| {
            opened = true;
            MockDevice::open(name)
        });
        assert!(matches!(result, Err(EnumerationError::InvalidArgument(_))));
        assert!(!opened);
    }

    #[test]
    fn open_failure_carries_device_and_code() {
        let result = list_controls_with::<MockDevice, _>("hw:9", |_| {
            Err(DeviceError::Sys {
                call: "snd_hctl_open",
                code: -2,
                message: "No such file or directory".into(),
            })
        });
        let err = result.unwrap_err();
        match &err {
            EnumerationError::OpenFailed { device, source } => {
                assert_eq!(device, "hw:9");
                assert!(matches!(source, DeviceError::Sys { code: -2, .. }));
            }
            other => panic!("expected OpenFailed, got {other:?}"),
        }
        assert!(err.to_string().starts_with("Cannot open device hw:9"));
    }

    #[test]
    fn load_failure_closes_once() {
        let mut dev = MockDevice::new("hw:0");
        dev.fail_load = true;
        let closes = dev.close_counter();
        let err = list_controls_with("hw:0", move |_| Ok(dev)).unwrap_err();
        assert!(matches!(err, EnumerationError::LoadFailed { .. }));
        assert!(err.to_string().starts_with("Cannot load device hw:0"));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn success_closes_once() {
        let dev = MockDevice::with_elements("hw:0", vec![MockElement::boolean("Mute", &[true])]);
        let closes = dev.close_counter();
        let records = list_controls_with("hw:0", move |_| Ok(dev)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn empty_device_is_success() {
        let records = list_controls_with("hw:0", mock_opener(vec![])).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn default_open_uses_backend() {
        // MockDevice::open yields an empty device.
        let records = list_controls::<MockDevice>("hw:0").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn records_follow_device_order() {
        let records = list_controls_with(
            "hw:0",
            mock_opener(vec![
                MockElement::integer("Zeta", 0, 10, 1, &[1]),
                MockElement::boolean("Alpha", &[false]),
                MockElement::integer("Zeta", 0, 10, 1, &[2]),
            ]),
        )
        .unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.descriptor.name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Zeta"]);
    }

    #[test]
    fn descriptor_failure_skips_element() {
        let mut broken = MockElement::boolean("Broken", &[true]);
        broken.fail_info = true;
        let records = list_controls_with(
            "hw:0",
            mock_opener(vec![
                MockElement::boolean("First", &[true]),
                broken,
                MockElement::boolean("Last", &[false]),
            ]),
        )
        .unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.descriptor.name.as_str()).collect();
        assert_eq!(names, ["First", "Last"]);
    }

    #[test]
    fn read_failure_keeps_record_without_value() {
        let mut flaky = MockElement::integer("Volume", 0, 100, 1, &[75]);
        flaky.fail_read = true;
        let records = list_controls_with("hw:0", mock_opener(vec![flaky])).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].value.is_none());
        assert!(records[0].descriptor.bounds().is_some());
    }

    #[test]
    fn unreadable_element_is_never_read() {
        let mut dev = MockDevice::with_elements(
            "hw:0",
            vec![MockElement::boolean("Hidden", &[true]).unreadable()],
        );
        dev.load().unwrap();
        let records = snapshot_device(&dev);
        assert!(records[0].value.is_none());
        assert!(dev.reads.borrow().is_empty());
    }

    #[test]
    fn multi_slot_value_is_sequence_of_count() {
        let records = list_controls_with(
            "hw:0",
            mock_opener(vec![MockElement::integer("Master", 0, 31, 1, &[10, 20])]),
        )
        .unwrap();
        let r = &records[0];
        assert_eq!(r.descriptor.count, 2);
        assert_eq!(
            r.value,
            Some(ElementValue::Sequence(vec![
                ControlValue::Number(10),
                ControlValue::Number(20)
            ]))
        );
    }

    #[test]
    fn record_serializes_integer_shape() {
        let records = list_controls_with(
            "hw:0",
            mock_opener(vec![MockElement::integer("Volume", 0, 100, 1, &[75])]),
        )
        .unwrap();
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Volume",
                "type": "INTEGER",
                "min": 0,
                "max": 100,
                "step": 1,
                "value": 75
            })
        );
    }

    #[test]
    fn record_serializes_null_items_and_omits_value_when_unreadable() {
        let mut elem = MockElement::enumerated("Source", &["Mic", "Line"], &[0]).unreadable();
        elem.items[0] = None;
        let record = ControlRecord {
            descriptor: {
                let mut dev = MockDevice::with_elements("hw:0", vec![elem]);
                dev.load().unwrap();
                descriptor::describe(&dev, 0).unwrap()
            },
            value: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Source",
                "type": "ENUMERATED",
                "items": [null, "Line"]
            })
        );
    }

    #[test]
    fn record_keeps_descriptor_fields() {
        let records = list_controls_with(
            "hw:0",
            mock_opener(vec![MockElement::integer64("Frames", 0, 1 << 40, 1, &[1 << 35])]),
        )
        .unwrap();
        let d = &records[0].descriptor;
        assert_eq!(d.kind, ControlType::Integer64);
        assert_eq!(
            d.bounds(),
            Some(&Bounds {
                min: 0,
                max: 1 << 40,
                step: 1
            })
        );
        assert_eq!(
            records[0].value,
            Some(ElementValue::Scalar(ControlValue::Number(1 << 35)))
        );
    }
}
