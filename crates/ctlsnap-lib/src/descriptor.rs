//! Element descriptors: static metadata read from an element's info block.
//!
//! [`describe`] turns one element into a [`ControlDescriptor`]: name, type,
//! slot count, readability, and the metadata that belongs to its type
//! (integer bounds or enum item names). It never reads the element's value.

use std::fmt;

use crate::device::{ControlDevice, DeviceError, ElemInfo};
use crate::value::narrow_i32;

/// Element type, from alsa-lib's `SND_CTL_ELEM_TYPE_*` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    None,
    Boolean,
    Integer,
    Enumerated,
    Bytes,
    Iec958,
    Integer64,
    /// A code this crate does not know.
    Unknown(u32),
}

impl ControlType {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => ControlType::None,
            1 => ControlType::Boolean,
            2 => ControlType::Integer,
            3 => ControlType::Enumerated,
            4 => ControlType::Bytes,
            5 => ControlType::Iec958,
            6 => ControlType::Integer64,
            other => ControlType::Unknown(other),
        }
    }

}

/// Integer range of an `Integer` or `Integer64` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

/// Type-specific metadata. At most one kind is ever present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    None,
    Bounds(Bounds),
    /// Enum item names by position; `None` where the lookup failed.
    Items(Vec<Option<String>>),
}

/// Snapshot of an element's static metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDescriptor {
    pub name: String,
    pub kind: ControlType,
    /// Type name as reported by the device.
    pub type_name: String,
    pub count: u32,
    pub metadata: Metadata,
    pub readable: bool,
}

impl ControlDescriptor {
    pub fn bounds(&self) -> Option<&Bounds> {
        match &self.metadata {
            Metadata::Bounds(b) => Some(b),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[Option<String>]> {
        match &self.metadata {
            Metadata::Items(items) => Some(items),
            _ => None,
        }
    }
}

/// Descriptor read errors.
#[derive(Debug)]
pub enum DescriptorError {
    /// The element's info block could not be queried.
    InfoUnavailable(DeviceError),
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::InfoUnavailable(e) => write!(f, "Element info unavailable: {e}"),
        }
    }
}

impl std::error::Error for DescriptorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DescriptorError::InfoUnavailable(e) => Some(e),
        }
    }
}

/// Read the descriptor of `elem`.
pub fn describe<D: ControlDevice>(
    device: &D,
    elem: D::Elem,
) -> Result<ControlDescriptor, DescriptorError> {
    let mut info = device
        .info(elem)
        .map_err(DescriptorError::InfoUnavailable)?;

    let code = info.type_code();
    let kind = ControlType::from_code(code);

    let metadata = match kind {
        ControlType::Integer => Metadata::Bounds(Bounds {
            min: narrow_i32(info.min()),
            max: narrow_i32(info.max()),
            step: narrow_i32(info.step()),
        }),
        ControlType::Integer64 => Metadata::Bounds(Bounds {
            min: info.min64(),
            max: info.max64(),
            step: info.step64(),
        }),
        ControlType::Enumerated => Metadata::Items(item_names(device, elem, &mut info)),
        ControlType::None
        | ControlType::Boolean
        | ControlType::Bytes
        | ControlType::Iec958
        | ControlType::Unknown(_) => Metadata::None,
    };

    Ok(ControlDescriptor {
        name: info.name(),
        kind,
        type_name: device.type_name(code),
        count: info.count(),
        metadata,
        readable: info.is_readable(),
    })
}

/// Resolve every enum item name. A failed lookup leaves `None` at its
/// position; the remaining items are still queried.
fn item_names<D: ControlDevice>(
    device: &D,
    elem: D::Elem,
    info: &mut D::Info,
) -> Vec<Option<String>> {
    let count = info.items();
    let mut items = Vec::with_capacity(count as usize);
    for index in 0..count {
        info.set_item(index);
        match device.refresh_info(elem, info) {
            Ok(()) => items.push(Some(info.item_name())),
            Err(e) => {
                log::warn!("{}: enum item {index} unavailable: {e}", device.name());
                items.push(None);
            }
        }
    }
    items
}
