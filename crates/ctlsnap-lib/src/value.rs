//! Value marshaling: raw element values to tagged generic values.

use serde::Serialize;

use crate::descriptor::ControlType;
use crate::device::ElemValue;

/// One marshaled slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ControlValue {
    Null,
    Boolean(bool),
    Number(i64),
}

/// Marshaled value of a whole element: a bare slot for `count <= 1`,
/// every slot in index order otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ElementValue {
    Scalar(ControlValue),
    Sequence(Vec<ControlValue>),
}

/// Raw slots held in memory, one `i64` per slot. Slots past the end read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotValues(Vec<i64>);

impl SlotValues {
    pub fn new(slots: Vec<i64>) -> Self {
        SlotValues(slots)
    }

    fn slot(&self, index: u32) -> i64 {
        self.0.get(index as usize).copied().unwrap_or(0)
    }
}

impl ElemValue for SlotValues {
    fn boolean(&self, index: u32) -> bool {
        self.slot(index) != 0
    }
    fn integer(&self, index: u32) -> i64 {
        self.slot(index)
    }
    fn integer64(&self, index: u32) -> i64 {
        self.slot(index)
    }
    fn enumerated(&self, index: u32) -> u32 {
        self.slot(index) as u32
    }
}

/// Reinterpret a C `long` as the 32-bit signed value alsa-lib stores for
/// `Integer` elements, whatever the host's `long` width.
pub(crate) fn narrow_i32(raw: i64) -> i64 {
    raw as i32 as i64
}

/// Marshal one slot according to the element type.
///
/// `None`, `Bytes`, `Iec958` and unknown types have no value decoding and
/// always yield [`ControlValue::Null`].
pub fn marshal_slot(kind: ControlType, raw: &impl ElemValue, index: u32) -> ControlValue {
    match kind {
        ControlType::Boolean => ControlValue::Boolean(raw.boolean(index)),
        ControlType::Integer => ControlValue::Number(narrow_i32(raw.integer(index))),
        ControlType::Integer64 => ControlValue::Number(raw.integer64(index)),
        // The item index, not its name; callers resolve it through `items`.
        ControlType::Enumerated => ControlValue::Number(raw.enumerated(index) as i64),
        ControlType::None | ControlType::Bytes | ControlType::Iec958 | ControlType::Unknown(_) => {
            ControlValue::Null
        }
    }
}

/// Marshal all `count` slots of an element.
pub fn marshal(kind: ControlType, raw: &impl ElemValue, count: u32) -> ElementValue {
    match count {
        0 => ElementValue::Scalar(ControlValue::Null),
        1 => ElementValue::Scalar(marshal_slot(kind, raw, 0)),
        _ => ElementValue::Sequence((0..count).map(|i| marshal_slot(kind, raw, i)).collect()),
    }
}
