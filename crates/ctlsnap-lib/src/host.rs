//! Host-facing entry point: loosely typed arguments in, JSON array out.
//!
//! Mirrors the calling convention of a scripting-language binding, where the
//! caller hands over an argument list of arbitrary values and expects a plain
//! array of objects back.

use std::fmt;

use serde_json::Value;

use crate::device::{ControlDevice, PlatformDevice};
use crate::enumerate::{self, EnumerationError};

/// Errors surfaced to the host caller.
#[derive(Debug)]
pub enum HostError {
    WrongArgumentCount,
    DeviceNotString,
    Enumeration(EnumerationError),
    Serialize(serde_json::Error),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::WrongArgumentCount => write!(f, "Wrong number of arguments"),
            HostError::DeviceNotString => write!(f, "`Device' argument is not a string"),
            HostError::Enumeration(e) => write!(f, "{e}"),
            HostError::Serialize(e) => write!(f, "Cannot serialize controls: {e}"),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Enumeration(e) => Some(e),
            HostError::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EnumerationError> for HostError {
    fn from(e: EnumerationError) -> Self {
        HostError::Enumeration(e)
    }
}

/// `list_controls(device)` against the platform backend.
pub fn list_controls(args: &[Value]) -> Result<Value, HostError> {
    list_controls_on::<PlatformDevice>(args)
}

/// `list_controls(device)` against backend `D`.
pub fn list_controls_on<D: ControlDevice>(args: &[Value]) -> Result<Value, HostError> {
    let device = device_argument(args)?;
    let records = enumerate::list_controls::<D>(device)?;
    serde_json::to_value(&records).map_err(HostError::Serialize)
}

fn device_argument(args: &[Value]) -> Result<&str, HostError> {
    match args.first() {
        None => Err(HostError::WrongArgumentCount),
        Some(Value::String(name)) => Ok(name.as_str()),
        Some(_) => Err(HostError::DeviceNotString),
    }
}
