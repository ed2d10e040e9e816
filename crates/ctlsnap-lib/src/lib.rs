//! ctlsnap: snapshot ALSA control elements into a generic value model.

pub mod config;
pub mod descriptor;
pub mod device;
pub mod enumerate;
pub mod error;
pub mod host;
pub mod value;

pub use enumerate::{ControlRecord, list_controls};
pub use error::CtlsnapError;
