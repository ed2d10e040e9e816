//! Unified error type for the ctlsnap-lib crate.
//!
//! [`CtlsnapError`] wraps the fatal module errors (`EnumerationError`,
//! `HostError`) and configuration problems. `From` impls allow `?` to propagate across module boundaries.

use std::fmt;

use crate::enumerate::EnumerationError;
use crate::host::HostError;

/// Unified error type for ctlsnap-lib operations.
#[derive(Debug)]
pub enum CtlsnapError {
    /// Fatal enumeration error (argument, open, load).
    Enumeration(EnumerationError),
    /// Host argument contract violated.
    Host(HostError),
    /// Standard I/O error (config persistence, output).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
}

impl fmt::Display for CtlsnapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtlsnapError::Enumeration(e) => write!(f, "{e}"),
            CtlsnapError::Host(e) => write!(f, "{e}"),
            CtlsnapError::Io(e) => write!(f, "I/O error: {e}"),
            CtlsnapError::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for CtlsnapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CtlsnapError::Enumeration(e) => Some(e),
            CtlsnapError::Host(e) => Some(e),
            CtlsnapError::Io(e) => Some(e),
            CtlsnapError::Config(_) => None,
        }
    }
}

impl From<EnumerationError> for CtlsnapError {
    fn from(e: EnumerationError) -> Self {
        CtlsnapError::Enumeration(e)
    }
}

impl From<HostError> for CtlsnapError {
    fn from(e: HostError) -> Self {
        CtlsnapError::Host(e)
    }
}

impl From<std::io::Error> for CtlsnapError {
    fn from(e: std::io::Error) -> Self {
        CtlsnapError::Io(e)
    }
}

/// Crate-level Result alias using [`CtlsnapError`].
pub type Result<T> = std::result::Result<T, CtlsnapError>;
