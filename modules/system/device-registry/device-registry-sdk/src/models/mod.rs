//! API-facing models for device registration and service configuration.
//!
//! Every optional wire field is an `Option`. Absence is a valid state and is
//! never collapsed into a zero value; accessors such as
//! [`Service::auto_upgrade`] apply the documented default explicitly.
//!
//! All models implement `Display` for diagnostics. Rendering never fails:
//! unset fields print as `not set` and credentials only as a presence marker.

mod attribute;
mod config_state;
mod device;
mod service;

use std::fmt;

pub use attribute::{Attribute, MappingValue, Mappings};
pub use config_state::{ConfigPhase, ConfigState, now_epoch_secs};
pub use device::{DeviceIdentity, PersistedDevice};
pub use service::{DEFAULT_ACTIVE_UPGRADE, DEFAULT_AUTO_UPGRADE, Service};

pub(crate) const NOT_SET: &str = "not set";

/// Renders the value, or [`NOT_SET`] when absent.
pub(crate) struct OrNotSet<'a, T: ?Sized>(Option<&'a T>);

pub(crate) fn or_not_set<T: ?Sized>(value: Option<&T>) -> OrNotSet<'_, T> {
    OrNotSet(value)
}

impl<T: fmt::Display + ?Sized> fmt::Display for OrNotSet<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str(NOT_SET),
        }
    }
}

/// Renders a slice as `[a, b, c]` or, braced, `[{a}, {b}]`.
pub(crate) struct DisplayList<'a, T> {
    items: &'a [T],
    braces: bool,
}

pub(crate) fn list<T>(items: &[T]) -> DisplayList<'_, T> {
    DisplayList {
        items,
        braces: false,
    }
}

pub(crate) fn braced_list<T>(items: &[T]) -> DisplayList<'_, T> {
    DisplayList {
        items,
        braces: true,
    }
}

impl<T: fmt::Display> fmt::Display for DisplayList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if self.braces {
                write!(f, "{{{item}}}")?;
            } else {
                write!(f, "{item}")?;
            }
        }
        f.write_str("]")
    }
}
