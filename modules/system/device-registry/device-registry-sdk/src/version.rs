//! Service versions and version-range expressions.
//!
//! Range grammar:
//!
//! - `[a,b]`, `[a,b)`, `(a,b]`, `(a,b)` for closed/open intervals
//! - `INFINITY` as the upper bound for an unbounded interval, e.g. `[1.0.0,INFINITY)`
//! - a bare version `a` for an exact match
//!
//! Versions are `major[.minor[.patch]][-prerelease][+build]`. Missing numeric
//! components are zero and build metadata is ignored.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::DeviceModelError;

/// Upper-bound keyword for an unbounded range.
pub const INFINITY: &str = "INFINITY";

/// One dot-separated pre-release identifier.
///
/// Variant order matters: numeric identifiers sort below alphanumeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum PreId {
    Numeric(u64),
    Alpha(String),
}

impl fmt::Display for PreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Alpha(s) => f.write_str(s),
        }
    }
}

/// A parsed service version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pre: Vec<PreId>,
}

impl Version {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Vec::new(),
        }
    }

    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceModelError::MalformedVersionRange`] naming the input
    /// when it is not a valid version.
    pub fn parse(input: &str) -> Result<Self, DeviceModelError> {
        let trimmed = input.trim();
        let without_build = trimmed.split_once('+').map_or(trimmed, |(v, _)| v);
        let (core, pre) = match without_build.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (without_build, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(DeviceModelError::malformed_range(
                input,
                "expected major[.minor[.patch]]",
            ));
        }
        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = parse_numeric(part).ok_or_else(|| {
                DeviceModelError::malformed_range(
                    input,
                    format!("'{part}' is not a numeric version component"),
                )
            })?;
        }

        let pre = match pre {
            Some(pre) => parse_prerelease(input, pre)?,
            None => Vec::new(),
        };

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre,
        })
    }

    /// `true` when the version carries a pre-release tag.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

fn parse_numeric(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn parse_prerelease(input: &str, pre: &str) -> Result<Vec<PreId>, DeviceModelError> {
    pre.split('.')
        .map(|id| {
            if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
                return Err(DeviceModelError::malformed_range(
                    input,
                    format!("'{id}' is not a valid pre-release identifier"),
                ));
            }
            Ok(parse_numeric(id).map_or_else(|| PreId::Alpha(id.to_owned()), PreId::Numeric))
        })
        .collect()
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                // a release sorts above its pre-releases
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Version {
    type Err = DeviceModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        for (i, id) in self.pre.iter().enumerate() {
            f.write_str(if i == 0 { "-" } else { "." })?;
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

/// One end of a [`VersionRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    Inclusive(Version),
    Exclusive(Version),
    Unbounded,
}

/// A version interval parsed from a range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    lower: Bound,
    upper: Bound,
}

impl VersionRange {
    /// A range matching exactly one version.
    #[must_use]
    pub fn exact(version: Version) -> Self {
        Self {
            lower: Bound::Inclusive(version.clone()),
            upper: Bound::Inclusive(version),
        }
    }

    /// Parse a range expression.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceModelError::MalformedVersionRange`] when the expression
    /// does not follow the grammar, a bound is not a valid version, or the
    /// interval is empty.
    pub fn parse(expression: &str) -> Result<Self, DeviceModelError> {
        let expr = expression.trim();
        if expr.is_empty() {
            return Err(DeviceModelError::malformed_range(expression, "empty expression"));
        }

        let Some(open) = expr.chars().next().filter(|c| matches!(c, '[' | '(')) else {
            return Version::parse(expr).map(Self::exact);
        };
        let Some(close) = expr.chars().last().filter(|c| matches!(c, ']' | ')')) else {
            return Err(DeviceModelError::malformed_range(
                expression,
                "interval must end with ']' or ')'",
            ));
        };

        let inner = &expr[1..expr.len() - 1];
        let Some((low, high)) = inner.split_once(',') else {
            return Err(DeviceModelError::malformed_range(
                expression,
                "interval must have the form [low,high)",
            ));
        };
        if high.contains(',') {
            return Err(DeviceModelError::malformed_range(
                expression,
                "interval has more than two bounds",
            ));
        }

        let low = Version::parse(low).map_err(|_| {
            DeviceModelError::malformed_range(
                expression,
                format!("invalid lower bound '{}'", low.trim()),
            )
        })?;
        let lower = if open == '[' {
            Bound::Inclusive(low)
        } else {
            Bound::Exclusive(low)
        };

        let high = high.trim();
        let upper = if high == INFINITY {
            Bound::Unbounded
        } else {
            let high = Version::parse(high).map_err(|_| {
                DeviceModelError::malformed_range(
                    expression,
                    format!("invalid upper bound '{high}'"),
                )
            })?;
            if close == ']' {
                Bound::Inclusive(high)
            } else {
                Bound::Exclusive(high)
            }
        };

        let range = Self { lower, upper };
        if range.is_empty() {
            return Err(DeviceModelError::malformed_range(
                expression,
                "lower bound is above upper bound",
            ));
        }
        Ok(range)
    }

    /// `true` when `version` lies inside the interval.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        let above_lower = match &self.lower {
            Bound::Inclusive(v) => version >= v,
            Bound::Exclusive(v) => version > v,
            Bound::Unbounded => true,
        };
        let below_upper = match &self.upper {
            Bound::Inclusive(v) => version <= v,
            Bound::Exclusive(v) => version < v,
            Bound::Unbounded => true,
        };
        above_lower && below_upper
    }

    #[must_use]
    pub fn lower(&self) -> &Bound {
        &self.lower
    }

    #[must_use]
    pub fn upper(&self) -> &Bound {
        &self.upper
    }

    fn is_empty(&self) -> bool {
        let (Some(low), Some(high)) = (bound_version(&self.lower), bound_version(&self.upper))
        else {
            return false;
        };
        match low.cmp(high) {
            Ordering::Greater => true,
            Ordering::Equal => !matches!(
                (&self.lower, &self.upper),
                (Bound::Inclusive(_), Bound::Inclusive(_))
            ),
            Ordering::Less => false,
        }
    }
}

fn bound_version(bound: &Bound) -> Option<&Version> {
    match bound {
        Bound::Inclusive(v) | Bound::Exclusive(v) => Some(v),
        Bound::Unbounded => None,
    }
}

impl FromStr for VersionRange {
    type Err = DeviceModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Bound::Inclusive(low), Bound::Inclusive(high)) = (&self.lower, &self.upper)
            && low == high
        {
            return write!(f, "{low}");
        }
        match &self.lower {
            Bound::Inclusive(v) => write!(f, "[{v},")?,
            Bound::Exclusive(v) => write!(f, "({v},")?,
            Bound::Unbounded => f.write_str("(,")?,
        }
        match &self.upper {
            Bound::Inclusive(v) => write!(f, "{v}]"),
            Bound::Exclusive(v) => write!(f, "{v})"),
            Bound::Unbounded => write!(f, "{INFINITY})"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::use_debug)]

    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn parses_short_and_full_versions() {
        assert_eq!(v("1"), Version::new(1, 0, 0));
        assert_eq!(v("1.2"), Version::new(1, 2, 0));
        assert_eq!(v(" 1.2.3 "), Version::new(1, 2, 3));
        assert_eq!(v("1.2.3+build.7"), Version::new(1, 2, 3));
        assert_eq!(v("1.2.3-rc.1").to_string(), "1.2.3-rc.1");
    }

    #[test]
    fn rejects_malformed_versions() {
        for bad in ["", "a.b.c", "1..2", "1.2.3.4", "1.2.3-", "1.2.3-rc..1", "1.-2"] {
            assert!(
                matches!(
                    Version::parse(bad),
                    Err(DeviceModelError::MalformedVersionRange { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn numeric_components_compare_numerically() {
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("2.0.0") > v("1.99.99"));
        assert_eq!(v("1.0"), v("1.0.0"));
    }

    #[test]
    fn prerelease_ordering() {
        assert!(v("1.0.0-alpha") < v("1.0.0"));
        assert!(v("1.0.0-alpha") < v("1.0.0-alpha.1"));
        assert!(v("1.0.0-alpha.1") < v("1.0.0-alpha.beta"));
        assert!(v("1.0.0-beta.2") < v("1.0.0-beta.11"));
        assert!(v("1.0.0-beta") < v("1.0.0-rc.1"));
        assert!(v("1.0.0-rc.1") < v("1.0.1-alpha"));
    }

    #[test]
    fn half_open_interval() {
        let r = VersionRange::parse("[1.0.0,2.0.0)").unwrap();
        assert!(r.contains(&v("1.0.0")));
        assert!(r.contains(&v("1.9.9")));
        assert!(!r.contains(&v("2.0.0")));
        assert!(!r.contains(&v("0.9.9")));
        assert!(r.contains(&v("2.0.0-rc.1")));
    }

    #[test]
    fn open_and_closed_bounds() {
        let r = VersionRange::parse("(1.0.0, 2.0.0]").unwrap();
        assert!(!r.contains(&v("1.0.0")));
        assert!(r.contains(&v("1.0.1")));
        assert!(r.contains(&v("2.0.0")));
    }

    #[test]
    fn infinity_upper_bound() {
        let r = VersionRange::parse("[1.5.0,INFINITY)").unwrap();
        assert!(r.contains(&v("1.5.0")));
        assert!(r.contains(&v("999.0.0")));
        assert!(!r.contains(&v("1.4.9")));
        assert_eq!(r.to_string(), "[1.5.0,INFINITY)");
    }

    #[test]
    fn bare_version_is_exact_match() {
        let r = VersionRange::parse("1.0.0").unwrap();
        assert!(r.contains(&v("1.0.0")));
        assert!(r.contains(&v("1.0")));
        assert!(!r.contains(&v("1.0.1")));
        assert_eq!(r.to_string(), "1.0.0");
    }

    #[test]
    fn rejects_malformed_ranges() {
        for bad in [
            "",
            "[1.0.0,2.0.0",
            "[1.0.0]",
            "[1.0.0,2.0.0,3.0.0)",
            "[x,2.0.0)",
            "[1.0.0,y)",
            "[2.0.0,1.0.0)",
            "[1.0.0,1.0.0)",
            "1.0.0)",
        ] {
            assert!(
                matches!(
                    VersionRange::parse(bad),
                    Err(DeviceModelError::MalformedVersionRange { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn degenerate_closed_interval_is_allowed() {
        let r = VersionRange::parse("[1.0.0,1.0.0]").unwrap();
        assert!(r.contains(&v("1.0.0")));
        assert_eq!(r, VersionRange::exact(v("1.0.0")));
    }
}
