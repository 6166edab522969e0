//! Matching a running service instance to its configuration descriptor.

use crate::arch::ArchSynonyms;
use crate::error::DeviceModelError;
use crate::models::Service;
use crate::version::Version;

/// The running service to find a configuration for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCandidate {
    pub org: String,
    pub url: String,
    pub arch: String,
    pub version: String,
}

impl ServiceCandidate {
    #[must_use]
    pub fn new(
        org: impl Into<String>,
        url: impl Into<String>,
        arch: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            org: org.into(),
            url: url.into(),
            arch: arch.into(),
            version: version.into(),
        }
    }
}

/// Select the descriptor whose `org` and `url` match exactly, whose `arch`
/// matches after synonym normalization and whose version range contains the
/// candidate version.
///
/// Returns `Ok(None)` when nothing matches. A descriptor that matches on
/// `org` and `url` must carry `arch` and `versionRange`; descriptors for other
/// services are skipped without inspection.
///
/// # Errors
///
/// - [`DeviceModelError::MalformedVersionRange`] if the candidate version or a
///   relevant descriptor's range does not parse.
/// - [`DeviceModelError::MissingRequiredField`] if a descriptor lacks `url`,
///   `organization`, or (when relevant) `arch` or `versionRange`.
/// - [`DeviceModelError::AmbiguousConfiguration`] if more than one descriptor
///   matches.
pub fn resolve_service<'a>(
    services: &'a [Service],
    candidate: &ServiceCandidate,
    synonyms: &ArchSynonyms,
) -> Result<Option<&'a Service>, DeviceModelError> {
    let version = Version::parse(&candidate.version)?;
    let arch = synonyms.normalize(&candidate.arch);

    let mut matched = Vec::new();
    for service in services {
        if service_matches(service, candidate, &arch, &version, synonyms)? {
            matched.push(service);
        }
    }

    match matched.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        many => Err(DeviceModelError::AmbiguousConfiguration {
            org: candidate.org.clone(),
            url: candidate.url.clone(),
            arch,
            version: version.to_string(),
            matches: many.len(),
        }),
    }
}

fn service_matches(
    service: &Service,
    candidate: &ServiceCandidate,
    arch: &str,
    version: &Version,
    synonyms: &ArchSynonyms,
) -> Result<bool, DeviceModelError> {
    let org = service
        .org
        .as_deref()
        .ok_or_else(|| DeviceModelError::missing("service", "organization"))?;
    let url = service
        .url
        .as_deref()
        .ok_or_else(|| DeviceModelError::missing("service", "url"))?;
    if org != candidate.org || url != candidate.url {
        return Ok(false);
    }

    let service_arch = service
        .arch
        .as_deref()
        .ok_or_else(|| DeviceModelError::missing("service", "arch"))?;
    if synonyms.normalize(service_arch) != arch {
        return Ok(false);
    }

    Ok(service.version_range()?.contains(version))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn pair() -> Vec<Service> {
        vec![
            Service::new("u1", "o1", "first", "amd64", "[1.0.0,2.0.0)"),
            Service::new("u1", "o1", "second", "amd64", "[1.5.0,3.0.0)"),
        ]
    }

    #[test]
    fn overlapping_ranges_are_ambiguous() {
        let services = pair();
        let err = resolve_service(
            &services,
            &ServiceCandidate::new("o1", "u1", "amd64", "1.7.0"),
            &ArchSynonyms::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DeviceModelError::AmbiguousConfiguration {
                org: "o1".to_owned(),
                url: "u1".to_owned(),
                arch: "amd64".to_owned(),
                version: "1.7.0".to_owned(),
                matches: 2,
            }
        );
    }

    #[test]
    fn single_match_is_returned() {
        let services = pair();
        let found = resolve_service(
            &services,
            &ServiceCandidate::new("o1", "u1", "amd64", "1.2.0"),
            &ArchSynonyms::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(found.name.as_deref(), Some("first"));

        let found = resolve_service(
            &services,
            &ServiceCandidate::new("o1", "u1", "amd64", "2.5.0"),
            &ArchSynonyms::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(found.name.as_deref(), Some("second"));
    }

    #[test]
    fn no_match_is_none() {
        let services = pair();
        let synonyms = ArchSynonyms::default();
        for candidate in [
            ServiceCandidate::new("o1", "u1", "amd64", "3.0.0"),
            ServiceCandidate::new("o2", "u1", "amd64", "1.2.0"),
            ServiceCandidate::new("o1", "u2", "amd64", "1.2.0"),
            ServiceCandidate::new("o1", "u1", "arm64", "1.2.0"),
        ] {
            assert_eq!(resolve_service(&services, &candidate, &synonyms).unwrap(), None);
        }
    }

    #[test]
    fn arch_synonyms_are_normalized_on_both_sides() {
        let services = vec![Service::new("u1", "o1", "n", "x86_64", "1.0.0")];
        let found = resolve_service(
            &services,
            &ServiceCandidate::new("o1", "u1", "AMD64", "1.0.0"),
            &ArchSynonyms::default(),
        )
        .unwrap();
        assert!(found.is_some());

        let strict = resolve_service(
            &services,
            &ServiceCandidate::new("o1", "u1", "amd64", "1.0.0"),
            &ArchSynonyms::empty(),
        )
        .unwrap();
        assert!(strict.is_none());
    }

    #[test]
    fn bare_version_is_exact() {
        let services = vec![Service::new("u1", "o1", "n", "amd64", "1.0.0")];
        let synonyms = ArchSynonyms::default();
        let candidate = ServiceCandidate::new("o1", "u1", "amd64", "1.0.0");
        assert!(
            resolve_service(&services, &candidate, &synonyms)
                .unwrap()
                .is_some()
        );
        let candidate = ServiceCandidate::new("o1", "u1", "amd64", "1.0.1");
        assert!(
            resolve_service(&services, &candidate, &synonyms)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn relevant_descriptor_missing_fields_is_an_error() {
        let mut services = pair();
        services[1].version_range = None;
        assert!(matches!(
            resolve_service(
                &services,
                &ServiceCandidate::new("o1", "u1", "amd64", "1.2.0"),
                &ArchSynonyms::default(),
            ),
            Err(DeviceModelError::MissingRequiredField {
                field: "versionRange",
                ..
            })
        ));

        services[1].url = None;
        assert!(matches!(
            resolve_service(
                &services,
                &ServiceCandidate::new("o1", "u1", "amd64", "1.2.0"),
                &ArchSynonyms::default(),
            ),
            Err(DeviceModelError::MissingRequiredField { field: "url", .. })
        ));
    }

    #[test]
    fn malformed_candidate_version_is_rejected() {
        assert!(matches!(
            resolve_service(
                &pair(),
                &ServiceCandidate::new("o1", "u1", "amd64", "one.two"),
                &ArchSynonyms::default(),
            ),
            Err(DeviceModelError::MalformedVersionRange { .. })
        ));
    }
}
