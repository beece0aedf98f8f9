//! Host targeting restrictions

use crate::cpe::cpe_matches;
use crate::knowledge::HostFacts;
use serde::{Deserialize, Serialize};

/// Restriction on which hosts a check, method or probe applies to.
///
/// An empty list in a dimension leaves that dimension unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub cpe: Vec<String>,
    #[serde(default)]
    pub os: Vec<String>,
    #[serde(default)]
    pub label: Vec<String>,
}

impl Target {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os.push(os.into());
        self
    }

    pub fn with_cpe(mut self, cpe: impl Into<String>) -> Self {
        self.cpe.push(cpe.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label.push(label.into());
        self
    }

    /// True when no dimension carries a restriction
    pub fn is_unrestricted(&self) -> bool {
        self.cpe.is_empty() && self.os.is_empty() && self.label.is_empty()
    }

    /// Whether this target admits the given host.
    ///
    /// A restricted dimension with no corresponding host fact fails closed.
    pub fn admits(&self, host: &HostFacts) -> bool {
        if self.is_unrestricted() {
            return true;
        }

        let cpe_ok = self.cpe.is_empty()
            || host
                .cpe
                .iter()
                .any(|have| self.cpe.iter().any(|want| cpe_matches(want, have)));

        let os_ok = self.os.is_empty()
            || host
                .os
                .as_deref()
                .is_some_and(|os| self.os.iter().any(|want| want.eq_ignore_ascii_case(os)));

        let label_ok = self.label.is_empty() || any_label(&self.label, &host.labels);

        cpe_ok && os_ok && label_ok
    }

    /// Whether this target can apply to any host matching `request`.
    ///
    /// Used to intersect request-level restrictions with a check's own target:
    /// a dimension passes if either side leaves it unrestricted or the two sets
    /// share a member.
    pub fn overlaps(&self, request: &Target) -> bool {
        let cpe_ok = request.cpe.is_empty()
            || self.cpe.is_empty()
            || request
                .cpe
                .iter()
                .any(|r| self.cpe.iter().any(|c| cpe_matches(c, r) || cpe_matches(r, c)));

        let os_ok = request.os.is_empty()
            || self.os.is_empty()
            || request
                .os
                .iter()
                .any(|r| self.os.iter().any(|o| o.eq_ignore_ascii_case(r)));

        let label_ok =
            request.label.is_empty() || self.label.is_empty() || any_label(&self.label, &request.label);

        cpe_ok && os_ok && label_ok
    }
}

fn any_label(wanted: &[String], have: &[String]) -> bool {
    have.iter()
        .any(|h| wanted.iter().any(|w| w.eq_ignore_ascii_case(h)))
}

/// Whether every target along a check → method → probe chain admits the host
pub fn admits_all<'a>(
    chain: impl IntoIterator<Item = Option<&'a Target>>,
    host: &HostFacts,
) -> bool {
    chain
        .into_iter()
        .flatten()
        .all(|target| target.admits(host))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_host() -> HostFacts {
        HostFacts {
            hostname: Some("web-01".into()),
            os: Some("Linux".into()),
            cpe: vec!["cpe:/o:canonical:ubuntu_linux:22.04".into()],
            labels: vec!["prod".into(), "web".into()],
        }
    }

    #[test]
    fn test_unrestricted_admits_everything() {
        assert!(Target::new().admits(&linux_host()));
        assert!(Target::new().admits(&HostFacts::default()));
    }

    #[test]
    fn test_os_restriction() {
        assert!(Target::new().with_os("linux").admits(&linux_host()));
        assert!(!Target::new().with_os("windows").admits(&linux_host()));
    }

    #[test]
    fn test_missing_facts_fail_closed() {
        let host = HostFacts::default();
        assert!(!Target::new().with_os("linux").admits(&host));
        assert!(!Target::new().with_label("prod").admits(&host));
        assert!(!Target::new().with_cpe("cpe:/o:canonical").admits(&host));
    }

    #[test]
    fn test_dimensions_compose_by_and() {
        let target = Target::new().with_os("linux").with_label("db");
        assert!(!target.admits(&linux_host()));

        let target = Target::new()
            .with_os("linux")
            .with_label("web")
            .with_cpe("cpe:2.3:o:canonical:ubuntu_linux:*");
        assert!(target.admits(&linux_host()));
    }

    #[test]
    fn test_admits_all_chain() {
        let host = linux_host();
        let check = Target::new().with_os("linux");
        let probe = Target::new().with_label("db");
        assert!(admits_all([Some(&check), None], &host));
        assert!(!admits_all([Some(&check), None, Some(&probe)], &host));
    }

    #[test]
    fn test_overlaps_request() {
        let check = Target::new().with_os("linux");
        assert!(check.overlaps(&Target::new()));
        assert!(check.overlaps(&Target::new().with_os("Linux").with_os("darwin")));
        assert!(!check.overlaps(&Target::new().with_os("windows")));
        assert!(Target::new().overlaps(&Target::new().with_os("windows")));
    }
}
