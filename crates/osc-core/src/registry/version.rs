//! API version strings and their ordering.

use std::cmp::Ordering;
use std::fmt;

/// A server-declared schema revision such as `v1` or `v1beta3`.
///
/// Ordering follows the Kubernetes convention: higher major first, then GA
/// over beta over alpha, then the higher pre-release number. Strings that
/// don't follow the `v<major>[(alpha|beta)<minor>]` shape sort below every
/// conforming version and lexically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiVersion(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stability {
    Alpha,
    Beta,
    Ga,
}

impl ApiVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn rank(&self) -> Option<(u32, Stability, u32)> {
        let rest = self.0.strip_prefix('v')?;
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let major = rest[..digits].parse().ok()?;
        let suffix = &rest[digits..];
        if suffix.is_empty() {
            return Some((major, Stability::Ga, 0));
        }
        let (stability, minor) = if let Some(n) = suffix.strip_prefix("beta") {
            (Stability::Beta, n)
        } else if let Some(n) = suffix.strip_prefix("alpha") {
            (Stability::Alpha, n)
        } else {
            return None;
        };
        if minor.is_empty() || !minor.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some((major, stability, minor.parse().ok()?))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApiVersion {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ApiVersion {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kubernetes_ordering() {
        let mut versions: Vec<ApiVersion> = ["v1beta1", "v2", "v1", "v1alpha1", "v1beta3", "v10"]
            .into_iter()
            .map(ApiVersion::from)
            .collect();
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(ApiVersion::as_str).collect();
        assert_eq!(sorted, ["v1alpha1", "v1beta1", "v1beta3", "v1", "v2", "v10"]);
    }

    #[test]
    fn test_nonconforming_sorts_lowest() {
        assert!(ApiVersion::from("latest") < ApiVersion::from("v1alpha1"));
        assert!(ApiVersion::from("v1gamma2") < ApiVersion::from("v1alpha1"));
        assert!(ApiVersion::from("abc") < ApiVersion::from("abd"));
    }
}
