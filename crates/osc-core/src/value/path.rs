//! Paths into a value tree.

use std::fmt;

/// Ordered list of segments locating a node in a [`ValueTree`](super::ValueTree).
///
/// Segments are plain object keys. When a segment is all digits and the node
/// being traversed is an array, it is used as an index instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Create a path from individual segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a dotted path such as `metadata.name`.
    ///
    /// Keys that themselves contain dots (annotation keys, mostly) must be
    /// built with [`PropertyPath::new`] instead.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.').filter(|s| !s.is_empty()))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path extended by one more segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&[&str]> for PropertyPath {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for PropertyPath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl From<&str> for PropertyPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted() {
        let path = PropertyPath::parse("spec.template.metadata.labels");
        assert_eq!(path.segments().len(), 4);
        assert_eq!(path.to_string(), "spec.template.metadata.labels");
    }

    #[test]
    fn test_segments_keep_dots() {
        let path = PropertyPath::from(["metadata", "annotations", "openshift.io/display-name"]);
        assert_eq!(path.segments()[2], "openshift.io/display-name");
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        assert_eq!(PropertyPath::parse("a..b."), PropertyPath::from(["a", "b"]));
        assert!(PropertyPath::parse("").is_empty());
    }
}
