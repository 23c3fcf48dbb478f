//! Builds and build configurations.

use super::facade;
use crate::error::Result;
use crate::registry::keys;

/// Phases after which a build no longer changes.
const TERMINAL_PHASES: &[&str] = &["Complete", "Failed", "Error", "Cancelled"];

facade!(
    /// One run of a build configuration.
    Build,
    [
        keys::PHASE,
        keys::MESSAGE,
        keys::CANCELLED,
        keys::OUTPUT_IMAGE,
        keys::SOURCE_URI,
    ]
);

impl Build {
    pub fn phase(&self) -> Result<String> {
        self.string(keys::PHASE)
    }

    pub fn message(&self) -> Result<String> {
        self.string(keys::MESSAGE)
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> Result<bool> {
        self.boolean(keys::CANCELLED)
    }

    pub fn is_finished(&self) -> Result<bool> {
        let phase = self.phase()?;
        Ok(TERMINAL_PHASES.contains(&phase.as_str()))
    }

    pub fn output_image(&self) -> Result<String> {
        self.string(keys::OUTPUT_IMAGE)
    }

    pub fn source_uri(&self) -> Result<String> {
        self.string(keys::SOURCE_URI)
    }
}

facade!(
    /// Recipe for producing an image from source.
    BuildConfig,
    [keys::OUTPUT_IMAGE, keys::SOURCE_URI, keys::STRATEGY]
);

impl BuildConfig {
    pub fn output_image(&self) -> Result<String> {
        self.string(keys::OUTPUT_IMAGE)
    }

    pub fn source_uri(&self) -> Result<String> {
        self.string(keys::SOURCE_URI)
    }

    /// `Source`, `Docker` or `Custom`
    pub fn strategy(&self) -> Result<String> {
        self.string(keys::STRATEGY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PropertyRegistry;
    use crate::resource::ResourceFactory;
    use crate::test_support::fixtures;
    use std::sync::Arc;

    fn factory() -> ResourceFactory {
        ResourceFactory::new(Arc::new(PropertyRegistry::builtin()))
    }

    #[test]
    fn test_build_state() {
        let build: Build = factory()
            .create_typed(&fixtures::build("v1", "app-1", "Running"))
            .unwrap();
        assert_eq!(build.phase().unwrap(), "Running");
        assert!(!build.is_finished().unwrap());
        assert!(!build.is_cancelled().unwrap());
        assert_eq!(build.output_image().unwrap(), "app:latest");
        assert_eq!(build.source_uri().unwrap(), "https://github.com/example/app.git");

        let done: Build = factory()
            .create_typed(&fixtures::build("v1", "app-2", "Complete"))
            .unwrap();
        assert!(done.is_finished().unwrap());
    }

    #[test]
    fn test_cancelled_flag_accepts_string() {
        let build: Build = factory()
            .create_typed(
                r#"{"kind":"Build","apiVersion":"v1beta3","metadata":{"name":"b"},
                    "status":{"phase":"Cancelled","cancelled":"true"}}"#,
            )
            .unwrap();
        assert!(build.is_cancelled().unwrap());
    }

    #[test]
    fn test_build_config_strategy() {
        let bc: BuildConfig = factory()
            .create_typed(
                r#"{"kind":"BuildConfig","apiVersion":"v1","metadata":{"name":"app"},
                    "spec":{"strategy":{"type":"Source"},
                            "output":{"to":{"kind":"ImageStreamTag","name":"app:latest"}}}}"#,
            )
            .unwrap();
        assert_eq!(bc.strategy().unwrap(), "Source");
        assert_eq!(bc.output_image().unwrap(), "app:latest");
        assert_eq!(bc.source_uri().unwrap(), "");
    }
}
