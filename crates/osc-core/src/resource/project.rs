//! Projects, namespaces and image streams.

use super::facade;
use crate::error::Result;
use crate::registry::keys;
use crate::value::Value;

facade!(
    /// Namespace with platform metadata.
    Project,
    [keys::DISPLAY_NAME, keys::DESCRIPTION, keys::PHASE]
);

impl Project {
    /// Display name, falling back to the name.
    pub fn display_name(&self) -> Result<String> {
        let display = self.string(keys::DISPLAY_NAME)?;
        if display.is_empty() {
            Ok(self.name())
        } else {
            Ok(display)
        }
    }

    pub fn description(&self) -> Result<String> {
        self.string(keys::DESCRIPTION)
    }

    /// `Active` or `Terminating`
    pub fn phase(&self) -> Result<String> {
        self.string(keys::PHASE)
    }
}

facade!(
    /// Kubernetes namespace.
    Namespace,
    [keys::PHASE]
);

impl Namespace {
    pub fn phase(&self) -> Result<String> {
        self.string(keys::PHASE)
    }
}

facade!(
    /// Named set of image tags.
    ImageStream,
    [keys::DOCKER_IMAGE_REPOSITORY, keys::TAGS]
);

impl ImageStream {
    /// Pull spec of the backing repository
    pub fn docker_image_repository(&self) -> Result<String> {
        self.string(keys::DOCKER_IMAGE_REPOSITORY)
    }

    /// Tag names declared in the spec.
    pub fn tags(&self) -> Result<Vec<String>> {
        Ok(self
            .list(keys::TAGS)?
            .iter()
            .filter_map(|t| t.get("name").and_then(Value::as_str))
            .map(String::from)
            .collect())
    }
}
