//! Configuration for the sync engine.

/// Configuration for [`SyncEngine`](crate::SyncEngine).
///
/// Library-level configuration; there is no file format here. The session
/// builds one of these and hands it to the engine at construction.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Human-readable device name, attached to registration requests.
    pub device_name: String,
    /// Maximum number of events requested per backlog pull.
    pub pull_batch_size: u32,
    /// The hot-fix version this build ships; fixes up to and including this
    /// version are applied once per version transition.
    pub hotfix_version: u32,
}

impl SyncConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            device_name: "quill device".to_string(),
            pull_batch_size: 100,
            hotfix_version: 1,
        }
    }

    /// Set the device name.
    pub fn with_device_name(mut self, name: &str) -> Self {
        self.device_name = name.to_string();
        self
    }

    /// Set the backlog pull batch size.
    pub fn with_pull_batch_size(mut self, size: u32) -> Self {
        self.pull_batch_size = size;
        self
    }

    /// Set the hot-fix version of this build.
    pub fn with_hotfix_version(mut self, version: u32) -> Self {
        self.hotfix_version = version;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.pull_batch_size, 100);
        assert_eq!(config.hotfix_version, 1);
    }

    #[test]
    fn builder_pattern() {
        let config = SyncConfig::new()
            .with_device_name("My Phone")
            .with_pull_batch_size(25)
            .with_hotfix_version(3);

        assert_eq!(config.device_name, "My Phone");
        assert_eq!(config.pull_batch_size, 25);
        assert_eq!(config.hotfix_version, 3);
    }
}
