/// Store configuration for resource limits and durability behavior
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum paste content size in bytes
    pub max_content_bytes: usize,

    /// Whether commits fsync the log before being acknowledged.
    /// Disabling trades durability for throughput (useful in benchmarks).
    pub fsync_writes: bool,
}

pub const DEFAULT_MAX_CONTENT_BYTES: usize = 1024 * 1024;

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            fsync_writes: true,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum paste content size in bytes
    pub fn with_max_content_bytes(mut self, bytes: usize) -> Self {
        self.max_content_bytes = bytes;
        self
    }

    /// Enable or disable fsync on commit
    pub fn with_fsync_writes(mut self, enabled: bool) -> Self {
        self.fsync_writes = enabled;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.max_content_bytes == 0 {
            return Err("max_content_bytes must be greater than 0".to_string());
        }

        Ok(())
    }
}
