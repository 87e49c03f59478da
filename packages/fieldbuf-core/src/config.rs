//! Codec configuration.

/// Limits applied by the value codecs and the record layout engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecConfig {
    /// Maximum encoded record size in bytes (wrap and encode)
    pub max_record_size: usize,
    /// Maximum number of elements in a collection field
    pub max_list_elements: usize,
    /// Largest accepted magnitude for FLOAT and DOUBLE values
    pub float_magnitude_limit: f64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_record_size: 64 * 1024 * 1024,   // 64 MiB
            max_list_elements: 16 * 1024 * 1024, // 16 Mi elements
            float_magnitude_limit: 1e20,
        }
    }
}
