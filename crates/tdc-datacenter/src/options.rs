//! Decode configuration.

/// Number of string metadata slot lists following the values region.
pub const VALUES_METADATA_SLOTS: usize = 1024;

/// Number of string metadata slot lists following the names region.
pub const NAMES_METADATA_SLOTS: usize = 512;

/// Width in bytes of one opaque block record.
pub const OPAQUE_RECORD_SIZE: usize = 8;

/// Options for the structural pass.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Bytes skipped per opaque block record.
    pub opaque_record_size: usize,
    /// Parse the string metadata lists instead of skipping them.
    pub keep_string_metadata: bool,
    pub values_metadata_slots: usize,
    pub names_metadata_slots: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            opaque_record_size: OPAQUE_RECORD_SIZE,
            keep_string_metadata: false,
            values_metadata_slots: VALUES_METADATA_SLOTS,
            names_metadata_slots: NAMES_METADATA_SLOTS,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_opaque_record_size(mut self, size: usize) -> Self {
        self.opaque_record_size = size;
        self
    }

    pub fn with_string_metadata(mut self, keep: bool) -> Self {
        self.keep_string_metadata = keep;
        self
    }

    pub fn with_metadata_slots(mut self, values: usize, names: usize) -> Self {
        self.values_metadata_slots = values;
        self.names_metadata_slots = names;
        self
    }
}
