//! Encoder configuration.

/// Settings that are not part of the IR module itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeConfig {
    /// Producer string written to the identification block
    pub(crate) producer: String,
    /// Bitcode epoch written to the identification block
    pub(crate) epoch: u64,
    /// Whether to write the identification block at all
    pub(crate) identification: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            producer: concat!("bitforge", env!("CARGO_PKG_VERSION")).to_owned(),
            epoch: 0,
            identification: true,
        }
    }
}

impl EncodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    pub fn epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn identification(mut self, value: bool) -> Self {
        self.identification = value;
        self
    }
}
