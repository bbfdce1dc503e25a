//! Hand-rolled `no_std` error type for the control core.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoreError {
    /// A `Station` was asked for a channel index past its cardinality.
    ChannelIndexOutOfRange,
    /// A persisted record failed to save or load completely.
    PersistenceFailed,
}

impl core::fmt::Display for CoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CoreError::ChannelIndexOutOfRange => write!(f, "channel index out of range"),
            CoreError::PersistenceFailed => write!(f, "persistence operation failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}
