use crate::models::luminaire::LuminaireId;
use crate::models::state::DeviceId;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Failures of the synchronous engine operations. None of them is fatal;
/// the operation that reported one had no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No cached state exists for the device.
    DeviceNotFound(DeviceId),
    LuminaireNotFound(LuminaireId),
    LightNotFound { luminaire: LuminaireId, index: usize },
    /// A device with this id already has cached state.
    DuplicateDevice(DeviceId),
    /// A luminaire with this id is already registered.
    DuplicateRegistration(LuminaireId),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::DeviceNotFound(id) => write!(f, "unknown device id {}", id),
            EngineError::LuminaireNotFound(id) => write!(f, "unknown luminaire id {}", id),
            EngineError::LightNotFound { luminaire, index } => {
                write!(f, "luminaire {} has no light {}", luminaire, index)
            }
            EngineError::DuplicateDevice(id) => write!(f, "device {} already registered", id),
            EngineError::DuplicateRegistration(id) => write!(f, "luminaire {} already registered", id),
        }
    }
}

impl Error for EngineError {}
