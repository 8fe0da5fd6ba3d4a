//! Data model for the gateway core

pub mod operation;
pub mod path;
pub mod session;

pub use operation::{OperationKind, OperationOutcome, OperationRequest, WriteValue};
pub use path::ResourcePath;
pub use session::{DeviceSession, RegistrationEvent};
