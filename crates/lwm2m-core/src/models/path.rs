//! Resource addressing

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a device resource: `(objectId, instanceId, resourceId)`.
///
/// The triple is opaque to the gateway; the device protocol is the authority
/// on whether an address is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourcePath {
    pub object_id: u16,
    pub instance_id: u16,
    pub resource_id: u16,
}

impl ResourcePath {
    pub fn new(object_id: u16, instance_id: u16, resource_id: u16) -> Self {
        Self {
            object_id,
            instance_id,
            resource_id,
        }
    }

    /// URI path segments in device-protocol order
    pub fn segments(&self) -> [String; 3] {
        [
            self.object_id.to_string(),
            self.instance_id.to_string(),
            self.resource_id.to_string(),
        ]
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{}/{}/{}",
            self.object_id, self.instance_id, self.resource_id
        )
    }
}
