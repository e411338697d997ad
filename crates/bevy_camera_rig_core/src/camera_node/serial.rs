use ron::value::RawValue;
use serde::{Deserialize, Deserializer, de};

use super::CameraNodeRef;
use crate::type_registry::CameraObjectTypeRegistry;

/// On-disk form of a camera node: the registered type name, and the node itself.
///
/// ```ron
/// (ty: "OffsetCameraNode", inner: (offset: (0.0, 2.0, 5.0)))
/// ```
#[derive(Deserialize)]
struct CameraNodeSerial {
    ty: String,
    inner: Box<RawValue>,
}

impl<'de> Deserialize<'de> for CameraNodeRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let serial = CameraNodeSerial::deserialize(deserializer)?;

        // Children are deserialized from inside the deserializer, so the registry lock must not
        // be held while calling it.
        let deserialize_node = CameraObjectTypeRegistry::read()
            .node_deserializer(&serial.ty)
            .map_err(de::Error::custom)?;

        deserialize_node(&serial.inner).map_err(|err| {
            de::Error::custom(format!("invalid camera node `{}`: {err}", serial.ty))
        })
    }
}
