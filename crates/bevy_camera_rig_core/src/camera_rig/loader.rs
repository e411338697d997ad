use bevy::{
    asset::{AssetLoader, LoadContext, io::Reader},
    reflect::TypePath,
};
use serde::Deserialize;

use super::{CameraRigAsset, parameters::CameraRigParameters};
use crate::{camera_node::CameraNodeRef, errors::AssetLoaderError};

/// ```ron
/// (
///     name: "follow",
///     root: (ty: "ArrayCameraNode", inner: (children: [...])),
///     enter_blend: Some((ty: "SimpleFixedTimeBlendCameraNode", inner: (blend_time: 0.5))),
///     parameters: {"distance": F32(4.0)},
/// )
/// ```
#[derive(Deserialize)]
struct CameraRigSerial {
    name: String,
    root: CameraNodeRef,
    #[serde(default)]
    enter_blend: Option<CameraNodeRef>,
    #[serde(default)]
    parameters: CameraRigParameters,
}

#[derive(Default, TypePath)]
pub struct CameraRigLoader;

impl AssetLoader for CameraRigLoader {
    type Asset = CameraRigAsset;
    type Settings = ();
    type Error = AssetLoaderError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes).await?;
        parse_camera_rig(&bytes)
    }

    fn extensions(&self) -> &[&str] {
        &["camrig.ron"]
    }
}

fn parse_camera_rig(bytes: &[u8]) -> Result<CameraRigAsset, AssetLoaderError> {
    let serial: CameraRigSerial = ron::de::from_bytes(bytes)?;

    let mut rig = CameraRigAsset::new(serial.name, serial.root);
    rig.enter_blend = serial.enter_blend;
    rig.parameters = serial.parameters;
    Ok(rig)
}
