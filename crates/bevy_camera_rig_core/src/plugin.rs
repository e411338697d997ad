use bevy::{
    app::{App, Plugin},
    asset::AssetApp,
};

use crate::{
    camera_rig::{CameraRigAsset, loader::CameraRigLoader},
    curves::{BlendCurve, CurveKey, KeyframeCurve},
    pose::{CameraPose, CameraProjectionMode},
    settings::CameraRigSettings,
    storage::CameraNodeEvaluatorAllocationInfo,
    variable_table::CameraVariableValue,
};

/// Registers camera rig assets, settings and reflected types.
///
/// Does not schedule any evaluation, see `CameraRigPlugin` in the facade crate for that.
#[derive(Default)]
pub struct CameraRigCorePlugin;

impl Plugin for CameraRigCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<CameraRigAsset>()
            .init_asset_loader::<CameraRigLoader>();

        app.init_resource::<CameraRigSettings>();

        app //
            .register_type::<CameraRigSettings>()
            .register_type::<CameraNodeEvaluatorAllocationInfo>()
            .register_type::<CameraPose>()
            .register_type::<CameraProjectionMode>()
            .register_type::<CameraVariableValue>()
            .register_type::<BlendCurve>()
            .register_type::<CurveKey>()
            .register_type::<KeyframeCurve>();
    }
}
