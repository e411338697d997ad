mod asset_loader_error;
mod camera_rig_error;

pub use asset_loader_error::*;
pub use camera_rig_error::*;
