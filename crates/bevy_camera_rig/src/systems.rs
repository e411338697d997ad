use bevy::{
    asset::{AssetEvent, AssetServer, Assets, LoadState},
    camera::{OrthographicProjection, PerspectiveProjection, Projection, ScalingMode},
    ecs::{
        message::MessageReader,
        system::{Query, Res},
    },
    log::warn,
    time::Time,
    transform::components::{GlobalTransform, Transform},
};
use bevy_camera_rig_core::{
    camera_rig::CameraRigAsset,
    pose::{CameraPose, CameraProjectionMode},
    settings::CameraRigSettings,
};

use crate::player::CameraRigPlayer;

/// Evaluates every [`CameraRigPlayer`] and writes the resulting pose to its camera.
pub fn update_camera_rig_players(
    time: Res<Time>,
    settings: Res<CameraRigSettings>,
    rigs: Res<Assets<CameraRigAsset>>,
    asset_server: Res<AssetServer>,
    mut rig_events: MessageReader<AssetEvent<CameraRigAsset>>,
    targets: Query<&GlobalTransform>,
    mut players: Query<(&mut CameraRigPlayer, &mut Transform, Option<&mut Projection>)>,
) {
    let rig_events: Vec<_> = rig_events.read().copied().collect();

    for (mut player, mut transform, projection) in &mut players {
        for event in &rig_events {
            player.handle_rig_event(event, &rigs);
        }

        if let Some(target) = player.target {
            match targets.get(target) {
                Ok(target_transform) => {
                    player.set_target_transform(&target_transform.compute_transform());
                }
                Err(_) => {
                    warn!("Camera target {target} is gone, freezing the camera rigs following it");
                    player.target = None;
                    player.reset_context();
                }
            }
        }

        player.cancel_failed_transition(|rig| {
            matches!(asset_server.load_state(rig), LoadState::Failed(_))
        });

        let pose = player
            .update(time.delta_secs(), &rigs, &settings)
            .camera_pose
            .clone();
        if player.blend_stack.is_empty() {
            continue;
        }

        apply_camera_pose(&pose, &mut transform, projection.map(|p| p.into_inner()));
    }
}

/// Writes a camera pose to a camera's transform and projection.
pub fn apply_camera_pose(
    pose: &CameraPose,
    transform: &mut Transform,
    projection: Option<&mut Projection>,
) {
    transform.translation = pose.location();
    transform.rotation = pose.rotation();

    let Some(projection) = projection else {
        return;
    };

    match (pose.projection_mode(), &mut *projection) {
        (CameraProjectionMode::Perspective, Projection::Perspective(perspective)) => {
            perspective.fov = pose.effective_field_of_view().to_radians();
            perspective.near = pose.near_clipping_plane();
            perspective.far = pose.far_clipping_plane();
        }
        (CameraProjectionMode::Orthographic, Projection::Orthographic(orthographic)) => {
            orthographic.near = pose.near_clipping_plane();
            orthographic.far = pose.far_clipping_plane();
            orthographic.scaling_mode = ScalingMode::FixedHorizontal {
                viewport_width: pose.orthographic_width(),
            };
        }
        (CameraProjectionMode::Perspective, _) => {
            *projection = Projection::Perspective(PerspectiveProjection {
                fov: pose.effective_field_of_view().to_radians(),
                near: pose.near_clipping_plane(),
                far: pose.far_clipping_plane(),
                ..Default::default()
            });
        }
        (CameraProjectionMode::Orthographic, _) => {
            *projection = Projection::Orthographic(OrthographicProjection {
                near: pose.near_clipping_plane(),
                far: pose.far_clipping_plane(),
                scaling_mode: ScalingMode::FixedHorizontal {
                    viewport_width: pose.orthographic_width(),
                },
                ..OrthographicProjection::default_3d()
            });
        }
    }
}
