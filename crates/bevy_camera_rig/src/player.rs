use bevy::{
    asset::{AssetEvent, AssetId, Assets, Handle},
    ecs::{component::Component, entity::Entity},
    log::{debug, warn},
    transform::components::Transform,
};
use bevy_camera_rig_builtin_nodes::blends::simple_fixed_time_blend_node::SimpleFixedTimeBlendCameraNode;
use bevy_camera_rig_core::{
    blend_stack::{CameraBlendStack, CameraRigPushParams},
    camera_node::CameraNodeRef,
    camera_rig::{CameraRigAsset, parameters::CameraRigParameters},
    context::{CameraEvaluationContext, CameraEvaluationContextHandle, CameraEvaluationContexts},
    curves::BlendCurve,
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    settings::CameraRigSettings,
    variable_table::{CameraVariableId, CameraVariableValue},
};

struct PendingTransition {
    rig: Handle<CameraRigAsset>,
    blend: Option<CameraNodeRef>,
    parameter_overrides: Option<CameraRigParameters>,
}

/// Drives a camera from camera rigs.
///
/// Transitions are requested with [`CameraRigPlayer::transition_to`], and happen as soon as the
/// camera rig asset is loaded. The first rig cuts in, later ones blend in with, in order of
/// preference, the blend given to the transition, the rig's own enter blend, or a
/// fixed time blend lasting [`CameraRigSettings::default_blend_time`].
#[derive(Component)]
pub struct CameraRigPlayer {
    pub(crate) blend_stack: CameraBlendStack,
    pub(crate) contexts: CameraEvaluationContexts,
    pub(crate) context: CameraEvaluationContextHandle,
    pub(crate) target: Option<Entity>,
    pending_transition: Option<PendingTransition>,
    active_rig: Option<Handle<CameraRigAsset>>,
    /// Root node each running camera rig asset was pushed with
    rig_roots: Vec<(AssetId<CameraRigAsset>, CameraNodeRef)>,
}

impl Default for CameraRigPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraRigPlayer {
    /// Create a new player, with no camera rig running
    pub fn new() -> Self {
        let mut contexts = CameraEvaluationContexts::default();
        let context = contexts.insert(CameraEvaluationContext::default());
        Self {
            blend_stack: CameraBlendStack::default(),
            contexts,
            context,
            target: None,
            pending_transition: None,
            active_rig: None,
            rig_roots: Vec::new(),
        }
    }

    /// Set the entity the camera follows
    pub fn with_target(mut self, target: Entity) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_rig(mut self, rig: Handle<CameraRigAsset>) -> Self {
        self.transition_to(rig);
        self
    }

    pub fn set_target(&mut self, target: Option<Entity>) -> &mut Self {
        self.target = target;
        self
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    /// Start transitioning to a camera rig, replacing any transition that hasn't started yet.
    pub fn transition_to(&mut self, rig: Handle<CameraRigAsset>) -> &mut Self {
        self.pending_transition = Some(PendingTransition {
            rig,
            blend: None,
            parameter_overrides: None,
        });
        self
    }

    /// Start transitioning to a camera rig with the given blend node.
    pub fn transition_to_with_blend(
        &mut self,
        rig: Handle<CameraRigAsset>,
        blend: CameraNodeRef,
    ) -> &mut Self {
        self.pending_transition = Some(PendingTransition {
            rig,
            blend: Some(blend),
            parameter_overrides: None,
        });
        self
    }

    /// Start transitioning to a camera rig, replacing some of its parameter defaults.
    ///
    /// Overrides only apply if the rig isn't already running.
    pub fn transition_to_with_parameters(
        &mut self,
        rig: Handle<CameraRigAsset>,
        overrides: CameraRigParameters,
    ) -> &mut Self {
        self.pending_transition = Some(PendingTransition {
            rig,
            blend: None,
            parameter_overrides: Some(overrides),
        });
        self
    }

    /// Camera rig last transitioned to.
    pub fn active_rig(&self) -> Option<&Handle<CameraRigAsset>> {
        self.active_rig.as_ref()
    }

    pub fn has_pending_transition(&self) -> bool {
        self.pending_transition.is_some()
    }

    pub fn blend_stack(&self) -> &CameraBlendStack {
        &self.blend_stack
    }

    /// Result of the last update.
    pub fn result(&self) -> &CameraNodeEvaluationResult {
        self.blend_stack.result()
    }

    /// Set a variable every camera rig run by this player starts from.
    pub fn set_variable(&mut self, name: &str, value: impl Into<CameraVariableValue>) {
        if let Some(context) = self.contexts.get_mut(self.context) {
            context
                .initial_result
                .variable_table
                .set(CameraVariableId::from_name(name), value.into());
        }
    }

    pub(crate) fn set_target_transform(&mut self, transform: &Transform) {
        if let Some(context) = self.contexts.get_mut(self.context) {
            context.set_target_transform(transform);
        }
    }

    /// Replaces the evaluation context. Entries still running in the old one get frozen.
    pub(crate) fn reset_context(&mut self) {
        self.contexts.remove(self.context);
        self.context = self.contexts.insert(CameraEvaluationContext::default());
    }

    /// Drops the pending transition if its camera rig failed to load.
    pub(crate) fn cancel_failed_transition(
        &mut self,
        is_failed: impl Fn(&Handle<CameraRigAsset>) -> bool,
    ) {
        if let Some(pending) = self
            .pending_transition
            .take_if(|pending| is_failed(&pending.rig))
        {
            warn!(
                "Camera rig {:?} failed to load, dropping transition",
                pending.rig
            );
        }
    }

    /// Freezes the running entries of a removed camera rig asset, and rebuilds those of a
    /// modified one.
    pub(crate) fn handle_rig_event(
        &mut self,
        event: &AssetEvent<CameraRigAsset>,
        rigs: &Assets<CameraRigAsset>,
    ) {
        match *event {
            AssetEvent::Removed { id } => {
                let blend_stack = &mut self.blend_stack;
                self.rig_roots.retain(|(rig_id, root)| {
                    if *rig_id != id {
                        return true;
                    }
                    blend_stack.freeze_rig(root);
                    false
                });
            }
            AssetEvent::Modified { id } => {
                let Some(rig) = rigs.get(id) else {
                    return;
                };
                for (rig_id, root) in self.rig_roots.iter_mut() {
                    if *rig_id != id || root.ptr_eq(&rig.root_node) {
                        continue;
                    }
                    let reloaded = self.blend_stack.reload_rig(root, &rig.root_node);
                    debug!("Camera rig {} changed, rebuilt {reloaded} entries", rig.name);
                    *root = rig.root_node.clone();
                }
            }
            _ => {}
        }
    }

    /// Starts the pending transition if possible, then evaluates the blend stack.
    pub fn update(
        &mut self,
        delta_time: f32,
        rigs: &Assets<CameraRigAsset>,
        settings: &CameraRigSettings,
    ) -> &CameraNodeEvaluationResult {
        self.blend_stack
            .set_max_entries(settings.max_blend_stack_entries);

        if let Some(context) = self.contexts.get_mut(self.context) {
            context
                .initial_result
                .camera_pose
                .set_field_of_view(settings.default_field_of_view);
        }

        let blend_stack = &self.blend_stack;
        self.rig_roots
            .retain(|(_, root)| blend_stack.contains_rig(root));

        self.start_pending_transition(rigs, settings);

        self.blend_stack.evaluate(
            &CameraNodeEvaluationParams::new(delta_time),
            &self.contexts,
        )
    }

    fn start_pending_transition(
        &mut self,
        rigs: &Assets<CameraRigAsset>,
        settings: &CameraRigSettings,
    ) {
        let Some(pending) = self.pending_transition.take() else {
            return;
        };
        let Some(rig) = rigs.get(&pending.rig) else {
            // Still loading
            self.pending_transition = Some(pending);
            return;
        };

        let default_blend;
        let blend = if self.blend_stack.is_empty() {
            None
        } else if let Some(blend) = pending.blend.as_ref().or(rig.enter_blend.as_ref()) {
            Some(blend)
        } else {
            default_blend = CameraNodeRef::new(SimpleFixedTimeBlendCameraNode::new(
                settings.default_blend_time,
                BlendCurve::default(),
            ));
            Some(&default_blend)
        };

        let parameters = pending
            .parameter_overrides
            .as_ref()
            .map(|overrides| rig.parameters.with_overrides(overrides));
        let mut push_params = CameraRigPushParams::from_rig(rig, blend, self.context);
        if let Some(parameters) = parameters.as_ref() {
            push_params = push_params.with_parameters(parameters);
        }

        let push = self.blend_stack.push(push_params, &self.contexts);
        debug!("Transition to camera rig {}: {push:?}", rig.name);

        let id = pending.rig.id();
        if !self
            .rig_roots
            .iter()
            .any(|(rig_id, root)| *rig_id == id && root.ptr_eq(&rig.root_node))
        {
            self.rig_roots.push((id, rig.root_node.clone()));
        }
        self.active_rig = Some(pending.rig);
    }
}
