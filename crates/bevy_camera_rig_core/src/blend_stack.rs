//! Stack of running camera rigs, blended from bottom to top.
//!
//! Every entry owns the evaluators of one camera rig, plus the blend evaluator that mixes it into
//! the entries below. Once the blend of an entry is full, the entries below it no longer
//! contribute and are popped.

use bevy::log::{debug, warn};

use crate::{
    blend::{
        CameraNodeBlendInterruptionParams, CameraNodeBlendParams, CameraNodeBlendResult,
        CameraNodePreBlendParams, CameraNodePreBlendResult,
    },
    camera_node::CameraNodeRef,
    camera_rig::{CameraRigAsset, parameters::CameraRigParameters},
    context::{CameraEvaluationContextHandle, CameraEvaluationContexts},
    evaluation::{CameraNodeEvaluationParams, CameraNodeEvaluationResult},
    evaluator::{CameraNodeEvaluatorInitializeParams, EvaluatorHandle, tree::CameraNodeEvaluatorTree},
    pose::CameraPoseFlags,
    storage::{
        CameraNodeEvaluatorAllocationInfo, CameraNodeEvaluatorStorage,
        CameraNodeEvaluatorTreeBuildParams,
    },
};

pub const DEFAULT_MAX_BLEND_STACK_ENTRIES: usize = 8;

/// A camera rig to push onto a blend stack.
#[derive(Clone, Copy)]
pub struct CameraRigPushParams<'a> {
    pub rig_name: &'a str,
    pub root_node: &'a CameraNodeRef,
    pub allocation_info: Option<CameraNodeEvaluatorAllocationInfo>,
    /// Blend used to transition to the rig. Without one, the rig cuts in.
    pub blend: Option<&'a CameraNodeRef>,
    pub context: CameraEvaluationContextHandle,
    /// Defaults for variables the rig reads
    pub parameters: &'a CameraRigParameters,
}

impl<'a> CameraRigPushParams<'a> {
    pub fn from_rig(
        rig: &'a CameraRigAsset,
        blend: Option<&'a CameraNodeRef>,
        context: CameraEvaluationContextHandle,
    ) -> Self {
        Self {
            rig_name: &rig.name,
            root_node: &rig.root_node,
            allocation_info: Some(rig.allocation_info),
            blend,
            context,
            parameters: &rig.parameters,
        }
    }

    pub fn with_parameters(mut self, parameters: &'a CameraRigParameters) -> Self {
        self.parameters = parameters;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendStackPush {
    /// A new entry was pushed
    Pushed(u32),
    /// The top entry's blend was turned around instead of pushing a new entry
    Reversed(u32),
    /// The rig is already active, or already being blended back to
    AlreadyActive(u32),
}

/// Summary of one blend stack entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraBlendStackEntryInfo {
    pub entry_id: u32,
    pub rig_name: String,
    pub is_frozen: bool,
    pub is_reversing: bool,
    pub blend_factor: Option<f32>,
}

struct CameraBlendStackEntry {
    entry_id: u32,
    rig_name: String,
    /// Identifies the camera rig, dropped when the entry is frozen
    root_node: Option<CameraNodeRef>,
    context: CameraEvaluationContextHandle,
    parameters: CameraRigParameters,
    storage: CameraNodeEvaluatorStorage,
    root_evaluator: Option<EvaluatorHandle>,
    blend_evaluator: Option<EvaluatorHandle>,
    result: CameraNodeEvaluationResult,
    is_frozen: bool,
    is_first_frame: bool,
    is_reversing: bool,
    is_blend_full: bool,
    was_context_valid: bool,
    warned_invalid_context: bool,
}

impl CameraBlendStackEntry {
    fn tree(&self) -> CameraNodeEvaluatorTree<'_> {
        CameraNodeEvaluatorTree::new(&self.storage)
    }

    fn is_rig(&self, root_node: &CameraNodeRef) -> bool {
        self.root_node
            .as_ref()
            .is_some_and(|node| node.ptr_eq(root_node))
    }

    fn is_blending(&self) -> bool {
        self.blend_evaluator.is_some() && (!self.is_blend_full || self.is_reversing)
    }

    fn blend_factor(&self) -> Option<f32> {
        let evaluator = self.storage.try_borrow(self.blend_evaluator?).ok()?;
        evaluator.as_blend().map(|blend| blend.blend_factor())
    }

    fn set_reversed(&mut self, reversed: bool) -> bool {
        let Some(handle) = self.blend_evaluator else {
            return false;
        };
        let reversed = self
            .storage
            .get_mut(handle)
            .and_then(|evaluator| evaluator.as_blend_mut())
            .is_some_and(|blend| blend.set_reversed(reversed));
        reversed
    }

    fn teardown(&self) {
        self.tree().teardown(self.root_evaluator);
        self.tree().teardown(self.blend_evaluator);
    }
}

/// Ordered camera rig entries, blended from bottom to top.
pub struct CameraBlendStack {
    entries: Vec<CameraBlendStackEntry>,
    next_entry_id: u32,
    max_entries: usize,
    result: CameraNodeEvaluationResult,
}

impl Default for CameraBlendStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BLEND_STACK_ENTRIES)
    }
}

impl CameraBlendStack {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            next_entry_id: 0,
            max_entries: max_entries.max(1),
            result: CameraNodeEvaluationResult::default(),
        }
    }

    /// Takes effect on the next push.
    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries.max(1);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Result of the last evaluation.
    pub fn result(&self) -> &CameraNodeEvaluationResult {
        &self.result
    }

    pub fn entries(&self) -> impl Iterator<Item = CameraBlendStackEntryInfo> + '_ {
        self.entries.iter().map(|entry| CameraBlendStackEntryInfo {
            entry_id: entry.entry_id,
            rig_name: entry.rig_name.clone(),
            is_frozen: entry.is_frozen,
            is_reversing: entry.is_reversing,
            blend_factor: entry.blend_factor(),
        })
    }

    /// Name of the camera rig on top of the stack.
    pub fn active_rig_name(&self) -> Option<&str> {
        self.entries.last().map(|entry| entry.rig_name.as_str())
    }

    /// Starts transitioning to a camera rig.
    ///
    /// Going back to the rig below a top entry that is still blending in turns that blend
    /// around instead of pushing another entry, if the blend supports it. Pushing the rig that is
    /// already active does nothing.
    pub fn push(
        &mut self,
        params: CameraRigPushParams,
        contexts: &CameraEvaluationContexts,
    ) -> BlendStackPush {
        if let Some(push) = self.try_redirect_top(&params) {
            return push;
        }

        let entry_id = self.next_entry_id;
        self.next_entry_id = self.next_entry_id.wrapping_add(1);

        let mut storage = CameraNodeEvaluatorStorage::default();
        let root_evaluator = storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
            root_camera_node: Some(params.root_node),
            allocation_info: params.allocation_info,
        });
        let blend_evaluator = storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
            root_camera_node: params.blend,
            allocation_info: None,
        });

        let context_result = contexts.get(params.context);
        let was_context_valid =
            context_result.is_some_and(|context| context.initial_result.is_valid);
        let mut result = match context_result {
            Some(context) => context.initial_result.clone(),
            None => {
                warn!(
                    "Pushing camera rig {} with a missing evaluation context",
                    params.rig_name
                );
                CameraNodeEvaluationResult::default()
            }
        };
        params.parameters.apply_defaults(&mut result.variable_table);

        let previous = self.entries.last();
        {
            let tree = CameraNodeEvaluatorTree::new(&storage);
            let initialize_params = CameraNodeEvaluatorInitializeParams {
                last_active_result: previous.map(|entry| &entry.result),
            };
            tree.initialize(root_evaluator, &initialize_params, &mut result);
            tree.initialize(blend_evaluator, &initialize_params, &mut result);
        }

        if let (Some(previous), Some(blend_handle)) = (previous, blend_evaluator) {
            if previous.is_blending() {
                let interrupted_blend = previous
                    .blend_evaluator
                    .and_then(|handle| previous.storage.try_borrow(handle).ok());
                let resumed = storage
                    .get_mut(blend_handle)
                    .and_then(|evaluator| evaluator.as_blend_mut())
                    .is_some_and(|blend| {
                        blend.initialize_from_interruption(&CameraNodeBlendInterruptionParams {
                            interrupted_blend: interrupted_blend
                                .as_deref()
                                .and_then(|evaluator| evaluator.as_blend()),
                            interrupted_result: &previous.result,
                        })
                    });
                if !resumed {
                    debug!(
                        "Blend to camera rig {} can't resume the interrupted blend, starting over",
                        params.rig_name
                    );
                }
            }
        }

        debug!("Pushing camera rig {} (entry {entry_id})", params.rig_name);
        self.entries.push(CameraBlendStackEntry {
            entry_id,
            rig_name: params.rig_name.to_string(),
            root_node: Some(params.root_node.clone()),
            context: params.context,
            parameters: params.parameters.clone(),
            storage,
            root_evaluator,
            blend_evaluator,
            result,
            is_frozen: false,
            is_first_frame: true,
            is_reversing: false,
            is_blend_full: blend_evaluator.is_none(),
            was_context_valid,
            warned_invalid_context: false,
        });

        while self.entries.len() > self.max_entries {
            let entry = self.entries.remove(0);
            debug!(
                "Blend stack is full, dropping camera rig {} (entry {})",
                entry.rig_name, entry.entry_id
            );
            entry.teardown();
        }

        BlendStackPush::Pushed(entry_id)
    }

    fn try_redirect_top(&mut self, params: &CameraRigPushParams) -> Option<BlendStackPush> {
        let root_node = params.root_node;
        let (below, top) = match self.entries.as_mut_slice() {
            [] => return None,
            [top] => (None, top),
            [.., below, top] => (Some(below), top),
        };

        if !top.is_reversing && top.is_rig(root_node) && top.context == params.context {
            debug!("Camera rig {} is already active", top.rig_name);
            return Some(BlendStackPush::AlreadyActive(top.entry_id));
        }

        let below = below?;

        if top.is_reversing && below.is_rig(root_node) {
            debug!("Already blending back to camera rig {}", below.rig_name);
            return Some(BlendStackPush::AlreadyActive(below.entry_id));
        }

        // Returning to the rig the top entry blends away from
        if !top.is_reversing && top.is_blending() && below.is_rig(root_node) {
            if top.set_reversed(true) {
                top.is_reversing = true;
                debug!(
                    "Reversing blend of camera rig {} back to {}",
                    top.rig_name, below.rig_name
                );
                return Some(BlendStackPush::Reversed(top.entry_id));
            }
            return None;
        }

        // Changing our mind again while reversing
        if top.is_reversing && top.is_rig(root_node) && top.set_reversed(false) {
            top.is_reversing = false;
            debug!("Resuming blend of camera rig {}", top.rig_name);
            return Some(BlendStackPush::Reversed(top.entry_id));
        }

        None
    }

    /// Evaluates every entry and blends their results, from bottom to top.
    pub fn evaluate(
        &mut self,
        params: &CameraNodeEvaluationParams,
        contexts: &CameraEvaluationContexts,
    ) -> &CameraNodeEvaluationResult {
        self.resolve_entries(contexts);

        for entry in self.entries.iter_mut() {
            let entry_params = CameraNodeEvaluationParams {
                is_first_frame: entry.is_first_frame,
                ..*params
            };

            let initial_result = contexts
                .get(entry.context)
                .map(|context| &context.initial_result)
                .filter(|_| !entry.is_frozen);
            match initial_result {
                Some(initial_result) if initial_result.is_valid => {
                    let is_context_back = !entry.was_context_valid && !entry.is_first_frame;
                    entry.was_context_valid = true;
                    entry.warned_invalid_context = false;

                    entry.result.clone_from(initial_result);
                    entry
                        .parameters
                        .apply_defaults(&mut entry.result.variable_table);
                    entry.result.reset_frame_flags();
                    // The rig's whole pose takes part in blending, not only what it changed
                    entry
                        .result
                        .camera_pose
                        .set_changed_flags(CameraPoseFlags::all());
                    entry.result.is_camera_cut =
                        entry.is_first_frame || is_context_back || initial_result.is_camera_cut;

                    let tree = CameraNodeEvaluatorTree::new(&entry.storage);
                    tree.update_parameters(entry.root_evaluator, &entry_params, &mut entry.result);
                    tree.run(entry.root_evaluator, &entry_params, &mut entry.result);
                }
                Some(_) => {
                    // Keep the last result until the context is usable again
                    entry.was_context_valid = false;
                    if !entry.warned_invalid_context {
                        warn!(
                            "Evaluation context of camera rig {} has no valid initial result",
                            entry.rig_name
                        );
                        entry.warned_invalid_context = true;
                    }
                }
                None => {}
            }

            // Blends keep running after a freeze, from the state they were in
            let mut blend_scratch = CameraNodeEvaluationResult::default();
            CameraNodeEvaluatorTree::new(&entry.storage).run(
                entry.blend_evaluator,
                &entry_params,
                &mut blend_scratch,
            );

            entry.is_first_frame = false;
        }

        self.blend_entries(params);
        &self.result
    }

    fn blend_entries(&mut self, params: &CameraNodeEvaluationParams) {
        let mut blended: Option<CameraNodeEvaluationResult> = None;
        let mut covered_below = 0;
        let mut finished_reversals = Vec::new();

        for (index, entry) in self.entries.iter_mut().enumerate() {
            let Some(accumulated) = blended.as_mut() else {
                blended = Some(entry.result.clone());
                continue;
            };

            let Some(blend_handle) = entry.blend_evaluator else {
                // No blend, the entry cuts in
                accumulated.clone_from(&entry.result);
                entry.is_blend_full = true;
                covered_below = index;
                continue;
            };

            let tree = CameraNodeEvaluatorTree::new(&entry.storage);
            let outcome = tree.with_evaluator_mut(blend_handle, |evaluator| {
                let blend = evaluator.as_blend_mut()?;

                let mut pre_blend_result =
                    CameraNodePreBlendResult::new(&mut accumulated.variable_table);
                blend.blend_parameters(
                    &CameraNodePreBlendParams {
                        evaluation_params: params,
                        last_camera_pose: &accumulated.camera_pose,
                        child_variable_table: &entry.result.variable_table,
                    },
                    &mut pre_blend_result,
                );

                let mut blend_result = CameraNodeBlendResult::new(accumulated);
                blend.blend_results(
                    &CameraNodeBlendParams {
                        evaluation_params: params,
                        child_result: &entry.result,
                    },
                    &mut blend_result,
                );
                Some((blend_result.is_blend_full, blend_result.is_blend_finished))
            });

            let Some(Some((is_full, is_finished))) = outcome else {
                warn!(
                    "Camera rig {} has no usable blend, cutting to it",
                    entry.rig_name
                );
                accumulated.clone_from(&entry.result);
                entry.is_blend_full = true;
                covered_below = index;
                continue;
            };

            entry.is_blend_full = is_full;
            if is_full && !entry.is_reversing {
                covered_below = index;
            }
            if is_finished && entry.is_reversing {
                finished_reversals.push(entry.entry_id);
            }
        }

        for entry in self.entries.drain(..covered_below) {
            debug!(
                "Popping camera rig {} (entry {}), fully blended out",
                entry.rig_name, entry.entry_id
            );
            entry.teardown();
        }
        self.entries.retain(|entry| {
            let keep = !finished_reversals.contains(&entry.entry_id);
            if !keep {
                debug!(
                    "Popping camera rig {} (entry {}), reversed blend finished",
                    entry.rig_name, entry.entry_id
                );
                entry.teardown();
            }
            keep
        });

        self.result = blended.unwrap_or_default();
    }

    /// Freezes entries whose evaluation context went away.
    fn resolve_entries(&mut self, contexts: &CameraEvaluationContexts) {
        for index in 0..self.entries.len() {
            let entry = &self.entries[index];
            if !entry.is_frozen && !contexts.contains(entry.context) {
                warn!(
                    "Evaluation context of camera rig {} is gone, freezing it",
                    entry.rig_name
                );
                self.freeze_entry_at(index);
            }
        }
    }

    /// Freezes an entry: its blend is detached from its camera node, and the rig's evaluators
    /// are destroyed. The entry keeps blending its last result.
    pub fn freeze_entry(&mut self, entry_id: u32) -> bool {
        match self
            .entries
            .iter()
            .position(|entry| entry.entry_id == entry_id)
        {
            Some(index) => {
                self.freeze_entry_at(index);
                true
            }
            None => false,
        }
    }

    /// Freezes every entry running the camera rig with the given root node, e.g. because the rig
    /// asset is being unloaded.
    pub fn freeze_rig(&mut self, root_node: &CameraNodeRef) {
        for index in 0..self.entries.len() {
            if self.entries[index].is_rig(root_node) {
                self.freeze_entry_at(index);
            }
        }
    }

    /// Whether a non-frozen entry runs the camera rig with the given root node.
    pub fn contains_rig(&self, root_node: &CameraNodeRef) -> bool {
        self.entries.iter().any(|entry| entry.is_rig(root_node))
    }

    /// Rebuilds the evaluators of every entry running `previous_root` from `root_node`, e.g.
    /// because the rig asset was reloaded. Blends in progress carry on. Returns the number of
    /// rebuilt entries.
    pub fn reload_rig(
        &mut self,
        previous_root: &CameraNodeRef,
        root_node: &CameraNodeRef,
    ) -> usize {
        let mut reloaded = 0;
        for entry in self
            .entries
            .iter_mut()
            .filter(|entry| entry.is_rig(previous_root))
        {
            if let Some(root) = entry.root_evaluator.take() {
                entry.tree().teardown(Some(root));
                entry.storage.destroy_evaluator_subtree(root, true);
            }

            // The rig's page was sized for the previous tree
            entry.root_evaluator =
                entry.storage.build_evaluator_tree(&CameraNodeEvaluatorTreeBuildParams {
                    root_camera_node: Some(root_node),
                    allocation_info: None,
                });
            entry.root_node = Some(root_node.clone());

            let last_result = entry.result.clone();
            CameraNodeEvaluatorTree::new(&entry.storage).initialize(
                entry.root_evaluator,
                &CameraNodeEvaluatorInitializeParams {
                    last_active_result: Some(&last_result),
                },
                &mut entry.result,
            );
            entry.is_first_frame = true;

            debug!(
                "Reloaded camera rig {} (entry {})",
                entry.rig_name, entry.entry_id
            );
            reloaded += 1;
        }
        reloaded
    }

    fn freeze_entry_at(&mut self, index: usize) {
        let entry = &mut self.entries[index];
        if entry.is_frozen {
            return;
        }

        if let Some(blend) = entry
            .blend_evaluator
            .and_then(|handle| entry.storage.get_mut(handle))
            .and_then(|evaluator| evaluator.as_blend_mut())
        {
            blend.freeze();
        }

        if let Some(root) = entry.root_evaluator.take() {
            entry.tree().teardown(Some(root));
            entry.storage.destroy_evaluator_subtree(root, true);
        }

        entry.root_node = None;
        entry.is_frozen = true;
        debug!(
            "Froze camera rig {} (entry {})",
            entry.rig_name, entry.entry_id
        );
    }

    /// Pops every entry.
    pub fn clear(&mut self) {
        for entry in self.entries.drain(..) {
            entry.teardown();
        }
        self.result = CameraNodeEvaluationResult::default();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy::math::Vec3;

    use super::*;
    use crate::{
        blend::{BlendCameraNodeEvaluator, SimpleBlendState},
        camera_node::CameraNode,
        context::CameraEvaluationContext,
        evaluator::{CameraNodeEvaluator, builder::CameraNodeEvaluatorBuilder},
    };

    /// Sets the camera location to a constant.
    #[derive(Debug)]
    struct LocationNode(Vec3);

    #[derive(Debug)]
    struct LocationEvaluator(Vec3);

    impl CameraNode for LocationNode {
        fn build_evaluator(
            self: Arc<Self>,
            builder: &mut CameraNodeEvaluatorBuilder,
        ) -> EvaluatorHandle {
            builder.construct(LocationEvaluator(self.0))
        }
    }

    impl CameraNodeEvaluator for LocationEvaluator {
        fn on_run(
            &mut self,
            _params: &CameraNodeEvaluationParams,
            _tree: &CameraNodeEvaluatorTree,
            result: &mut CameraNodeEvaluationResult,
        ) {
            result.camera_pose.set_location(self.0);
        }
    }

    /// Linear blend over a fixed duration.
    #[derive(Debug)]
    struct LinearBlendNode {
        duration: f32,
        reversible: bool,
    }

    #[derive(Debug)]
    struct LinearBlendEvaluator {
        node: Option<Arc<LinearBlendNode>>,
        duration: f32,
        reversible: bool,
        state: SimpleBlendState,
    }

    impl CameraNode for LinearBlendNode {
        fn build_evaluator(
            self: Arc<Self>,
            builder: &mut CameraNodeEvaluatorBuilder,
        ) -> EvaluatorHandle {
            builder.construct(LinearBlendEvaluator {
                duration: self.duration,
                reversible: self.reversible,
                node: Some(self),
                state: SimpleBlendState::default(),
            })
        }
    }

    impl CameraNodeEvaluator for LinearBlendEvaluator {
        fn on_run(
            &mut self,
            params: &CameraNodeEvaluationParams,
            _tree: &CameraNodeEvaluatorTree,
            _result: &mut CameraNodeEvaluationResult,
        ) {
            self.state
                .advance(params.delta_time / self.duration, |alpha| alpha);
        }

        fn as_blend(&self) -> Option<&dyn BlendCameraNodeEvaluator> {
            Some(self)
        }

        fn as_blend_mut(&mut self) -> Option<&mut dyn BlendCameraNodeEvaluator> {
            Some(self)
        }
    }

    impl BlendCameraNodeEvaluator for LinearBlendEvaluator {
        fn blend_parameters(
            &mut self,
            params: &CameraNodePreBlendParams,
            result: &mut CameraNodePreBlendResult,
        ) {
            self.state.blend_parameters(params, result);
        }

        fn blend_results(
            &mut self,
            params: &CameraNodeBlendParams,
            result: &mut CameraNodeBlendResult,
        ) {
            self.state.blend_results(params, result);
        }

        fn initialize_from_interruption(
            &mut self,
            params: &CameraNodeBlendInterruptionParams,
        ) -> bool {
            params.interrupted_blend.is_some()
        }

        fn set_reversed(&mut self, reversed: bool) -> bool {
            if self.reversible {
                self.state.set_reversed(reversed);
            }
            self.reversible
        }

        fn is_reversed(&self) -> bool {
            self.state.is_reversed()
        }

        fn blend_factor(&self) -> f32 {
            self.state.blend_factor()
        }

        fn freeze(&mut self) {
            self.node = None;
        }

        fn is_frozen(&self) -> bool {
            self.node.is_none()
        }
    }

    struct Fixture {
        contexts: CameraEvaluationContexts,
        context: CameraEvaluationContextHandle,
        stack: CameraBlendStack,
        rig_a: CameraNodeRef,
        rig_b: CameraNodeRef,
        blend: CameraNodeRef,
    }

    impl Fixture {
        fn new(reversible: bool) -> Self {
            let mut contexts = CameraEvaluationContexts::default();
            let context = contexts.insert(CameraEvaluationContext::default());
            Self {
                contexts,
                context,
                stack: CameraBlendStack::default(),
                rig_a: CameraNodeRef::new(LocationNode(Vec3::ZERO)),
                rig_b: CameraNodeRef::new(LocationNode(Vec3::X * 10.)),
                blend: CameraNodeRef::new(LinearBlendNode {
                    duration: 1.,
                    reversible,
                }),
            }
        }

        fn push(&mut self, rig: &CameraNodeRef, blend: bool) -> BlendStackPush {
            let blend = blend.then_some(&self.blend);
            self.stack.push(
                CameraRigPushParams {
                    rig_name: if rig.ptr_eq(&self.rig_a) { "a" } else { "b" },
                    root_node: rig,
                    allocation_info: Some(CameraNodeEvaluatorAllocationInfo::compute(Some(rig))),
                    blend,
                    context: self.context,
                    parameters: &CameraRigParameters::default(),
                },
                &self.contexts,
            )
        }

        fn evaluate(&mut self, delta_time: f32) -> f32 {
            self.stack
                .evaluate(&CameraNodeEvaluationParams::new(delta_time), &self.contexts)
                .camera_pose
                .location()
                .x
        }
    }

    #[test]
    fn empty_stack_evaluates_to_default() {
        let mut fixture = Fixture::new(true);
        assert_eq!(fixture.evaluate(0.1), 0.);
        assert!(fixture.stack.is_empty());
    }

    #[test]
    fn cut_replaces_lower_entries() {
        let mut fixture = Fixture::new(true);
        let (rig_a, rig_b) = (fixture.rig_a.clone(), fixture.rig_b.clone());
        assert_eq!(fixture.push(&rig_a, false), BlendStackPush::Pushed(0));
        fixture.evaluate(0.1);
        assert!(fixture.stack.result().is_camera_cut);

        assert_eq!(fixture.push(&rig_b, false), BlendStackPush::Pushed(1));
        assert_eq!(fixture.evaluate(0.1), 10.);
        assert_eq!(fixture.stack.len(), 1);
        assert_eq!(fixture.stack.active_rig_name(), Some("b"));
    }

    #[test]
    fn blend_pops_lower_entry_once_full() {
        let mut fixture = Fixture::new(true);
        let (rig_a, rig_b) = (fixture.rig_a.clone(), fixture.rig_b.clone());
        fixture.push(&rig_a, false);
        fixture.evaluate(0.1);

        fixture.push(&rig_b, true);
        assert!((fixture.evaluate(0.25) - 2.5).abs() < 1e-4);
        assert_eq!(fixture.stack.len(), 2);
        assert!((fixture.evaluate(0.25) - 5.).abs() < 1e-4);

        fixture.evaluate(0.5);
        assert_eq!(fixture.stack.len(), 1);
        assert_eq!(fixture.evaluate(0.1), 10.);
    }

    #[test]
    fn blending_to_the_default_pose_moves_the_camera() {
        let mut fixture = Fixture::new(true);
        let (rig_a, rig_b) = (fixture.rig_a.clone(), fixture.rig_b.clone());
        fixture.push(&rig_b, false);
        assert_eq!(fixture.evaluate(0.1), 10.);

        // Rig a leaves the location at its default value
        fixture.push(&rig_a, true);
        assert!((fixture.evaluate(0.5) - 5.).abs() < 1e-4);

        fixture.evaluate(0.5);
        assert_eq!(fixture.stack.len(), 1);
        assert_eq!(fixture.evaluate(0.1), 0.);
    }

    #[test]
    fn pushing_the_active_rig_again_does_nothing() {
        let mut fixture = Fixture::new(true);
        let (rig_a, rig_b) = (fixture.rig_a.clone(), fixture.rig_b.clone());
        assert_eq!(fixture.push(&rig_a, false), BlendStackPush::Pushed(0));
        assert_eq!(fixture.push(&rig_a, true), BlendStackPush::AlreadyActive(0));

        assert_eq!(fixture.push(&rig_b, true), BlendStackPush::Pushed(1));
        fixture.evaluate(0.5);
        assert_eq!(fixture.push(&rig_a, true), BlendStackPush::Reversed(1));
        assert_eq!(fixture.push(&rig_a, true), BlendStackPush::AlreadyActive(0));
        assert_eq!(fixture.stack.len(), 2);
    }

    #[test]
    fn going_back_reverses_the_blend() {
        let mut fixture = Fixture::new(true);
        let (rig_a, rig_b) = (fixture.rig_a.clone(), fixture.rig_b.clone());
        fixture.push(&rig_a, false);
        fixture.evaluate(0.1);
        fixture.push(&rig_b, true);
        fixture.evaluate(0.5);

        assert_eq!(fixture.push(&rig_a, true), BlendStackPush::Reversed(1));
        assert_eq!(fixture.stack.len(), 2);
        assert!((fixture.evaluate(0.25) - 2.5).abs() < 1e-4);

        // Reverse the reversal
        assert_eq!(fixture.push(&rig_b, true), BlendStackPush::Reversed(1));
        assert!((fixture.evaluate(0.25) - 5.).abs() < 1e-4);

        fixture.push(&rig_a, true);
        fixture.evaluate(0.25);
        fixture.evaluate(0.25);
        assert_eq!(fixture.stack.len(), 1);
        assert_eq!(fixture.stack.active_rig_name(), Some("a"));
        assert_eq!(fixture.evaluate(0.1), 0.);
    }

    #[test]
    fn unreversible_blend_pushes_a_new_entry() {
        let mut fixture = Fixture::new(false);
        let (rig_a, rig_b) = (fixture.rig_a.clone(), fixture.rig_b.clone());
        fixture.push(&rig_a, false);
        fixture.evaluate(0.1);
        fixture.push(&rig_b, true);
        fixture.evaluate(0.5);

        assert_eq!(fixture.push(&rig_a, true), BlendStackPush::Pushed(2));
        assert_eq!(fixture.stack.len(), 3);
    }

    #[test]
    fn removing_the_context_freezes_entries() {
        let mut fixture = Fixture::new(true);
        let (rig_a, rig_b) = (fixture.rig_a.clone(), fixture.rig_b.clone());
        fixture.push(&rig_a, false);
        fixture.evaluate(0.1);
        fixture.push(&rig_b, true);
        fixture.evaluate(0.5);

        fixture.contexts.remove(fixture.context);
        let x = fixture.evaluate(0.25);
        assert!((x - 7.5).abs() < 1e-4);
        assert!(fixture.stack.entries().all(|entry| entry.is_frozen));

        // Frozen entries keep their last result while the blend finishes
        fixture.evaluate(0.25);
        fixture.evaluate(0.1);
        assert_eq!(fixture.stack.len(), 1);
        assert_eq!(fixture.evaluate(0.1), 10.);
    }

    #[test]
    fn context_becoming_valid_again_cuts() {
        let mut fixture = Fixture::new(true);
        let rig_b = fixture.rig_b.clone();
        fixture.push(&rig_b, false);
        fixture.evaluate(0.1);
        assert!(fixture.stack.result().is_camera_cut);
        fixture.evaluate(0.1);
        assert!(!fixture.stack.result().is_camera_cut);

        let context = fixture.context;
        fixture.contexts.get_mut(context).unwrap().initial_result.is_valid = false;
        assert_eq!(fixture.evaluate(0.1), 10.);
        assert!(!fixture.stack.result().is_camera_cut);
        assert!(fixture.stack.entries().all(|entry| !entry.is_frozen));

        fixture.contexts.get_mut(context).unwrap().initial_result.is_valid = true;
        fixture.evaluate(0.1);
        assert!(fixture.stack.result().is_camera_cut);
        fixture.evaluate(0.1);
        assert!(!fixture.stack.result().is_camera_cut);
    }

    #[test]
    fn reloading_a_rig_rebuilds_its_entries() {
        let mut fixture = Fixture::new(true);
        let rig_b = fixture.rig_b.clone();
        fixture.push(&rig_b, false);
        assert_eq!(fixture.evaluate(0.1), 10.);

        let reloaded = CameraNodeRef::new(LocationNode(Vec3::X * 3.));
        assert_eq!(fixture.stack.reload_rig(&rig_b, &reloaded), 1);
        assert!(!fixture.stack.contains_rig(&rig_b));
        assert!(fixture.stack.contains_rig(&reloaded));

        assert_eq!(fixture.evaluate(0.1), 3.);
        assert!(fixture.stack.result().is_camera_cut);
        assert_eq!(fixture.stack.reload_rig(&rig_b, &reloaded), 0);
    }

    #[test]
    fn freezing_an_entry_detaches_its_blend() {
        let mut fixture = Fixture::new(true);
        let (rig_a, rig_b) = (fixture.rig_a.clone(), fixture.rig_b.clone());
        fixture.push(&rig_a, false);
        fixture.push(&rig_b, true);
        fixture.evaluate(0.5);

        assert!(fixture.stack.freeze_entry(1));
        assert!(!fixture.stack.freeze_entry(42));

        let entry = &fixture.stack.entries[1];
        assert!(entry.root_evaluator.is_none());
        assert!(entry.root_node.is_none());
        let blend = entry.storage.try_borrow(entry.blend_evaluator.unwrap()).unwrap();
        assert!(blend.as_blend().unwrap().is_frozen());
        assert_eq!(entry.storage.live_evaluator_count(), 1);
    }

    #[test]
    fn stack_depth_is_bounded() {
        let mut fixture = Fixture::new(false);
        fixture.stack = CameraBlendStack::new(3);
        let (rig_a, rig_b) = (fixture.rig_a.clone(), fixture.rig_b.clone());
        for i in 0..5 {
            fixture.push(if i % 2 == 0 { &rig_a } else { &rig_b }, true);
        }
        assert_eq!(fixture.stack.len(), 3);
        assert_eq!(
            fixture
                .stack
                .entries()
                .map(|entry| entry.entry_id)
                .collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
    }
}
