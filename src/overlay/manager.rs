//! Touch-layer lifecycle manager
//!
//! Maps active contact identities to indicator layers. Per identity:
//!
//! ```text
//! Absent --Began--> Active --Moved/Stationary--> Active
//! Active --Ended/Cancelled--> Removing --animation finished--> Absent
//! Active | Removing --disable / clear_indicators--> Absent
//! ```
//!
//! Active identities live in the touch-layer map. Removing layers are no longer keyed by
//! contact (the input system may hand the identity to a new contact right away); they are
//! tracked by the token of their disappear animation until the compositor reports it finished.

use crate::capture::touch::types::{ContactId, ContactPhase, ContactSample, EventBatch, InputEvent, Point};
use crate::compositor::{
    AnimationKey, AnimationToken, Appearance, Compositor, LayerId, LayerSpec, PositionUpdate,
};
use crate::animation::{presets, AnimatedProperty};
use crate::config::{DuplicateBeginPolicy, OverlayConfig};
use crate::error::{AnimationStage, LifecycleFault};
use crate::signal::VisibilitySignal;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Map entry for an active contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchLayer {
    /// Indicator layer in the compositing tree
    pub layer: LayerId,
    /// Last reported location of the contact
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRemoval {
    contact: ContactId,
    layer: LayerId,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleStats {
    /// Batches processed while visible
    pub batches: u64,
    /// Indicators created for a began contact
    pub inserted: u64,
    /// Position updates applied to live indicators
    pub moved: u64,
    /// Layers removed after their disappear animation finished
    pub animated_out: u64,
    /// Layers removed immediately (disable, duplicate replacement, animation fallback)
    pub released: u64,
    /// Lifecycle faults recorded, including ones evicted from the log
    pub faults: u64,
}

/// Bounded log of recent lifecycle faults
#[derive(Debug, Clone)]
pub struct Diagnostics {
    capacity: usize,
    recent: VecDeque<LifecycleFault>,
    total: u64,
}

impl Diagnostics {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            recent: VecDeque::with_capacity(capacity.min(256)),
            total: 0,
        }
    }

    fn record(&mut self, fault: LifecycleFault) {
        self.total += 1;
        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(fault);
    }

    /// Oldest first
    pub fn recent(&self) -> impl Iterator<Item = &LifecycleFault> {
        self.recent.iter()
    }

    pub fn last(&self) -> Option<&LifecycleFault> {
        self.recent.back()
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    /// Faults recorded since creation, including ones evicted from the log
    pub fn total(&self) -> u64 {
        self.total
    }
}

pub struct TouchLayerManager<C: Compositor> {
    compositor: C,
    config: OverlayConfig,
    visible: bool,
    layers: HashMap<ContactId, TouchLayer>,
    removals: HashMap<AnimationToken, PendingRemoval>,
    diagnostics: Diagnostics,
    stats: LifecycleStats,
}

impl<C: Compositor> TouchLayerManager<C> {
    pub fn new(compositor: C, config: OverlayConfig) -> Self {
        let diagnostics = Diagnostics::new(config.diagnostics_capacity);
        let visible = config.initially_visible;
        Self {
            compositor,
            config,
            visible,
            layers: HashMap::new(),
            removals: HashMap::new(),
            diagnostics,
            stats: LifecycleStats::default(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show_touches(&mut self) {
        self.set_visible(true);
    }

    pub fn hide_touches(&mut self) {
        self.set_visible(false);
    }

    /// Turning visibility off drops every indicator at once, without animation.
    /// Turning it on only affects contacts that begin afterwards.
    pub fn set_visible(&mut self, visible: bool) {
        if visible {
            if !self.visible {
                tracing::info!("Touch indicators enabled");
            }
            self.visible = true;
        } else {
            if self.visible {
                tracing::info!("Touch indicators disabled");
            }
            self.visible = false;
            self.clear_indicators();
        }
    }

    pub fn handle_signal(&mut self, signal: VisibilitySignal) {
        self.set_visible(signal.is_enable());
    }

    /// Observe one event from the dispatch path; non-touch events are ignored
    pub fn handle_event(&mut self, event: &InputEvent) {
        if let Some(batch) = event.touches() {
            self.on_event_batch(batch);
        }
    }

    /// Apply every sample of `batch`, in delivery order
    pub fn on_event_batch(&mut self, batch: &EventBatch) {
        if !self.visible {
            return;
        }
        self.stats.batches += 1;

        for sample in batch.iter() {
            match sample.phase {
                ContactPhase::Began => self.begin(sample),
                ContactPhase::Moved => self.moved(sample),
                ContactPhase::Stationary => {}
                ContactPhase::Ended | ContactPhase::Cancelled => self.end(sample),
            }
        }
    }

    /// Remove every indicator, active or animating out, without animation.
    ///
    /// Returns how many layers were removed. Calling it again is a no-op.
    pub fn clear_indicators(&mut self) -> usize {
        let active: Vec<TouchLayer> = self.layers.drain().map(|(_, entry)| entry).collect();
        let removing: Vec<PendingRemoval> = self.removals.drain().map(|(_, p)| p).collect();
        let count = active.len() + removing.len();

        for layer in active
            .iter()
            .map(|entry| entry.layer)
            .chain(removing.iter().map(|p| p.layer))
        {
            self.release_layer(layer);
        }

        if count > 0 {
            tracing::info!(
                "Cleared {} indicator(s) ({} active, {} animating out)",
                count,
                active.len(),
                removing.len()
            );
        }
        count
    }

    /// Run the continuations of every animation the compositor reports finished.
    ///
    /// Returns how many layers were removed from the tree.
    pub fn process_completions(&mut self) -> usize {
        let mut removed = 0;
        for token in self.compositor.take_finished() {
            // Appear animations and cancelled removals have no continuation
            let Some(pending) = self.removals.remove(&token) else {
                continue;
            };
            if let Err(e) = self.compositor.remove_layer(pending.layer) {
                tracing::warn!(
                    "Indicator {} for contact {} was already gone: {}",
                    pending.layer,
                    pending.contact,
                    e
                );
                continue;
            }
            tracing::debug!("Indicator for contact {} animated out", pending.contact);
            self.stats.animated_out += 1;
            removed += 1;
        }
        removed
    }

    /// Move the compositor clock and run any continuations that became due
    pub fn advance(&mut self, now: Duration) -> usize {
        self.compositor.advance(now);
        self.process_completions()
    }

    fn begin(&mut self, sample: &ContactSample) {
        if let Some(existing) = self.layers.get(&sample.id).copied() {
            let policy = self.config.duplicate_begin;
            self.record(LifecycleFault::DuplicateBegin {
                contact: sample.id,
                policy,
            });
            match policy {
                DuplicateBeginPolicy::Reject => return,
                DuplicateBeginPolicy::Replace => {
                    self.layers.remove(&sample.id);
                    self.release_layer(existing.layer);
                }
            }
        }

        let spec = LayerSpec::from_style(&self.config.style, sample.position);
        let layer = match self.compositor.insert_layer(&spec) {
            Ok(layer) => layer,
            Err(source) => {
                self.record(LifecycleFault::LayerInsertion {
                    contact: sample.id,
                    source,
                });
                return;
            }
        };

        if let Err(source) =
            self.compositor
                .attach_animation(layer, AnimationKey::TouchBegan, &self.config.appear)
        {
            self.record(LifecycleFault::AnimationAttachment {
                contact: sample.id,
                stage: AnimationStage::Appear,
                source,
            });
            self.settle_at_rest(layer);
        }

        self.layers.insert(
            sample.id,
            TouchLayer {
                layer,
                position: sample.position,
            },
        );
        self.stats.inserted += 1;
        tracing::debug!(
            "Indicator for contact {} at ({:.1}, {:.1})",
            sample.id,
            sample.position.x,
            sample.position.y
        );
    }

    fn moved(&mut self, sample: &ContactSample) {
        let Some(entry) = self.layers.get_mut(&sample.id) else {
            self.record(LifecycleFault::UnknownIdentity {
                contact: sample.id,
                phase: sample.phase,
            });
            return;
        };

        if let Err(e) =
            self.compositor
                .set_position(entry.layer, sample.position, PositionUpdate::Snap)
        {
            tracing::warn!("Could not move indicator for contact {}: {}", sample.id, e);
            return;
        }
        entry.position = sample.position;
        self.stats.moved += 1;
    }

    fn end(&mut self, sample: &ContactSample) {
        let Some(entry) = self.layers.remove(&sample.id) else {
            self.record(LifecycleFault::UnknownIdentity {
                contact: sample.id,
                phase: sample.phase,
            });
            return;
        };

        match self.compositor.attach_animation(
            entry.layer,
            AnimationKey::TouchEnded,
            &self.config.disappear,
        ) {
            Ok(token) => {
                self.removals.insert(
                    token,
                    PendingRemoval {
                        contact: sample.id,
                        layer: entry.layer,
                    },
                );
                tracing::debug!("Indicator for contact {} animating out", sample.id);
            }
            Err(source) => {
                self.record(LifecycleFault::AnimationAttachment {
                    contact: sample.id,
                    stage: AnimationStage::Disappear,
                    source,
                });
                self.release_layer(entry.layer);
            }
        }
    }

    /// Give a layer whose appear animation was refused the appearance it would have ended in
    fn settle_at_rest(&mut self, layer: LayerId) {
        let appear = &self.config.appear;
        let final_or = |property, fallback: f32| {
            appear
                .final_value(property)
                .filter(|v| v.is_finite())
                .unwrap_or(fallback)
        };
        let appearance = Appearance {
            scale: final_or(AnimatedProperty::Scale, 1.0),
            opacity: final_or(AnimatedProperty::Opacity, presets::REST_OPACITY),
            line_width: final_or(
                AnimatedProperty::LineWidth,
                self.config.style.initial_line_width,
            ),
        };

        if let Err(e) = self.compositor.set_appearance(layer, appearance) {
            tracing::warn!("Could not settle indicator {}: {}", layer, e);
        }
    }

    fn release_layer(&mut self, layer: LayerId) {
        match self.compositor.remove_layer(layer) {
            Ok(()) => self.stats.released += 1,
            Err(e) => tracing::warn!("Could not release indicator {}: {}", layer, e),
        }
    }

    fn record(&mut self, fault: LifecycleFault) {
        // Late moves after an end are routine; a stray end is not
        match &fault {
            LifecycleFault::UnknownIdentity { phase, .. } if !phase.is_terminal() => {
                tracing::debug!("{}", fault)
            }
            _ => tracing::warn!("{}", fault),
        }
        self.stats.faults += 1;
        self.diagnostics.record(fault);
    }

    pub fn contains(&self, contact: ContactId) -> bool {
        self.layers.contains_key(&contact)
    }

    pub fn layer_for(&self, contact: ContactId) -> Option<LayerId> {
        self.layers.get(&contact).map(|entry| entry.layer)
    }

    pub fn position_of(&self, contact: ContactId) -> Option<Point> {
        self.layers.get(&contact).map(|entry| entry.position)
    }

    /// Active contacts, sorted
    pub fn active_contacts(&self) -> Vec<ContactId> {
        let mut contacts: Vec<ContactId> = self.layers.keys().copied().collect();
        contacts.sort();
        contacts
    }

    /// Number of active contacts
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers still animating out
    pub fn pending_removals(&self) -> usize {
        self.removals.len()
    }

    /// Every layer this manager currently owns in the compositing tree
    pub fn owned_layers(&self) -> Vec<LayerId> {
        let mut layers: Vec<LayerId> = self
            .layers
            .values()
            .map(|entry| entry.layer)
            .chain(self.removals.values().map(|p| p.layer))
            .collect();
        layers.sort();
        layers
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn stats(&self) -> LifecycleStats {
        self.stats
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut C {
        &mut self.compositor
    }

    pub fn into_compositor(self) -> C {
        self.compositor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{CompositorError, Scene};

    fn visible_manager() -> TouchLayerManager<Scene> {
        let mut manager = TouchLayerManager::new(Scene::new(), OverlayConfig::default());
        manager.show_touches();
        manager
    }

    fn batch(samples: Vec<ContactSample>) -> EventBatch {
        EventBatch::new(samples)
    }

    #[test]
    fn test_began_inserts_layer_with_appear_animation() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![ContactSample::began(1, 10.0, 10.0)]));

        assert_eq!(manager.active_contacts(), vec![ContactId(1)]);
        let layer = manager.layer_for(ContactId(1)).unwrap();
        let scene = manager.compositor();
        assert_eq!(scene.layer_count(), 1);
        assert_eq!(scene.presentation(layer).unwrap().position, Point::new(10.0, 10.0));
        assert_eq!(
            scene.layer(layer).unwrap().animation_keys(),
            vec![AnimationKey::TouchBegan]
        );
    }

    #[test]
    fn test_moved_snaps_without_new_animation() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![ContactSample::began(1, 10.0, 10.0)]));
        manager.on_event_batch(&batch(vec![ContactSample::moved(1, 20.0, 20.0)]));

        let layer = manager.layer_for(ContactId(1)).unwrap();
        let scene = manager.compositor();
        assert_eq!(manager.active_contacts(), vec![ContactId(1)]);
        assert_eq!(scene.presentation(layer).unwrap().position, Point::new(20.0, 20.0));
        assert!(!scene.layer(layer).unwrap().is_transitioning());
        assert_eq!(
            scene.layer(layer).unwrap().animation_keys(),
            vec![AnimationKey::TouchBegan]
        );
        assert_eq!(manager.position_of(ContactId(1)), Some(Point::new(20.0, 20.0)));
    }

    #[test]
    fn test_ended_removes_after_animation_completes() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![ContactSample::began(1, 10.0, 10.0)]));
        manager.on_event_batch(&batch(vec![ContactSample::moved(1, 20.0, 20.0)]));
        let layer = manager.layer_for(ContactId(1)).unwrap();

        manager.on_event_batch(&batch(vec![ContactSample::ended(1, 20.0, 20.0)]));
        assert!(manager.is_empty());
        assert_eq!(manager.pending_removals(), 1);
        assert!(manager.compositor().contains_layer(layer));
        assert!(manager
            .compositor()
            .layer(layer)
            .unwrap()
            .has_animation(AnimationKey::TouchEnded));

        assert_eq!(manager.advance(Duration::from_millis(250)), 0);
        assert!(manager.compositor().contains_layer(layer));

        assert_eq!(manager.advance(Duration::from_millis(500)), 1);
        assert!(!manager.compositor().contains_layer(layer));
        assert_eq!(manager.pending_removals(), 0);
        assert_eq!(manager.stats().animated_out, 1);
    }

    #[test]
    fn test_cancelled_behaves_like_ended() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![ContactSample::began(3, 0.0, 0.0)]));
        manager.on_event_batch(&batch(vec![ContactSample::cancelled(3, 0.0, 0.0)]));

        assert!(!manager.contains(ContactId(3)));
        assert_eq!(manager.pending_removals(), 1);
        manager.advance(Duration::from_secs(1));
        assert_eq!(manager.compositor().layer_count(), 0);
    }

    #[test]
    fn test_stationary_is_a_no_op() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![ContactSample::began(1, 5.0, 5.0)]));
        manager.on_event_batch(&batch(vec![
            ContactSample::stationary(1, 50.0, 50.0),
            ContactSample::stationary(9, 1.0, 1.0),
        ]));

        assert_eq!(manager.position_of(ContactId(1)), Some(Point::new(5.0, 5.0)));
        assert_eq!(manager.active_contacts(), vec![ContactId(1)]);
        assert!(manager.diagnostics().is_empty());
    }

    #[test]
    fn test_unknown_identity_is_recorded_not_fatal() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![ContactSample::moved(5, 0.0, 0.0)]));
        manager.on_event_batch(&batch(vec![ContactSample::ended(6, 0.0, 0.0)]));

        assert!(manager.is_empty());
        assert_eq!(manager.compositor().layer_count(), 0);
        assert_eq!(manager.diagnostics().total(), 2);
        assert_eq!(
            manager.diagnostics().recent().next(),
            Some(&LifecycleFault::UnknownIdentity {
                contact: ContactId(5),
                phase: ContactPhase::Moved,
            })
        );
    }

    #[test]
    fn test_hidden_overlay_ignores_batches() {
        let mut manager = TouchLayerManager::new(Scene::new(), OverlayConfig::default());
        manager.on_event_batch(&batch(vec![ContactSample::began(1, 0.0, 0.0)]));

        assert!(manager.is_empty());
        assert_eq!(manager.compositor().layer_count(), 0);
        assert_eq!(manager.stats().batches, 0);
    }

    #[test]
    fn test_contact_in_progress_at_enable_gets_no_indicator() {
        let mut manager = TouchLayerManager::new(Scene::new(), OverlayConfig::default());
        manager.on_event_batch(&batch(vec![ContactSample::began(1, 0.0, 0.0)]));
        manager.show_touches();
        manager.on_event_batch(&batch(vec![ContactSample::moved(1, 5.0, 5.0)]));
        manager.on_event_batch(&batch(vec![ContactSample::ended(1, 5.0, 5.0)]));

        assert_eq!(manager.compositor().layer_count(), 0);
        manager.on_event_batch(&batch(vec![ContactSample::began(2, 1.0, 1.0)]));
        assert_eq!(manager.active_contacts(), vec![ContactId(2)]);
    }

    #[test]
    fn test_disable_removes_everything_immediately() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![
            ContactSample::began(1, 0.0, 0.0),
            ContactSample::began(2, 10.0, 0.0),
            ContactSample::began(3, 20.0, 0.0),
        ]));
        manager.on_event_batch(&batch(vec![ContactSample::ended(3, 20.0, 0.0)]));
        assert_eq!(manager.compositor().layer_count(), 3);

        manager.handle_signal(VisibilitySignal::Disable);
        assert!(manager.is_empty());
        assert_eq!(manager.pending_removals(), 0);
        assert_eq!(manager.compositor().layer_count(), 0);
        assert!(manager.owned_layers().is_empty());

        // The cancelled disappear animation never runs a continuation
        assert_eq!(manager.advance(Duration::from_secs(2)), 0);

        // Idempotent
        manager.handle_signal(VisibilitySignal::Disable);
        assert_eq!(manager.clear_indicators(), 0);
    }

    #[test]
    fn test_duplicate_begin_replace_releases_stale_layer() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![ContactSample::began(1, 0.0, 0.0)]));
        let stale = manager.layer_for(ContactId(1)).unwrap();

        manager.on_event_batch(&batch(vec![ContactSample::began(1, 30.0, 30.0)]));
        let fresh = manager.layer_for(ContactId(1)).unwrap();

        assert_ne!(stale, fresh);
        assert!(!manager.compositor().contains_layer(stale));
        assert_eq!(manager.compositor().layer_count(), 1);
        assert_eq!(manager.position_of(ContactId(1)), Some(Point::new(30.0, 30.0)));
        assert!(matches!(
            manager.diagnostics().last(),
            Some(LifecycleFault::DuplicateBegin {
                policy: DuplicateBeginPolicy::Replace,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_begin_reject_keeps_existing_layer() {
        let config = OverlayConfig {
            duplicate_begin: DuplicateBeginPolicy::Reject,
            initially_visible: true,
            ..OverlayConfig::default()
        };
        let mut manager = TouchLayerManager::new(Scene::new(), config);
        manager.on_event_batch(&batch(vec![ContactSample::began(1, 0.0, 0.0)]));
        let original = manager.layer_for(ContactId(1)).unwrap();

        manager.on_event_batch(&batch(vec![ContactSample::began(1, 30.0, 30.0)]));
        assert_eq!(manager.layer_for(ContactId(1)), Some(original));
        assert_eq!(manager.position_of(ContactId(1)), Some(Point::new(0.0, 0.0)));
        assert_eq!(manager.compositor().layer_count(), 1);
        assert_eq!(manager.diagnostics().total(), 1);
    }

    #[test]
    fn test_identity_reused_while_previous_layer_animates_out() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![ContactSample::began(1, 0.0, 0.0)]));
        manager.on_event_batch(&batch(vec![ContactSample::ended(1, 0.0, 0.0)]));
        manager.on_event_batch(&batch(vec![ContactSample::began(1, 40.0, 40.0)]));

        assert!(manager.contains(ContactId(1)));
        assert_eq!(manager.pending_removals(), 1);
        assert_eq!(manager.compositor().layer_count(), 2);
        assert!(manager.diagnostics().is_empty());

        manager.advance(Duration::from_secs(1));
        assert_eq!(manager.compositor().layer_count(), 1);
        assert!(manager.contains(ContactId(1)));
    }

    #[test]
    fn test_rejected_appear_animation_settles_at_rest() {
        let mut config = OverlayConfig::default();
        config.appear.duration_secs = 0.0;
        config.initially_visible = true;
        let mut manager = TouchLayerManager::new(Scene::new(), config);

        manager.on_event_batch(&batch(vec![ContactSample::began(1, 0.0, 0.0)]));
        let layer = manager.layer_for(ContactId(1)).unwrap();
        let presented = manager.compositor().presentation(layer).unwrap();

        assert_eq!(presented.scale, 1.0);
        assert_eq!(presented.opacity, presets::REST_OPACITY);
        assert!(matches!(
            manager.diagnostics().last(),
            Some(LifecycleFault::AnimationAttachment {
                stage: AnimationStage::Appear,
                source: CompositorError::InvalidAnimation(_),
                ..
            })
        ));
    }

    #[test]
    fn test_rejected_disappear_animation_removes_immediately() {
        let mut config = OverlayConfig::default();
        config.disappear.tracks.clear();
        config.initially_visible = true;
        let mut manager = TouchLayerManager::new(Scene::new(), config);

        manager.on_event_batch(&batch(vec![ContactSample::began(1, 0.0, 0.0)]));
        manager.on_event_batch(&batch(vec![ContactSample::ended(1, 0.0, 0.0)]));

        assert!(manager.is_empty());
        assert_eq!(manager.pending_removals(), 0);
        assert_eq!(manager.compositor().layer_count(), 0);
        assert_eq!(manager.stats().released, 1);
    }

    #[test]
    fn test_layer_insertion_failure_leaves_map_untouched() {
        let mut config = OverlayConfig::default();
        config.style.radius = 0.0;
        config.initially_visible = true;
        let mut manager = TouchLayerManager::new(Scene::new(), config);

        manager.on_event_batch(&batch(vec![ContactSample::began(1, 0.0, 0.0)]));
        assert!(manager.is_empty());
        assert!(matches!(
            manager.diagnostics().last(),
            Some(LifecycleFault::LayerInsertion { .. })
        ));
    }

    #[test]
    fn test_diagnostics_log_is_bounded() {
        let config = OverlayConfig {
            diagnostics_capacity: 2,
            initially_visible: true,
            ..OverlayConfig::default()
        };
        let mut manager = TouchLayerManager::new(Scene::new(), config);
        for id in 0..5 {
            manager.on_event_batch(&batch(vec![ContactSample::moved(id, 0.0, 0.0)]));
        }

        assert_eq!(manager.diagnostics().len(), 2);
        assert_eq!(manager.diagnostics().total(), 5);
        assert_eq!(manager.diagnostics().last().unwrap().contact(), ContactId(4));
    }

    #[test]
    fn test_multi_touch_churn_in_one_batch() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![
            ContactSample::began(1, 0.0, 0.0),
            ContactSample::began(2, 1.0, 1.0),
        ]));
        manager.on_event_batch(&batch(vec![
            ContactSample::ended(1, 0.0, 0.0),
            ContactSample::moved(2, 2.0, 2.0),
            ContactSample::began(3, 3.0, 3.0),
        ]));

        assert_eq!(manager.active_contacts(), vec![ContactId(2), ContactId(3)]);
        assert_eq!(manager.pending_removals(), 1);
        assert_eq!(manager.owned_layers().len(), 3);
        assert_eq!(manager.compositor().layer_count(), 3);
    }

    #[test]
    fn test_tap_within_one_batch_animates_out() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![
            ContactSample::began(1, 4.0, 4.0),
            ContactSample::ended(1, 4.0, 4.0),
        ]));

        assert!(manager.is_empty());
        assert_eq!(manager.pending_removals(), 1);
        assert_eq!(manager.compositor().layer_count(), 1);
        assert!(manager.diagnostics().is_empty());

        manager.advance(Duration::from_secs(1));
        assert_eq!(manager.compositor().layer_count(), 0);
        assert_eq!(manager.pending_removals(), 0);
    }

    #[test]
    fn test_began_and_cancelled_within_one_batch() {
        let mut manager = visible_manager();
        manager.on_event_batch(&batch(vec![
            ContactSample::began(2, 0.0, 0.0),
            ContactSample::cancelled(2, 0.0, 0.0),
        ]));

        assert!(!manager.contains(ContactId(2)));
        assert_eq!(manager.pending_removals(), 1);
        manager.advance(Duration::from_secs(1));
        assert_eq!(manager.compositor().layer_count(), 0);
    }

    #[test]
    fn test_duplicate_began_within_one_batch() {
        for policy in [DuplicateBeginPolicy::Replace, DuplicateBeginPolicy::Reject] {
            let config = OverlayConfig {
                duplicate_begin: policy,
                initially_visible: true,
                ..OverlayConfig::default()
            };
            let mut manager = TouchLayerManager::new(Scene::new(), config);
            manager.on_event_batch(&batch(vec![
                ContactSample::began(1, 0.0, 0.0),
                ContactSample::began(1, 8.0, 8.0),
            ]));

            assert_eq!(manager.len(), 1, "{:?}", policy);
            assert_eq!(manager.compositor().layer_count(), 1, "{:?}", policy);
            assert_eq!(manager.diagnostics().total(), 1, "{:?}", policy);
            assert!(matches!(
                manager.diagnostics().last(),
                Some(LifecycleFault::DuplicateBegin { policy: p, .. }) if *p == policy
            ));
        }
    }
}
