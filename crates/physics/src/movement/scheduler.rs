//! Runs the registered mechanics for one character each tick.
//!
//! Per tick:
//! 1. `simulate` on every mechanic.
//! 2. Evaluate every activation predicate against the same state.
//! 3. Grant the mechanics becoming active, then revoke those becoming inactive.
//! 4. `on_active_update` on the active mechanics in ascending priority.
//! 5. If nothing moved the character, fall back to the walk or air move.
//! 6. Merge tags and overrides of the active mechanics into the state.

use std::fmt;

use super::context::MechanicContext;
use super::mechanic::{Mechanic, MechanicId, MechanicTimers};
use super::mechanics::{AirMove, Crouch, Jump, Slide, Sprint, Walk, Wallrun};
use super::state::{MechanicOverrides, MechanicTags};

struct Entry {
    mechanic: Box<dyn Mechanic>,
    timers: MechanicTimers,
}

/// Ordered set of mechanics with their activation timers.
pub struct Scheduler {
    entries: Vec<Entry>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::with_default_mechanics()
    }
}

impl Scheduler {
    /// An empty scheduler.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A scheduler with every built-in mechanic registered.
    pub fn with_default_mechanics() -> Self {
        let mut scheduler = Self::new();
        scheduler.register(Box::new(Crouch));
        scheduler.register(Box::new(Jump));
        scheduler.register(Box::new(AirMove));
        scheduler.register(Box::new(Walk));
        scheduler.register(Box::new(Slide));
        scheduler.register(Box::new(Wallrun));
        scheduler.register(Box::new(Sprint::default()));
        scheduler
    }

    /// Add a mechanic, replacing any registered mechanic with the same id.
    ///
    /// Mechanics run in (priority, id) order regardless of registration order.
    pub fn register(&mut self, mechanic: Box<dyn Mechanic>) {
        let id = mechanic.id();
        if let Some(index) = self.entries.iter().position(|e| e.mechanic.id() == id) {
            log::warn!("replacing registered mechanic {id}");
            self.entries.remove(index);
        }

        self.entries.push(Entry {
            mechanic,
            timers: MechanicTimers::default(),
        });
        self.entries.sort_by_key(|e| (e.mechanic.priority(), e.mechanic.id()));
    }

    /// Registered mechanic ids in run order.
    pub fn ids(&self) -> impl Iterator<Item = MechanicId> + '_ {
        self.entries.iter().map(|e| e.mechanic.id())
    }

    pub fn timers(&self, id: MechanicId) -> Option<&MechanicTimers> {
        self.entries
            .iter()
            .find(|e| e.mechanic.id() == id)
            .map(|e| &e.timers)
    }

    /// Forget all activation history, as for a fresh character.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.timers = MechanicTimers::default();
        }
    }

    /// Run one tick.
    pub fn run(&mut self, ctx: &mut MechanicContext<'_>) {
        for entry in &mut self.entries {
            entry.mechanic.simulate(ctx, &entry.timers);
        }

        let wants: Vec<bool> = self
            .entries
            .iter()
            .map(|e| e.mechanic.should_become_active(ctx, &e.timers))
            .collect();

        let now = ctx.now();

        for (entry, &want) in self.entries.iter_mut().zip(&wants) {
            if !want || entry.timers.is_active {
                continue;
            }

            let id = entry.mechanic.id();
            entry.timers.is_active = true;
            entry.timers.active_changed = now;
            entry.timers.start = now;
            ctx.state.active.set(id, true);

            log::trace!("{id} active");
            entry.mechanic.on_active_changed(false, true, ctx, &entry.timers);
            entry.timers.last_start = now;
        }

        for (entry, &want) in self.entries.iter_mut().zip(&wants) {
            if want || !entry.timers.is_active {
                continue;
            }

            let id = entry.mechanic.id();
            entry.timers.is_active = false;
            entry.timers.active_changed = now;
            entry.timers.stop = now;
            ctx.state.active.set(id, false);

            log::trace!("{id} inactive");
            entry.mechanic.on_active_changed(true, false, ctx, &entry.timers);
        }

        for entry in self.entries.iter_mut().filter(|e| e.timers.is_active) {
            entry.mechanic.on_active_update(ctx, &entry.timers);
        }

        if !ctx.is_integrated() {
            self.run_fallback_move(ctx);
        }

        self.merge(ctx);
    }

    /// Move the character when no active mechanic did.
    fn run_fallback_move(&mut self, ctx: &mut MechanicContext<'_>) {
        let id = if ctx.state.is_grounded() {
            MechanicId::Walk
        } else {
            MechanicId::AirMove
        };

        let Some(entry) = self.entries.iter_mut().find(|e| e.mechanic.id() == id) else {
            return;
        };

        #[cfg(debug_assertions)]
        log::debug!(
            "no mechanic moved the character on tick {}, running {id}",
            ctx.state.clock.tick
        );

        entry.mechanic.on_active_update(ctx, &entry.timers);
    }

    fn merge(&self, ctx: &mut MechanicContext<'_>) {
        let mut tags = MechanicTags::NONE;
        let mut overrides = MechanicOverrides::default();

        // Ascending priority, so the last value written is the highest priority one.
        for entry in self.entries.iter().filter(|e| e.timers.is_active) {
            let mechanic = &entry.mechanic;
            tags.insert(mechanic.tags(ctx));

            if let Some(speed) = mechanic.speed(ctx) {
                overrides.speed = Some(speed);
            }
            if let Some(acceleration) = mechanic.acceleration(ctx) {
                overrides.acceleration = Some(acceleration);
            }
            if let Some(hull_height) = mechanic.hull_height(ctx) {
                overrides.hull_height = Some(hull_height);
            }
            if let Some(eye_height) = mechanic.eye_height(ctx) {
                overrides.eye_height = Some(eye_height);
            }
        }

        ctx.state.tags = tags;
        ctx.state.overrides = overrides;
    }
}
