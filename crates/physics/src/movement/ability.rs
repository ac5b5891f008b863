//! Abilities: button-triggered behaviors layered on top of the mechanics.
//!
//! Abilities run before the mechanics each tick. They see the same context,
//! may change velocity directly, and hand speed, acceleration and gravity
//! overrides to the air movement through [`AbilityOverrides`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::abilities::Grapple;
use super::context::MechanicContext;
use super::mechanic::MechanicTimers;
use super::state::AbilityOverrides;

/// Identifies a built-in ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityId {
    Grapple,
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grapple => f.write_str("grapple"),
        }
    }
}

/// A button-triggered behavior. The lifecycle matches [`super::Mechanic`].
pub trait Ability {
    fn id(&self) -> AbilityId;

    fn should_become_active(&self, ctx: &MechanicContext<'_>, timers: &MechanicTimers) -> bool;

    fn on_active_changed(
        &mut self,
        _before: bool,
        _after: bool,
        _ctx: &mut MechanicContext<'_>,
        _timers: &MechanicTimers,
    ) {
    }

    fn simulate(&mut self, _ctx: &mut MechanicContext<'_>, _timers: &MechanicTimers) {}

    fn on_active_update(&mut self, _ctx: &mut MechanicContext<'_>, _timers: &MechanicTimers) {}

    fn speed(&self, _ctx: &MechanicContext<'_>) -> Option<f32> {
        None
    }

    fn acceleration(&self, _ctx: &MechanicContext<'_>) -> Option<f32> {
        None
    }

    fn gravity_scale(&self, _ctx: &MechanicContext<'_>) -> Option<f32> {
        None
    }
}

struct Slot {
    ability: Box<dyn Ability>,
    timers: MechanicTimers,
}

/// The abilities one character carries.
pub struct Abilities {
    slots: Vec<Slot>,
}

impl fmt::Debug for Abilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

impl Default for Abilities {
    fn default() -> Self {
        Self::with_default_abilities()
    }
}

impl Abilities {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Every built-in ability.
    pub fn with_default_abilities() -> Self {
        let mut abilities = Self::new();
        abilities.equip(Box::new(Grapple));
        abilities
    }

    /// Add an ability, replacing one with the same id.
    pub fn equip(&mut self, ability: Box<dyn Ability>) {
        let id = ability.id();
        self.slots.retain(|slot| slot.ability.id() != id);
        self.slots.push(Slot {
            ability,
            timers: MechanicTimers::default(),
        });
        self.slots.sort_by_key(|slot| slot.ability.id());
    }

    pub fn ids(&self) -> impl Iterator<Item = AbilityId> + '_ {
        self.slots.iter().map(|slot| slot.ability.id())
    }

    pub fn timers(&self, id: AbilityId) -> Option<&MechanicTimers> {
        self.slots
            .iter()
            .find(|slot| slot.ability.id() == id)
            .map(|slot| &slot.timers)
    }

    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.timers = MechanicTimers::default();
        }
    }

    /// Run one tick: simulate everything, then update the abilities that
    /// want to be active, then stop the ones that no longer do.
    pub fn run(&mut self, ctx: &mut MechanicContext<'_>) {
        for slot in &mut self.slots {
            slot.ability.simulate(ctx, &slot.timers);
        }

        let wants: Vec<bool> = self
            .slots
            .iter()
            .map(|slot| slot.ability.should_become_active(ctx, &slot.timers))
            .collect();
        let now = ctx.now();

        for (slot, &want) in self.slots.iter_mut().zip(&wants) {
            if !want {
                continue;
            }

            if !slot.timers.is_active {
                slot.timers.is_active = true;
                slot.timers.active_changed = now;
                slot.timers.start = now;

                log::trace!("{} active", slot.ability.id());
                slot.ability.on_active_changed(false, true, ctx, &slot.timers);
                slot.timers.last_start = now;
            }

            slot.ability.on_active_update(ctx, &slot.timers);
        }

        for (slot, &want) in self.slots.iter_mut().zip(&wants) {
            if want || !slot.timers.is_active {
                continue;
            }

            slot.timers.is_active = false;
            slot.timers.active_changed = now;
            slot.timers.stop = now;

            log::trace!("{} inactive", slot.ability.id());
            slot.ability.on_active_changed(true, false, ctx, &slot.timers);
        }

        let mut overrides = AbilityOverrides::default();
        for slot in self.slots.iter().filter(|slot| slot.timers.is_active) {
            let ability = &slot.ability;
            if let Some(speed) = ability.speed(ctx) {
                overrides.speed = Some(speed);
            }
            if let Some(acceleration) = ability.acceleration(ctx) {
                overrides.acceleration = Some(acceleration);
            }
            if let Some(gravity_scale) = ability.gravity_scale(ctx) {
                overrides.gravity_scale = Some(gravity_scale);
            }
        }
        ctx.state.ability_overrides = overrides;
    }
}
