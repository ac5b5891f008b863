use crate::movement::command::CommandButtons;
use crate::movement::context::MechanicContext;
use crate::movement::mechanic::{Mechanic, MechanicId, MechanicTimers};
use crate::movement::state::MechanicTags;

/// Lowers the hull and the eyes. Stays on under low ceilings and while a
/// slide is in the air.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crouch;

impl Mechanic for Crouch {
    fn id(&self) -> MechanicId {
        MechanicId::Crouch
    }

    fn priority(&self) -> i32 {
        0
    }

    fn should_become_active(&self, ctx: &MechanicContext<'_>, _timers: &MechanicTimers) -> bool {
        let state = &ctx.state;
        state.crouch.force_duck
            || (state.has_tag(MechanicTags::SLIDE) && !state.is_grounded())
            || ctx.cmd.is_held(CommandButtons::DUCK)
    }

    fn simulate(&mut self, ctx: &mut MechanicContext<'_>, _timers: &MechanicTimers) {
        let below_standing = ctx.state.hull_height < ctx.config.hull_height_standing - 0.01;
        ctx.state.crouch.force_duck =
            !ctx.cmd.is_held(CommandButtons::DUCK) && below_standing && !ctx.can_unduck();
    }

    fn tags(&self, _ctx: &MechanicContext<'_>) -> MechanicTags {
        MechanicTags::CROUCH
    }

    fn speed(&self, ctx: &MechanicContext<'_>) -> Option<f32> {
        Some(ctx.config.crouch_speed)
    }

    fn hull_height(&self, ctx: &MechanicContext<'_>) -> Option<f32> {
        Some(ctx.config.hull_height_crouching)
    }

    fn eye_height(&self, ctx: &MechanicContext<'_>) -> Option<f32> {
        Some(ctx.config.view_height_crouching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::ContentFlags;
    use crate::movement::mechanics::fixture::Fixture;
    use glam::Vec3;

    #[test]
    fn test_crouch_follows_button() {
        let mut fixture = Fixture::on_floor();
        let timers = MechanicTimers::default();
        assert!(!Crouch.should_become_active(&fixture.ctx(), &timers));

        fixture.cmd.held.press(CommandButtons::DUCK);
        assert!(Crouch.should_become_active(&fixture.ctx(), &timers));
    }

    #[test]
    fn test_crouch_forced_under_ceiling() {
        let mut fixture = Fixture::on_floor();
        fixture.world.add_box(
            Vec3::new(0.0, 60.0, 0.0),
            Vec3::new(100.0, 5.0, 100.0),
            ContentFlags::SOLID,
        );
        fixture.state.hull_height = fixture.config.hull_height_crouching;

        let timers = MechanicTimers::default();
        let mut crouch = Crouch;
        let mut ctx = fixture.ctx();
        crouch.simulate(&mut ctx, &timers);

        assert!(ctx.state.crouch.force_duck, "ceiling keeps us down");
        assert!(crouch.should_become_active(&ctx, &timers));
    }

    #[test]
    fn test_crouch_held_through_airborne_slide() {
        let mut fixture = Fixture::on_floor();
        fixture.state.tags = MechanicTags::SLIDE;
        let timers = MechanicTimers::default();
        assert!(!Crouch.should_become_active(&fixture.ctx(), &timers));

        fixture.state.ground_entity = None;
        assert!(Crouch.should_become_active(&fixture.ctx(), &timers));
    }

    #[test]
    fn test_crouch_overrides() {
        let mut fixture = Fixture::on_floor();
        let ctx = fixture.ctx();
        assert_eq!(Crouch.speed(&ctx), Some(ctx.config.crouch_speed));
        assert_eq!(Crouch.hull_height(&ctx), Some(47.0));
        assert_eq!(Crouch.eye_height(&ctx), Some(38.0));
    }
}
