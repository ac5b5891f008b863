use crate::movement::command::CommandButtons;
use crate::movement::context::MechanicContext;
use crate::movement::mechanic::{Mechanic, MechanicId, MechanicTimers};
use crate::movement::state::MechanicTags;

/// Raises the ground speed while moving forward.
///
/// Holding the sprint button sprints. Pressing it also latches a toggle that
/// survives releasing the button, and turns off on crouch or once the player
/// stops moving forward.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sprint {
    toggled: bool,

    /// Moved forward since the toggle was latched.
    can_toggle_off: bool,
}

impl Sprint {
    pub fn is_toggled(&self) -> bool {
        self.toggled
    }
}

impl Mechanic for Sprint {
    fn id(&self) -> MechanicId {
        MechanicId::Sprint
    }

    fn priority(&self) -> i32 {
        70
    }

    fn should_become_active(&self, ctx: &MechanicContext<'_>, _timers: &MechanicTimers) -> bool {
        if ctx.state.has_tag(MechanicTags::CROUCH) {
            return false;
        }

        let wants_sprint = ctx.cmd.is_held(CommandButtons::SPRINT) || self.toggled || ctx.auto_sprint;
        wants_sprint && ctx.state.is_grounded() && ctx.cmd.forward_move >= ctx.config.sprint_max_angle_dot
    }

    fn simulate(&mut self, ctx: &mut MechanicContext<'_>, _timers: &MechanicTimers) {
        let moving_forward = ctx.cmd.forward_move >= 0.0 && ctx.cmd.has_movement_input();

        if self.toggled && moving_forward {
            self.can_toggle_off = true;
        }

        if ctx.cmd.was_pressed(CommandButtons::DUCK) || (self.can_toggle_off && !moving_forward) {
            self.toggled = false;
        }

        if ctx.cmd.was_pressed(CommandButtons::SPRINT) {
            self.toggled = true;
            self.can_toggle_off = false;
        }
    }

    fn tags(&self, _ctx: &MechanicContext<'_>) -> MechanicTags {
        MechanicTags::SPRINT
    }

    fn speed(&self, ctx: &MechanicContext<'_>) -> Option<f32> {
        Some(ctx.config.sprint_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::command::PlayerCommand;
    use crate::movement::mechanics::fixture::Fixture;

    fn forward() -> PlayerCommand {
        PlayerCommand {
            forward_move: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_sprint_needs_forward_input() {
        let mut fixture = Fixture::on_floor();
        fixture.cmd = forward().with_button(CommandButtons::SPRINT, true);
        let timers = MechanicTimers::default();
        let sprint = Sprint::default();
        assert!(sprint.should_become_active(&fixture.ctx(), &timers));

        fixture.cmd.forward_move = 0.5;
        assert!(!sprint.should_become_active(&fixture.ctx(), &timers), "too far off forward");

        fixture.cmd.forward_move = 1.0;
        fixture.state.tags = MechanicTags::CROUCH;
        assert!(!sprint.should_become_active(&fixture.ctx(), &timers), "no sprinting while crouched");
    }

    #[test]
    fn test_auto_sprint() {
        let mut fixture = Fixture::on_floor();
        fixture.cmd = forward();
        let timers = MechanicTimers::default();
        let sprint = Sprint::default();

        let mut ctx = fixture.ctx();
        assert!(!sprint.should_become_active(&ctx, &timers));
        ctx.auto_sprint = true;
        assert!(sprint.should_become_active(&ctx, &timers));
    }

    #[test]
    fn test_sprint_toggle_latches_until_stopping() {
        let mut fixture = Fixture::on_floor();
        let timers = MechanicTimers::default();
        let mut sprint = Sprint::default();

        // Tap sprint while running forward.
        fixture.cmd = forward().with_button(CommandButtons::SPRINT, false);
        sprint.simulate(&mut fixture.ctx(), &timers);
        assert!(sprint.is_toggled());

        // Button released, still moving forward.
        fixture.cmd = forward();
        sprint.simulate(&mut fixture.ctx(), &timers);
        assert!(sprint.is_toggled());
        assert!(sprint.should_become_active(&fixture.ctx(), &timers));

        // Let go of the stick.
        fixture.cmd = PlayerCommand::default();
        sprint.simulate(&mut fixture.ctx(), &timers);
        assert!(!sprint.is_toggled(), "stopping ends the toggle");
    }

    #[test]
    fn test_sprint_toggle_cleared_by_duck() {
        let mut fixture = Fixture::on_floor();
        let timers = MechanicTimers::default();
        let mut sprint = Sprint::default();

        fixture.cmd = forward().with_button(CommandButtons::SPRINT, false);
        sprint.simulate(&mut fixture.ctx(), &timers);

        fixture.cmd = forward().with_button(CommandButtons::DUCK, false);
        sprint.simulate(&mut fixture.ctx(), &timers);
        assert!(!sprint.is_toggled());
    }
}
