//! Whole-controller scenarios: jumps, buffering, wall-runs, slides and determinism.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use vaultrun_physics::movement::mechanics::{AirMove, Crouch, Jump, Slide, Sprint, Walk, Wallrun};
use vaultrun_physics::movement::Scheduler;
use vaultrun_physics::{
    CharacterController, CharacterState, CollisionWorld, CommandButtons, ContentFlags, JumpType,
    MechanicId, MechanicTags, MovementConfig, MovementEvent, PlayerCommand,
};

const DT: f32 = 1.0 / 64.0;

fn floor_world() -> CollisionWorld {
    let mut world = CollisionWorld::new();
    world.add_box(
        Vec3::new(0.0, -8.0, 0.0),
        Vec3::new(4000.0, 8.0, 4000.0),
        ContentFlags::SOLID,
    );
    world
}

/// Floor plus a tall wall whose face is the plane x = 0, facing -X.
fn wall_world() -> CollisionWorld {
    let mut world = floor_world();
    world.add_box(
        Vec3::new(20.0, 200.0, 0.0),
        Vec3::new(20.0, 200.0, 2000.0),
        ContentFlags::SOLID,
    );
    world
}

fn tick(
    controller: &mut CharacterController,
    state: &mut CharacterState,
    world: &CollisionWorld,
    cmd: &PlayerCommand,
) -> Vec<MovementEvent> {
    let mut events = Vec::new();
    controller.tick(state, cmd, world, &mut events);
    events
}

fn idle(controller: &mut CharacterController, state: &mut CharacterState, world: &CollisionWorld, ticks: usize) {
    for _ in 0..ticks {
        tick(controller, state, world, &PlayerCommand::default());
    }
}

fn press(button: u16) -> PlayerCommand {
    PlayerCommand::default().with_button(button, false)
}

fn jumped(events: &[MovementEvent]) -> Option<JumpType> {
    events.iter().find_map(|e| match e {
        MovementEvent::Jumped(jump_type) => Some(*jump_type),
        _ => None,
    })
}

#[test]
fn test_ground_jump_height() {
    let world = floor_world();
    let mut controller = CharacterController::with_default_config();
    let mut state = CharacterState::new(Vec3::ZERO, &controller.config);
    controller.spawn_at(&mut state, Vec3::ZERO, &world);
    idle(&mut controller, &mut state, &world, 4);

    let events = tick(&mut controller, &mut state, &world, &press(CommandButtons::JUMP));
    assert_eq!(jumped(&events), Some(JumpType::Ground));

    // Launch speed, less the gravity of the jump tick itself.
    let config = controller.config.clone();
    let launch = (2.0 * config.jump_height * config.gravity).sqrt();
    assert!((launch - 300.0).abs() < 0.01);
    let vy = state.velocity.y + 1.5 * config.player_gravity() * DT;
    assert!((vy - launch).abs() < 0.01, "launch speed {vy}");

    // Rises to about launch² / 2g before coming back down.
    let mut peak: f32 = 0.0;
    for _ in 0..128 {
        tick(&mut controller, &mut state, &world, &PlayerCommand::default());
        peak = peak.max(state.position.y);
    }
    let expected = launch * launch / (2.0 * config.player_gravity());
    assert!((peak - expected).abs() < 3.0, "peak {peak}, expected about {expected}");
    assert!(state.is_grounded());
}

/// Ticks until a character dropped from `height` stands on the floor.
fn ticks_to_land(config: &MovementConfig, world: &CollisionWorld, height: f32) -> usize {
    let mut controller = CharacterController::new(config.clone());
    let mut state = CharacterState::new(Vec3::new(0.0, height, 0.0), config);

    for n in 1..=256 {
        tick(&mut controller, &mut state, world, &PlayerCommand::default());
        if state.is_grounded() {
            return n;
        }
    }
    panic!("never landed");
}

/// Drop from `height`, pressing jump on tick `press_tick` and holding it afterwards.
fn drop_and_jump(
    config: &MovementConfig,
    world: &CollisionWorld,
    height: f32,
    press_tick: usize,
    ticks: usize,
) -> Vec<MovementEvent> {
    let mut controller = CharacterController::new(config.clone());
    let mut state = CharacterState::new(Vec3::new(0.0, height, 0.0), config);
    let mut events = Vec::new();

    for n in 1..=ticks {
        let cmd = if n == press_tick {
            press(CommandButtons::JUMP)
        } else if n > press_tick {
            PlayerCommand::default().with_button(CommandButtons::JUMP, true)
        } else {
            PlayerCommand::default()
        };
        events.extend(tick(&mut controller, &mut state, world, &cmd));
    }
    events
}

#[test]
fn test_jump_buffered_into_landing() {
    let world = floor_world();
    let mut config = MovementConfig::default();
    config.air_jump_max_jumps = 0;

    let landing = ticks_to_land(&config, &world, 20.0);
    assert!(landing > 4);

    // Pressed on the tick that lands: jumps on the next one.
    let events = drop_and_jump(&config, &world, 20.0, landing, landing + 1);
    assert_eq!(jumped(&events), Some(JumpType::Ground), "events: {events:?}");

    // Pressed a tick earlier, the press has expired by then.
    let events = drop_and_jump(&config, &world, 20.0, landing - 1, landing + 1);
    assert_eq!(jumped(&events), None, "events: {events:?}");
}

#[test]
fn test_air_jump_refills_on_landing() {
    let world = floor_world();
    let mut controller = CharacterController::with_default_config();
    let mut state = CharacterState::new(Vec3::new(0.0, 300.0, 0.0), &controller.config);
    idle(&mut controller, &mut state, &world, 10);

    let events = tick(&mut controller, &mut state, &world, &press(CommandButtons::JUMP));
    assert_eq!(jumped(&events), Some(JumpType::Air));
    assert_eq!(state.jump.air_jumps_remaining, 0);
    assert!(state.has_tag(MechanicTags::AIRJUMP));

    let mut landed = false;
    for _ in 0..512 {
        let events = tick(&mut controller, &mut state, &world, &PlayerCommand::default());
        if events.iter().any(|e| matches!(e, MovementEvent::Landed { .. })) {
            assert_eq!(state.jump.air_jumps_remaining, 1, "refilled on the landing tick");
            landed = true;
            break;
        }
        assert_eq!(state.jump.air_jumps_remaining, 0, "no refill before landing");
    }
    assert!(landed);
}

/// Airborne next to the wall, moving into it and along +Z while looking along it.
fn approach_wall(controller: &mut CharacterController, world: &CollisionWorld) -> CharacterState {
    let mut state = CharacterState::new(Vec3::new(-20.0, 100.0, 0.0), &controller.config);
    state.velocity = Vec3::new(150.0, 0.0, 250.0);
    state.eye_angles.y = FRAC_PI_2;

    let forward = PlayerCommand {
        forward_move: 1.0,
        ..Default::default()
    };
    for _ in 0..16 {
        tick(controller, &mut state, world, &forward);
        if state.is_active(MechanicId::Wallrun) {
            return state;
        }
    }
    panic!("never started wall-running, state {state:?}");
}

/// Push away from the wall until the run ends.
fn push_off_wall(controller: &mut CharacterController, state: &mut CharacterState, world: &CollisionWorld) {
    // Facing +Z, right is -X: away from the wall.
    let away = PlayerCommand {
        right_move: 1.0,
        ..Default::default()
    };
    for _ in 0..32 {
        tick(controller, state, world, &away);
        if state.wall_normal(&controller.config).is_none() {
            return;
        }
    }
    panic!("still on the wall");
}

#[test]
fn test_wallrun_starts_on_tall_wall() {
    let world = wall_world();
    let mut controller = CharacterController::with_default_config();
    let state = approach_wall(&mut controller, &world);

    assert!(state.has_tag(MechanicTags::WALLRUN));
    let normal = state.wall_normal(&controller.config).unwrap_or(Vec3::ZERO);
    assert!(normal.abs_diff_eq(Vec3::NEG_X, 1.0e-3), "normal {normal:?}");
    assert!(state.wallrun.weak, "started without a jump");
}

#[test]
fn test_wall_jump_within_grace() {
    let world = wall_world();
    let mut controller = CharacterController::with_default_config();
    let mut state = approach_wall(&mut controller, &world);
    push_off_wall(&mut controller, &mut state, &world);

    assert!(state.clock.is_now(state.wallrun.fell_away), "fell away with grace");
    assert_eq!(state.wall_normal(&controller.config), None);

    // 7 ticks is about 0.11s, inside the 0.2s grace.
    idle(&mut controller, &mut state, &world, 6);
    let events = tick(&mut controller, &mut state, &world, &press(CommandButtons::JUMP));

    assert!(state.clock.since(state.wallrun.fell_away) <= controller.config.jump_grace_period);
    assert_eq!(jumped(&events), Some(JumpType::Wall), "events: {events:?}");
    assert!(state.has_tag(MechanicTags::WALLJUMP));
    assert!(state.velocity.x < -100.0, "pushed away from the wall");
}

#[test]
fn test_late_jump_after_falling_away_is_air_jump() {
    let world = wall_world();
    let mut controller = CharacterController::with_default_config();
    let mut state = approach_wall(&mut controller, &world);
    push_off_wall(&mut controller, &mut state, &world);

    idle(&mut controller, &mut state, &world, 19);
    let events = tick(&mut controller, &mut state, &world, &press(CommandButtons::JUMP));

    assert_eq!(jumped(&events), Some(JumpType::Air), "events: {events:?}");
}

#[test]
fn test_wallrun_needs_feet_on_wall() {
    // The wall starts above the lower half of the hull.
    let mut world = CollisionWorld::new();
    world.add_box(
        Vec3::new(20.0, 320.0, 0.0),
        Vec3::new(20.0, 180.0, 2000.0),
        ContentFlags::SOLID,
    );

    let mut controller = CharacterController::with_default_config();
    let mut state = CharacterState::new(Vec3::new(-20.0, 100.0, 0.0), &controller.config);
    state.velocity = Vec3::new(200.0, 0.0, 250.0);
    state.eye_angles.y = FRAC_PI_2;

    let forward = PlayerCommand {
        forward_move: 1.0,
        ..Default::default()
    };
    for _ in 0..8 {
        tick(&mut controller, &mut state, &world, &forward);
        assert_eq!(state.wall_normal(&controller.config), None);
        assert!(!state.is_active(MechanicId::Wallrun));
    }

    assert!(!state.wallrun.touched_wall.is_never(), "the upper body did touch the wall");
}

#[test]
fn test_slide_boost_never_exceeds_cap() {
    let world = floor_world();

    for speed in [240.0, 300.0, 350.0, 420.0, 500.0] {
        let mut controller = CharacterController::with_default_config();
        let mut state = CharacterState::new(Vec3::ZERO, &controller.config);
        controller.spawn_at(&mut state, Vec3::ZERO, &world);
        state.velocity = Vec3::new(speed, 0.0, 0.0);

        let slide = PlayerCommand {
            forward_move: 1.0,
            ..Default::default()
        };
        let slide = slide.with_button(CommandButtons::DUCK, true);

        // Crouch first, the slide follows on the next tick.
        tick(&mut controller, &mut state, &world, &slide);
        assert!(state.has_tag(MechanicTags::CROUCH));
        tick(&mut controller, &mut state, &world, &slide);
        assert!(state.is_active(MechanicId::Slide), "slide from {speed}");

        let config = &controller.config;
        let start = state.slide.start_speed;
        let boost = config.slide_speed_boost.min((config.slide_speed_boost_cap - start).max(0.0));
        let after = state.horizontal_velocity().length();

        assert!(state.slide.used_boost);
        assert!(after <= start + boost + 0.01, "from {start}: {after} above the boost");
        assert!(after >= start + boost - 30.0, "from {start}: {after} lost too much");
        assert!(after <= config.slide_speed_boost_cap.max(start) + 0.01);
    }
}

#[test]
fn test_slide_ends_when_slow() {
    let world = floor_world();
    let mut controller = CharacterController::with_default_config();
    let mut state = CharacterState::new(Vec3::ZERO, &controller.config);
    controller.spawn_at(&mut state, Vec3::ZERO, &world);
    state.velocity = Vec3::new(300.0, 0.0, 0.0);

    let slide = PlayerCommand {
        forward_move: 1.0,
        ..Default::default()
    };
    let slide = slide.with_button(CommandButtons::DUCK, true);
    let mut slid = false;
    for _ in 0..640 {
        tick(&mut controller, &mut state, &world, &slide);
        slid |= state.has_tag(MechanicTags::SLIDE);
        if slid && !state.has_tag(MechanicTags::SLIDE) {
            break;
        }
    }

    assert!(slid);
    assert!(!state.has_tag(MechanicTags::SLIDE));
    assert!(state.horizontal_velocity().length() < controller.config.slide_end_speed);
    assert!(state.has_tag(MechanicTags::CROUCH), "still crouched after the slide");
}

// ============================================================================
// Determinism
// ============================================================================

/// A fixed input script: run, jump into the wall, ride it, jump off, slide.
fn scripted(n: usize, previous: &PlayerCommand) -> PlayerCommand {
    let mut cmd = PlayerCommand {
        forward_move: 1.0,
        view_delta: (0.0, if (40..48).contains(&n) { -0.05 } else { 0.0 }),
        ..Default::default()
    };

    let mut buttons = Vec::new();
    if n < 120 {
        buttons.push(CommandButtons::SPRINT);
    }
    if n == 30 || n == 90 || n == 150 {
        buttons.push(CommandButtons::JUMP);
    }
    if (200..260).contains(&n) {
        buttons.push(CommandButtons::DUCK);
    }
    if (160..180).contains(&n) {
        cmd.right_move = -1.0;
    }

    for button in buttons {
        cmd = cmd.with_button(button, previous.is_held(button));
    }
    cmd
}

fn run_script(mut controller: CharacterController, world: &CollisionWorld) -> (Vec<Vec3>, Vec<MovementEvent>) {
    let mut state = CharacterState::new(Vec3::new(-200.0, 0.0, 0.0), &controller.config);
    state.eye_angles.y = 0.3;
    controller.spawn_at(&mut state, Vec3::new(-200.0, 0.0, 0.0), world);

    let mut positions = Vec::new();
    let mut events = Vec::new();
    let mut previous = PlayerCommand::default();

    for n in 0..320 {
        let cmd = scripted(n, &previous);
        controller.tick(&mut state, &cmd, world, &mut events);
        positions.push(state.position);
        previous = cmd;
    }

    (positions, events)
}

#[test]
fn test_same_inputs_same_results() {
    let world = wall_world();

    let (positions_a, events_a) = run_script(CharacterController::with_default_config(), &world);
    let (positions_b, events_b) = run_script(CharacterController::with_default_config(), &world);

    assert_eq!(positions_a, positions_b);
    assert_eq!(events_a, events_b);
    assert!(
        events_a.iter().any(|e| matches!(e, MovementEvent::Jumped(_))),
        "the script jumps at least once"
    );
}

#[test]
fn test_registration_order_does_not_change_results() {
    let world = wall_world();

    let mut reversed = Scheduler::new();
    reversed.register(Box::new(Sprint::default()));
    reversed.register(Box::new(Wallrun));
    reversed.register(Box::new(Slide));
    reversed.register(Box::new(Walk));
    reversed.register(Box::new(AirMove));
    reversed.register(Box::new(Jump));
    reversed.register(Box::new(Crouch));

    let controller = CharacterController::with_scheduler(MovementConfig::default(), reversed);
    let (positions_a, events_a) = run_script(controller, &world);
    let (positions_b, events_b) = run_script(CharacterController::with_default_config(), &world);

    assert_eq!(positions_a, positions_b);
    assert_eq!(events_a, events_b);
}
