//! Vaultrun - headless runner.
//!
//! Runs one scripted player through the parkour test course at a fixed
//! 64 Hz and logs the jumps, landings and wall-runs it produces.
//!
//! Usage: `vaultrun [regular|faster|debug] [ticks] [--auto-sprint]`

use anyhow::{bail, Context, Result};
use vaultrun_game::replication::{self, EyeAngles};
use vaultrun_game::{
    Level, MovementEvent, MovementPreset, Player, PlayerInput, RemoteView, Simulation,
    SimulationConfig,
};

const DEFAULT_TICKS: u64 = 64 * 20;

/// Ticks between eye-angle updates sent to the remote view.
const REPLICATION_INTERVAL: u64 = 16;

/// Command line options.
struct Options {
    preset: MovementPreset,
    ticks: u64,
    auto_sprint: bool,
}

impl Options {
    fn parse() -> Result<Self> {
        let mut options = Self {
            preset: MovementPreset::default(),
            ticks: DEFAULT_TICKS,
            auto_sprint: false,
        };

        let mut positional = 0;
        for arg in std::env::args().skip(1) {
            if arg == "--auto-sprint" {
                options.auto_sprint = true;
                continue;
            }

            match positional {
                0 => {
                    options.preset = arg
                        .parse()
                        .with_context(|| format!("invalid preset argument '{arg}'"))?
                }
                1 => {
                    options.ticks = arg
                        .parse()
                        .with_context(|| format!("invalid tick count '{arg}'"))?
                }
                _ => bail!("unexpected argument '{arg}'"),
            }
            positional += 1;
        }

        Ok(options)
    }
}

/// Where the scripted run is along the course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    RunUp,
    ToWall,
    OnWall,
    Crate,
    Tunnel,
    Finish,
}

/// Drives the player through the course from its observed state.
struct CourseScript {
    stage: Stage,
    jump_was_down: bool,
}

impl CourseScript {
    fn new() -> Self {
        Self {
            stage: Stage::RunUp,
            jump_was_down: false,
        }
    }

    fn next_input(&mut self, player: &Player) -> PlayerInput {
        let x = player.position().x;
        let mut input = PlayerInput::forward();
        input.actions.sprint = true;
        let mut want_jump = false;

        self.stage = match self.stage {
            Stage::RunUp if x > 450.0 => Stage::ToWall,
            Stage::ToWall if player.is_wallrunning() => Stage::OnWall,
            Stage::ToWall if x > 1400.0 => Stage::Crate,
            Stage::OnWall if !player.is_wallrunning() || x > 1300.0 => Stage::Crate,
            Stage::Crate if x > 2100.0 => Stage::Tunnel,
            Stage::Tunnel if x > 2700.0 => Stage::Finish,
            stage => stage,
        };

        match self.stage {
            Stage::RunUp => {}
            Stage::ToWall => {
                input.movement.left = true;
                want_jump = player.is_grounded();
            }
            Stage::OnWall => {}
            Stage::Crate => {
                // Leave the wall, then hop onto the crate
                want_jump = player.is_wallrunning() || (x > 1840.0 && player.is_grounded());
            }
            Stage::Tunnel => {
                input.actions.duck = x > 2250.0;
            }
            Stage::Finish => {
                input.actions.sprint = false;
                input.actions.restart = x > 3300.0;
            }
        }

        // Release between presses so every jump is a fresh press
        input.actions.jump = want_jump && !self.jump_was_down;
        self.jump_was_down = input.actions.jump;
        input
    }
}

fn log_event(frame: u64, event: &MovementEvent) {
    match event {
        MovementEvent::Jumped(jump_type) => log::info!("[{frame:5}] jump ({jump_type:?})"),
        MovementEvent::Landed {
            fall_height, hard, ..
        } => {
            if *hard {
                log::warn!("[{frame:5}] hard landing after {fall_height:.1} ft");
            } else {
                log::info!("[{frame:5}] landed after {fall_height:.1} ft");
            }
        }
        MovementEvent::FastWallJump {
            speed_delta,
            time_since_wall_touch,
        } => log::info!(
            "[{frame:5}] fast wall jump: {speed_delta:+.0} u/s after {time_since_wall_touch:.2}s on the wall"
        ),
        MovementEvent::Footstep { kind, quiet, .. } => {
            log::trace!("[{frame:5}] footstep {kind:?} quiet={quiet}")
        }
        MovementEvent::GrappleAttached { anchor } => {
            log::info!("[{frame:5}] grapple attached at {anchor}")
        }
        MovementEvent::GrappleReleased => log::info!("[{frame:5}] grapple released"),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::parse()?;
    let mut config = SimulationConfig::with_preset(options.preset);
    config.auto_sprint = options.auto_sprint;

    log::info!(
        "running {} ticks at {} Hz with the {} preset",
        options.ticks,
        config.tick_rate,
        options.preset
    );

    let mut simulation = Simulation::new(config, Level::test_course());
    let player_id = simulation
        .add_player("Runner")
        .context("failed to place the runner")?;

    let mut script = CourseScript::new();
    let mut remote = RemoteView::default();
    let mut was_wallrunning = false;
    let mut top_speed: f32 = 0.0;

    for _ in 0..options.ticks {
        let Some(player) = simulation.get_player(player_id) else {
            bail!("runner {player_id} disappeared");
        };
        let input = script.next_input(player);
        simulation.tick(&[input]);

        for logged in simulation.events.drain() {
            log_event(logged.frame, &logged.event);
        }

        let frame = simulation.frame;
        let Some(player) = simulation.get_player(player_id) else {
            bail!("runner {player_id} disappeared");
        };

        if player.is_wallrunning() != was_wallrunning {
            was_wallrunning = player.is_wallrunning();
            if was_wallrunning {
                log::info!("[{frame:5}] wallrun started at {:.0} u/s", player.speed());
            } else {
                log::info!("[{frame:5}] wallrun ended");
            }
        }
        top_speed = top_speed.max(player.speed());

        if frame % REPLICATION_INTERVAL == 0 {
            let bytes = replication::encode(&EyeAngles::from_state(&player.state))?;
            remote.receive(&bytes)?;
            log::debug!(
                "[{frame:5}] replicated {} bytes, remote looking {}",
                bytes.len(),
                remote.look_direction()
            );
        }

        if player.restarts > 0 {
            log::info!("[{frame:5}] course finished, restarted at spawn");
            break;
        }
    }

    if let Some(player) = simulation.get_player(player_id) {
        log::info!(
            "finished after {} ticks at {:?}, top speed {top_speed:.0} u/s",
            simulation.frame,
            player.position()
        );
    }

    Ok(())
}
