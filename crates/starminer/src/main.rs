//! Headless runner
//!
//! Runs a scripted flight against the in-memory collaborators and logs a
//! session summary. Pass a `.toml` or `.ron` config path as the first
//! argument to override defaults.

use nova_engine::config::Config;
use nova_engine::foundation::logging;
use starminer::hooks::EventLog;
use starminer::input::KeyState;
use starminer::render::HeadlessRenderer;
use starminer::voxel::VoxelStore;
use starminer::{config::GameConfig, Game, GameResult};

/// Frames rendered per second by the scripted host
const FRAME_HZ: f64 = 60.0;

/// Length of the scripted session (seconds)
const SESSION_SECS: f64 = 20.0;

fn main() {
    logging::init_with_default("info");

    if let Err(e) = run() {
        log::error!("starminer-headless failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> GameResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load_or_default(path)?,
        None => GameConfig::default(),
    };

    let mut game = Game::new(config, HeadlessRenderer::new(), EventLog::new(), VoxelStore::default())?;
    let field = game.seed_field();
    log::info!("Seeded {} objects", field.len());

    let controls = game.config().controls.clone();
    let total_frames = (SESSION_SECS * FRAME_HZ) as u64;

    for frame in 0..=total_frames {
        let now = frame as f64 / FRAME_HZ;
        let keys = scripted_keys(now, &controls.pitch_forward, &controls.yaw_left, &controls.fire);
        game.frame(now, &keys);

        if game.stats().paused {
            game.resume();
        }
    }

    let stats = game.stats();
    log::info!(
        "Session over: {} ticks, {} destroyed, {} collected, {} cargo, {:.0} credits ({:.0} banked), energy {:.0}/{:.0}",
        game.ticks(),
        game.spawner().destroyed_count(),
        game.loot().collected_count(),
        stats.storage,
        stats.credits,
        stats.banked_credits,
        stats.energy,
        stats.max_energy
    );
    log::info!(
        "Renderer: {} created, {} destroyed, {} live",
        game.renderer().created(),
        game.renderer().destroyed(),
        game.renderer().live_count()
    );
    for kind in starminer::render::ParticleKind::ALL {
        let pool = game.vfx().pool_stats(kind);
        log::debug!("{kind:?} pool: {pool:?}");
    }

    Ok(())
}

/// Key state for the scripted flight at time `now`
///
/// Two short taps on the pitch key shift up a gear, a slow sweep turns the
/// ship through the field, and the gun fires in bursts.
fn scripted_keys(now: f64, pitch_forward: &str, yaw_left: &str, fire: &str) -> KeyState {
    let mut keys = KeyState::new();

    let tap = (0.10..0.13).contains(&now) || (0.20..0.23).contains(&now);
    keys.set(pitch_forward, tap);

    keys.set(yaw_left, (now % 6.0) < 1.5);
    keys.set(fire, now > 1.0 && (now % 2.0) < 1.2);
    keys
}
