/// Entry point and tick loop.
///
///   polarity <level.json> <tileset.json> [ticks] [--view]
///   polarity -n <level number> [ticks] [--view]
///
/// Headless by default: runs `ticks` steps with no input and logs a
/// summary. `--view` opens the terminal overlay instead (feature `viewer`).

use std::error::Error;
use std::path::PathBuf;

use log::{info, warn};

use polarity::config::GameConfig;
use polarity::domain::entity::FrameInput;
use polarity::sim::event::GameEvent;
use polarity::sim::level::{load_level, load_level_number};
use polarity::sim::step::step;
use polarity::sim::world::Level;

const DEFAULT_TICKS: u64 = 600;

const USAGE: &str = "usage: polarity <level.json> <tileset.json> [ticks] [--view]\n       polarity -n <level> [ticks] [--view]";

enum Source {
    Files { level: PathBuf, tileset: PathBuf },
    Number(u32),
}

struct Args {
    source: Source,
    ticks: u64,
    view: bool,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut view = false;
    let mut number = None;
    let mut positional = Vec::new();

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--view" => view = true,
            "-n" | "--level" => {
                let n = raw.next().ok_or("missing level number")?;
                number = Some(n.parse::<u32>().map_err(|e| format!("bad level number {n:?}: {e}"))?);
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let source = match number {
        Some(n) => Source::Number(n),
        None => {
            let (Some(level), Some(tileset)) = (positional.next(), positional.next()) else {
                return Err(USAGE.to_string());
            };
            Source::Files { level: level.into(), tileset: tileset.into() }
        }
    };
    let ticks = match positional.next() {
        Some(t) => t.parse::<u64>().map_err(|e| format!("bad tick count {t:?}: {e}"))?,
        None => DEFAULT_TICKS,
    };

    Ok(Args { source, ticks, view })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = GameConfig::load();

    let mut level = match &args.source {
        Source::Files { level, tileset } => load_level(&config, level, tileset)?,
        Source::Number(n) => load_level_number(&config, *n)?,
    };

    if args.view {
        return view(&mut level, &config, args.ticks);
    }

    let summary = run_headless(&mut level, &config, args.ticks);
    info!("{summary}");
    println!("{summary}");
    Ok(())
}

// ── Headless ──

#[derive(Default)]
struct Summary {
    ticks: u64,
    flips: u32,
    eliminated: u32,
    removed: u32,
    hits: u32,
    hazards: u32,
    plates: u32,
    reversals: u32,
    explosions: u32,
    survivors: usize,
}

impl Summary {
    fn tally(&mut self, events: &[GameEvent]) {
        for e in events {
            match e {
                GameEvent::GravityFlipped { .. } => self.flips += 1,
                GameEvent::BodyEliminated { .. } => self.eliminated += 1,
                GameEvent::BodyRemoved { .. } => self.removed += 1,
                GameEvent::BodyHit { .. } => self.hits += 1,
                GameEvent::HazardTouched { .. } => self.hazards += 1,
                GameEvent::PlateTouched { .. } => self.plates += 1,
                GameEvent::PlatformReversed { .. } => self.reversals += 1,
                GameEvent::Exploded { .. } => self.explosions += 1,
            }
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ticks: {} flips, {} eliminated, {} removed, {} hits, {} hazard touches, \
             {} plate touches, {} platform reversals, {} explosions, {} bodies active",
            self.ticks, self.flips, self.eliminated, self.removed, self.hits, self.hazards,
            self.plates, self.reversals, self.explosions, self.survivors,
        )
    }
}

fn run_headless(level: &mut Level, config: &GameConfig, ticks: u64) -> Summary {
    let dt = config.dt();
    let input = FrameInput::default();
    let mut summary = Summary::default();
    for _ in 0..ticks {
        let events = step(level, &input, dt);
        summary.tally(&events);
        summary.ticks += 1;
    }
    summary.survivors = level.active_count();
    summary
}

// ── Viewer ──

#[cfg(feature = "viewer")]
fn view(level: &mut Level, config: &GameConfig, _ticks: u64) -> Result<(), Box<dyn Error>> {
    use polarity::ui::overlay::Overlay;

    let mut overlay = Overlay::new();
    overlay.init()?;
    let result = view_loop(level, config, &mut overlay);
    if let Err(e) = overlay.cleanup() {
        warn!("terminal cleanup failed: {e}");
    }
    result
}

#[cfg(feature = "viewer")]
fn view_loop(
    level: &mut Level,
    config: &GameConfig,
    overlay: &mut polarity::ui::overlay::Overlay,
) -> Result<(), Box<dyn Error>> {
    use std::time::{Duration, Instant};

    use polarity::ui::input::Keyboard;

    const FRAME_SLEEP: Duration = Duration::from_millis(5);

    let mut kb = Keyboard::new();
    let tick_rate = Duration::from_millis(config.physics.tick_rate_ms);
    let dt = config.dt();
    let mut last_tick = Instant::now();

    loop {
        kb.drain();
        if kb.wants_quit() {
            break;
        }
        if kb.toggled_field() {
            overlay.show_field = !overlay.show_field;
        }

        if last_tick.elapsed() >= tick_rate {
            for e in step(level, &kb.frame_input(), dt) {
                log::debug!("tick {}: {e:?}", level.tick);
            }
            overlay.render(level)?;
            last_tick = Instant::now();
        }

        std::thread::sleep(FRAME_SLEEP);
    }
    Ok(())
}

#[cfg(not(feature = "viewer"))]
fn view(level: &mut Level, config: &GameConfig, ticks: u64) -> Result<(), Box<dyn Error>> {
    warn!("built without the viewer feature; running headless");
    let summary = run_headless(level, config, ticks);
    info!("{summary}");
    println!("{summary}");
    Ok(())
}
