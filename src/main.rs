//! Cyber Serpent headless runner
//!
//! Drives the scheduler with synthetic 60 Hz pulses and autopilot steering,
//! logging events and audio cues instead of drawing and playing them.
//!
//! Usage: cyber-serpent [--seed N] [--pulses N] [--fps N] [--settings FILE]

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::Cell;
    use std::rc::Rc;

    use cyber_serpent::observers::{AudioCueSink, LogSink};
    use cyber_serpent::sim::{GameEvent, RunPhase};
    use cyber_serpent::{FrameRenderer, FrameSnapshot, Scheduler, Settings, SinkError, autopilot};

    /// Pulses to keep running after the run ends so the explosion settles
    const SETTLE_PULSES: u32 = 180;

    struct Args {
        seed: Option<u64>,
        pulses: u32,
        fps: f64,
        settings: Option<String>,
    }

    fn parse_args() -> Result<Args, String> {
        let mut args = Args {
            seed: None,
            pulses: 20_000,
            fps: 60.0,
            settings: None,
        };
        let mut it = std::env::args().skip(1);
        while let Some(flag) = it.next() {
            let mut value = || it.next().ok_or_else(|| format!("{flag} needs a value"));
            match flag.as_str() {
                "--seed" => args.seed = Some(value()?.parse().map_err(|e| format!("--seed: {e}"))?),
                "--pulses" => args.pulses = value()?.parse().map_err(|e| format!("--pulses: {e}"))?,
                "--fps" => args.fps = value()?.parse().map_err(|e| format!("--fps: {e}"))?,
                "--settings" => args.settings = Some(value()?),
                other => return Err(format!("unknown argument '{other}'")),
            }
        }
        if !(args.fps > 0.0) {
            return Err("--fps must be positive".into());
        }
        Ok(args)
    }

    /// Counts frames and tracks the busiest particle frame
    struct HeadlessRenderer {
        frames: Rc<Cell<u64>>,
        peak_particles: Rc<Cell<usize>>,
    }

    impl FrameRenderer for HeadlessRenderer {
        fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), SinkError> {
            self.frames.set(self.frames.get() + 1);
            if frame.particles.len() > self.peak_particles.get() {
                self.peak_particles.set(frame.particles.len());
            }
            Ok(())
        }
    }

    pub fn run() {
        let args = match parse_args() {
            Ok(args) => args,
            Err(err) => {
                log::error!("{err}");
                std::process::exit(2);
            }
        };

        let mut settings = match &args.settings {
            Some(path) => match Settings::load(path) {
                Ok(settings) => settings,
                Err(err) => {
                    log::warn!("Could not load {path}: {err}; using defaults");
                    Settings::default()
                }
            },
            None => Settings::default(),
        };
        if args.seed.is_some() {
            settings.seed = args.seed;
        }

        let mut scheduler = match Scheduler::new(settings) {
            Ok(scheduler) => scheduler,
            Err(err) => {
                log::error!("Invalid settings: {err}");
                std::process::exit(2);
            }
        };

        let frames = Rc::new(Cell::new(0));
        let peak_particles = Rc::new(Cell::new(0));
        scheduler.set_renderer(HeadlessRenderer {
            frames: Rc::clone(&frames),
            peak_particles: Rc::clone(&peak_particles),
        });
        scheduler.add_sink(LogSink);
        scheduler.add_sink(AudioCueSink::new(|cue| {
            log::trace!("audio {:?} vol {:.2} +{} ms", cue, cue.volume(), cue.delay_ms());
            Ok(())
        }));
        let events = scheduler.subscribe();

        log::info!("Cyber Serpent (headless) starting, seed {}", scheduler.seed());
        scheduler.start();

        let frame_ms = 1000.0 / args.fps;
        let mut settle = None;
        let mut captures = 0u32;
        let mut best_combo = 0u32;
        let mut faults = 0usize;
        let mut pulse = 0u32;

        while pulse < args.pulses {
            if scheduler.state().phase == RunPhase::Running {
                let dir = autopilot::steer(scheduler.state());
                scheduler.set_direction(dir);
            }

            let report = scheduler.advance(pulse as f64 * frame_ms);
            faults += report.faults;
            pulse += 1;

            for event in events.try_iter() {
                if let GameEvent::ItemConsumed { combo, .. } = event {
                    captures += 1;
                    best_combo = best_combo.max(combo);
                }
            }

            match settle {
                None if scheduler.state().phase == RunPhase::GameOver => {
                    settle = Some(SETTLE_PULSES);
                }
                Some(0) => break,
                Some(n) => settle = Some(n - 1),
                None => {}
            }
        }

        let state = scheduler.state();
        log::info!(
            "Finished after {} pulses ({} frames drawn): score {}, special {}, level {}, best combo {}, {} captures seen",
            pulse,
            frames.get(),
            state.score,
            state.special_captures,
            state.level,
            best_combo,
            captures
        );
        log::info!(
            "Particles: peak {} on screen, {} allocated, {} dropped; {} collaborator faults",
            peak_particles.get(),
            scheduler.particles().pool().allocated(),
            scheduler.particles().dropped(),
            faults
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on wasm; nothing to run here
}
