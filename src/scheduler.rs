//! Fixed-timestep scheduler
//!
//! Owns the simulation state, the particle engine, and every collaborator
//! hook. `advance` is called once per render pulse with a monotonic
//! timestamp and runs, strictly in this order:
//!
//! 1. events raised by control calls since the last pulse
//! 2. zero or more simulation ticks (bounded catch-up), reacting to each
//! 3. event delivery to sinks and subscribers
//! 4. release of staggered effect waves that have come due
//! 5. one particle advance
//! 6. one redraw
//!
//! Steps 4-6 run on every pulse, paused or not.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::observers::{EventBus, EventSink, Fault, isolate};
use crate::particles::effects::{self, COLLISION_SHAKE, EffectQueue};
use crate::particles::ParticleEngine;
use crate::settings::{Settings, SettingsError};
use crate::sim::{self, Collapse, Direction, GameEvent, Item, ItemTier, RunPhase, SimulationState};
use crate::snapshot::{FrameRenderer, FrameSnapshot};
use crate::consts::{MAX_SPEED, MIN_SPEED};

/// What one pulse did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PulseReport {
    /// Simulation ticks executed
    pub ticks: u32,
    /// The delta was discarded as a stall
    pub stalled: bool,
    /// Catch-up hit the per-pulse cap and the backlog was dropped
    pub capped: bool,
    /// Particles that expired during this pulse's advance
    pub particles_retired: usize,
    /// Collaborator faults caught during this pulse
    pub faults: usize,
}

/// Drives the simulation from an external per-frame pulse
pub struct Scheduler {
    settings: Settings,
    state: SimulationState,
    particles: ParticleEngine,
    effects: EffectQueue,
    rng: Pcg32,
    seed: u64,
    bus: EventBus,
    renderer: Option<Box<dyn FrameRenderer>>,
    /// Events raised by control calls, delivered on the next pulse
    pending: Vec<GameEvent>,
    accumulator: f64,
    last_pulse_ms: Option<f64>,
    active: bool,
    pulses: u64,
}

impl Scheduler {
    /// Validate `settings` and set up a run in the `Ready` phase
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let settings = settings.sanitized();
        let seed = settings.seed.unwrap_or_else(rand::random);
        let mut rng = Pcg32::seed_from_u64(seed);
        let (state, pending) = SimulationState::new(&settings, &mut rng);
        let particles = ParticleEngine::new(
            settings.max_particles(),
            settings.particle_prewarm(),
            settings.assumed_fps,
        );

        log::info!(
            "Scheduler ready: {}x{} board, {:.0} ms base tick, {} particles max, seed {}",
            settings.tile_count,
            settings.tile_count,
            settings.base_tick_ms,
            settings.max_particles(),
            seed
        );

        Ok(Self {
            settings,
            state,
            particles,
            effects: EffectQueue::new(),
            rng,
            seed,
            bus: EventBus::new(),
            renderer: None,
            pending,
            accumulator: 0.0,
            last_pulse_ms: None,
            active: true,
            pulses: 0,
        })
    }

    // === Accessors ===

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn particles(&self) -> &ParticleEngine {
        &self.particles
    }

    pub fn effects(&self) -> &EffectQueue {
        &self.effects
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    /// Draw data for the current state
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(&self.state, self.particles.snapshots())
    }

    // === Collaborators ===

    pub fn add_sink(&mut self, sink: impl EventSink + 'static) {
        self.bus.add_sink(Box::new(sink));
    }

    pub fn subscribe(&mut self) -> crossbeam_channel::Receiver<GameEvent> {
        self.bus.subscribe()
    }

    pub fn set_renderer(&mut self, renderer: impl FrameRenderer + 'static) {
        self.renderer = Some(Box::new(renderer));
    }

    // === Controls ===

    /// Begin the run. Only valid from `Ready`.
    pub fn start(&mut self) -> bool {
        if self.state.phase != RunPhase::Ready {
            return false;
        }
        self.state.phase = RunPhase::Running;
        self.accumulator = 0.0;
        log::info!("Run started");
        self.pending.push(GameEvent::RunStarted);
        true
    }

    /// Flip between `Running` and `Paused`; ignored in other phases
    pub fn toggle_pause(&mut self) -> bool {
        let event = match self.state.phase {
            RunPhase::Running => {
                self.state.phase = RunPhase::Paused;
                GameEvent::Paused
            }
            RunPhase::Paused => {
                self.state.phase = RunPhase::Running;
                GameEvent::Resumed
            }
            RunPhase::Ready | RunPhase::GameOver => return false,
        };
        log::debug!("{:?}", event);
        self.pending.push(event);
        true
    }

    /// Start over from any phase
    pub fn reset(&mut self) {
        self.particles.clear();
        self.effects.clear();
        self.accumulator = 0.0;
        let events = self.state.reset(&self.settings, &mut self.rng);
        log::info!("Run reset");
        self.pending.extend(events);
    }

    /// Queue a turn for the next tick. Reversals are silently rejected.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if self.state.phase == RunPhase::GameOver {
            return false;
        }
        self.state.creature.set_direction(direction)
    }

    /// Foreground/background signal for ambient observers
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        self.pending.push(GameEvent::VisibilityChanged { active });
    }

    /// Change the speed multiplier for this run and future resets
    pub fn set_speed(&mut self, speed: f32) {
        let speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        self.settings.speed = speed;
        self.state.speed = speed;
    }

    pub fn set_burst_intensity(&mut self, intensity: f32) {
        self.settings.burst_intensity = intensity.clamp(0.0, 5.0);
    }

    /// Change the board geometry mid-run. Body cells are clamped into the
    /// new bounds and the item is re-placed if it no longer fits.
    pub fn resize_grid(&mut self, cell_size: f32, tile_count: i32) -> Result<(), SettingsError> {
        let resized = Settings {
            cell_size,
            tile_count,
            ..self.settings.clone()
        };
        resized.validate()?;
        self.settings = resized;

        self.state.grid.cell_size = cell_size;
        self.state.grid.tile_count = tile_count;
        self.state.creature.set_tile_count(tile_count);

        let item_cell = self.state.item.cell;
        let inner = 1..tile_count - 1;
        if !inner.contains(&item_cell.x)
            || !inner.contains(&item_cell.y)
            || self.state.creature.occupies(item_cell)
        {
            self.state.respawn_item(
                self.settings.placement_attempts,
                &mut self.rng,
                &mut self.pending,
            );
        }
        log::info!("Board resized to {tile_count}x{tile_count} @ {cell_size}px");
        Ok(())
    }

    // === Pulse ===

    /// Run one render pulse at `now_ms`
    pub fn advance(&mut self, now_ms: f64) -> PulseReport {
        let mut report = PulseReport::default();
        self.pulses += 1;

        let delta = match self.last_pulse_ms {
            Some(last) => (now_ms - last).max(0.0),
            None => 0.0,
        };
        self.last_pulse_ms = Some(now_ms);

        let mut events = std::mem::take(&mut self.pending);

        if delta > self.settings.stall_threshold_ms {
            log::debug!("Stall of {delta:.0} ms discarded");
            self.accumulator = 0.0;
            report.stalled = true;
        } else if self.state.phase == RunPhase::Running {
            self.accumulator += delta;
            self.run_ticks(now_ms, &mut events, &mut report);
        }

        for event in &events {
            self.react(event);
        }
        report.faults += self.bus.publish(&events);

        self.effects
            .release_due(now_ms, &mut self.particles, &mut self.rng);
        report.particles_retired = self.particles.advance();
        report.faults += self.redraw();
        report
    }

    fn run_ticks(&mut self, now_ms: f64, events: &mut Vec<GameEvent>, report: &mut PulseReport) {
        loop {
            // Re-read every tick: a level up changes the interval
            let interval = self.state.tick_interval_ms(self.settings.base_tick_ms);
            if self.accumulator < interval {
                break;
            }
            if report.ticks >= self.settings.max_ticks_per_pulse {
                self.accumulator %= interval;
                report.capped = true;
                log::debug!("Catch-up capped at {} ticks", report.ticks);
                break;
            }

            let consumed_item = self.state.item;
            let outcome = sim::tick(&mut self.state, &self.settings, now_ms, &mut self.rng);
            self.accumulator -= interval;
            report.ticks += 1;

            if let Some((cell, tier, combo)) = outcome.consumed {
                self.capture_burst(cell, tier, &consumed_item, combo);
            }
            if let Some(collapse) = &outcome.collapse {
                self.collapse_effects(collapse, now_ms);
            }
            events.extend(outcome.events);

            if self.state.phase != RunPhase::Running {
                self.accumulator = 0.0;
                break;
            }
        }
    }

    /// Particle reactions that only need the event itself
    fn react(&mut self, event: &GameEvent) {
        if let GameEvent::ItemSpawned { cell, color, .. } = *event {
            let center = self.state.grid.cell_center(cell);
            effects::spawn_ring(&mut self.particles, center, color, &mut self.rng);
        }
    }

    fn capture_burst(&mut self, cell: sim::Cell, tier: ItemTier, item: &Item, combo: u32) {
        let center = self.state.grid.cell_center(cell);
        effects::capture_burst(
            &mut self.particles,
            center,
            tier,
            item.display_color(),
            combo,
            self.settings.burst_intensity,
            &mut self.rng,
        );
    }

    fn collapse_effects(&mut self, collapse: &Collapse, now_ms: f64) {
        let board = self.state.grid.board_size();
        effects::shake_sparks(&mut self.particles, board, COLLISION_SHAKE, &mut self.rng);
        effects::shake_sparks(
            &mut self.particles,
            board,
            COLLISION_SHAKE * 1.2,
            &mut self.rng,
        );
        effects::disintegrate(
            &mut self.particles,
            &collapse.segments,
            self.state.grid.cell_size,
            self.state.tint,
            &mut self.rng,
        );

        self.effects.schedule_explosion(
            self.state.grid.cell_center(collapse.at),
            now_ms,
            self.settings.burst_intensity,
        );
    }

    fn redraw(&mut self) -> usize {
        let Some(renderer) = self.renderer.as_mut() else {
            return 0;
        };
        let frame = FrameSnapshot::capture(&self.state, self.particles.snapshots());
        match isolate(|| renderer.draw(&frame)) {
            Ok(()) => 0,
            Err(message) => {
                log::error!("Renderer failed: {message}");
                let fault = Fault {
                    sink: "renderer".to_string(),
                    message,
                };
                1 + self.bus.publish(&[fault.to_event()])
            }
        }
    }
}
