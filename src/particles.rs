//! Ambient particle emitter
//!
//! Pointer movement and clicks spawn short-lived sparks that drift, fall and
//! fade. Purely decorative; nothing else on the page reads this state.
//!
//! The emitter is stepped once per display frame by the host, so all physics
//! here is per-frame rather than per-second.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::consts::*;
use crate::settings::Settings;

/// A single decorative spark
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub id: u64,
    pub pos: Vec2,
    /// Pixels per frame
    pub vel: Vec2,
    /// Diameter in pixels
    pub size: f32,
    /// Base opacity picked at spawn
    pub opacity: f32,
    /// 1.0 at spawn, removed once it reaches 0
    pub life: f32,
    /// Life lost per frame
    pub decay: f32,
    /// Cosmetic variant
    pub sparkle: bool,
}

impl Particle {
    /// Opacity to draw with this frame
    pub fn alpha(&self) -> f32 {
        (self.opacity * self.life).clamp(0.0, 1.0)
    }

    /// Advance one frame. Returns false once the particle is spent.
    pub fn step(&mut self) -> bool {
        self.pos += self.vel;
        self.vel.y += PARTICLE_GRAVITY;
        self.vel *= PARTICLE_DAMPING;
        self.life -= self.decay;
        self.life > PARTICLE_MIN_LIFE
    }
}

/// Owns the live particle set, oldest first
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    particles: VecDeque<Particle>,
    rng: Pcg32,
    max_particles: usize,
    move_burst: usize,
    click_burst: usize,
    spawn_interval_ms: f64,
    last_spawn_ms: Option<f64>,
    next_id: u64,
    frames: u64,
    closed: bool,
}

impl ParticleEmitter {
    pub fn new(settings: &Settings, seed: u64) -> Self {
        Self {
            particles: VecDeque::with_capacity(settings.max_particles() + 1),
            rng: Pcg32::seed_from_u64(seed),
            max_particles: settings.max_particles(),
            move_burst: settings.move_burst,
            click_burst: settings.click_burst,
            spawn_interval_ms: settings.spawn_interval_ms,
            last_spawn_ms: None,
            next_id: 1,
            frames: 0,
            closed: false,
        }
    }

    /// Live particles, oldest first
    pub fn particles(&self) -> impl ExactSizeIterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Frames stepped since creation
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Throttled burst: at most one burst per spawn interval of host time
    pub fn on_pointer_move(&mut self, pos: Vec2, now_ms: f64) -> usize {
        if let Some(last) = self.last_spawn_ms {
            if now_ms - last <= self.spawn_interval_ms {
                return 0;
            }
        }
        let spawned = self.burst(pos, self.move_burst);
        if spawned > 0 {
            self.last_spawn_ms = Some(now_ms);
        }
        spawned
    }

    /// Unthrottled burst
    pub fn on_pointer_click(&mut self, pos: Vec2) -> usize {
        self.burst(pos, self.click_burst)
    }

    fn burst(&mut self, pos: Vec2, count: usize) -> usize {
        if self.closed || self.max_particles == 0 {
            return 0;
        }
        for _ in 0..count {
            let particle = self.spawn(pos);
            self.push(particle);
        }
        count
    }

    fn spawn(&mut self, origin: Vec2) -> Particle {
        let id = self.next_id;
        self.next_id += 1;
        let offset = Vec2::new(
            self.rng.random_range(-PARTICLE_SPREAD..=PARTICLE_SPREAD),
            self.rng.random_range(-PARTICLE_SPREAD..=PARTICLE_SPREAD),
        );
        let vel = Vec2::new(
            self.rng.random_range(-PARTICLE_MAX_SPEED..=PARTICLE_MAX_SPEED),
            self.rng.random_range(-PARTICLE_MAX_SPEED..=PARTICLE_MAX_SPEED),
        );
        Particle {
            id,
            pos: origin + offset,
            vel,
            size: self.rng.random_range(5.0..=11.0),
            opacity: self.rng.random_range(0.5..=1.0),
            life: 1.0,
            decay: self.rng.random_range(0.01..=0.03),
            sparkle: self.rng.random_bool(SPARKLE_CHANCE),
        }
    }

    /// Insert a particle, evicting the oldest if the cap is exceeded
    fn push(&mut self, particle: Particle) {
        self.particles.push_back(particle);
        if self.particles.len() > self.max_particles {
            if let Some(evicted) = self.particles.pop_front() {
                log::trace!("Evicted particle {}", evicted.id);
            }
        }
    }

    /// Step every live particle one frame and drop the spent ones
    pub fn update(&mut self) {
        if self.closed {
            return;
        }
        self.frames += 1;
        self.particles.retain_mut(Particle::step);
    }

    /// Page-unload hook: drop everything and ignore further input.
    /// Returns the ids that were still live so the host can remove visuals.
    pub fn shutdown(&mut self) -> Vec<u64> {
        self.closed = true;
        let ids = self.particles.drain(..).map(|p| p.id).collect::<Vec<_>>();
        log::debug!("Particle emitter shut down ({} cleared)", ids.len());
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn emitter() -> ParticleEmitter {
        ParticleEmitter::new(&Settings::default(), 7)
    }

    #[test]
    fn test_click_spawns_eight() {
        let mut e = emitter();
        assert_eq!(e.on_pointer_click(Vec2::new(100.0, 100.0)), CLICK_BURST);
        assert_eq!(e.len(), 8);
    }

    #[test]
    fn test_move_is_throttled() {
        let mut e = emitter();
        let p = Vec2::new(10.0, 10.0);
        assert_eq!(e.on_pointer_move(p, 1000.0), MOVE_BURST);
        assert_eq!(e.on_pointer_move(p, 1020.0), 0);
        assert_eq!(e.on_pointer_move(p, 1050.0), 0);
        assert_eq!(e.on_pointer_move(p, 1051.0), MOVE_BURST);
        assert_eq!(e.len(), 6);
    }

    #[test]
    fn test_spawn_ranges() {
        let mut e = emitter();
        let origin = Vec2::new(200.0, 300.0);
        for _ in 0..20 {
            e.on_pointer_click(origin);
            for p in e.particles() {
                assert!((p.pos - origin).abs().max_element() <= PARTICLE_SPREAD + 1e-3);
                assert!(p.vel.abs().max_element() <= PARTICLE_MAX_SPEED);
                assert!((5.0..=11.0).contains(&p.size));
                assert!((0.5..=1.0).contains(&p.opacity));
                assert!((0.01..=0.03).contains(&p.decay));
                assert_eq!(p.life, 1.0);
            }
        }
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut e = emitter();
        e.on_pointer_click(Vec2::ZERO); // ids 1..=8
        e.on_pointer_click(Vec2::ZERO); // ids 9..=16, evicts 1
        assert_eq!(e.len(), MAX_PARTICLES);
        assert_eq!(e.particles().next().map(|p| p.id), Some(2));
        assert_eq!(e.particles().last().map(|p| p.id), Some(16));
    }

    #[test]
    fn test_step_physics() {
        let mut p = Particle {
            id: 1,
            pos: Vec2::new(0.0, 0.0),
            vel: Vec2::new(1.0, -1.0),
            size: 6.0,
            opacity: 1.0,
            life: 1.0,
            decay: 0.02,
            sparkle: false,
        };
        assert!(p.step());
        assert_eq!(p.pos, Vec2::new(1.0, -1.0));
        assert!((p.vel.x - 0.98).abs() < 1e-6);
        assert!((p.vel.y - (-0.95 * 0.98)).abs() < 1e-6);
        assert!((p.life - 0.98).abs() < 1e-6);
    }

    #[test]
    fn test_lifecycle_frame_count() {
        for decay in [0.01_f32, 0.0125, 0.015, 0.02, 0.025, 0.03] {
            let mut p = Particle {
                id: 1,
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
                size: 6.0,
                opacity: 1.0,
                life: 1.0,
                decay,
                sparkle: false,
            };
            let mut frames = 0u32;
            while p.step() {
                frames += 1;
                assert!(p.life > 0.0);
            }
            frames += 1;
            // ceil(1/decay), ignoring the f32 error in decay itself
            let expected = (1.0 / decay as f64 - 1e-4).ceil() as u32;
            assert_eq!(frames, expected, "decay {}", decay);
        }
    }

    #[test]
    fn test_update_removes_spent() {
        let mut e = emitter();
        e.on_pointer_click(Vec2::ZERO);
        for _ in 0..101 {
            e.update();
            assert!(e.particles().all(|p| p.life > 0.0));
        }
        assert!(e.is_empty());
        assert_eq!(e.frames(), 101);
    }

    #[test]
    fn test_shutdown_clears_and_closes() {
        let mut e = emitter();
        e.on_pointer_click(Vec2::ZERO);
        let cleared = e.shutdown();
        assert_eq!(cleared.len(), 8);
        assert!(e.is_empty());
        assert_eq!(e.on_pointer_click(Vec2::ZERO), 0);
        e.update();
        assert_eq!(e.frames(), 0);
    }

    #[test]
    fn test_disabled_spawns_nothing() {
        let settings = Settings {
            particles: false,
            ..Settings::default()
        };
        let mut e = ParticleEmitter::new(&settings, 1);
        assert_eq!(e.on_pointer_click(Vec2::ZERO), 0);
        assert_eq!(e.on_pointer_move(Vec2::ZERO, 100.0), 0);
        assert!(e.is_empty());
    }

    #[test]
    fn test_same_seed_same_particles() {
        let mut a = emitter();
        let mut b = emitter();
        a.on_pointer_click(Vec2::new(5.0, 5.0));
        b.on_pointer_click(Vec2::new(5.0, 5.0));
        assert!(a.particles().eq(b.particles()));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Move(f64),
        Click,
        Frame,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0f64..120.0).prop_map(Op::Move),
            Just(Op::Click),
            Just(Op::Frame),
        ]
    }

    proptest! {
        #[test]
        fn live_count_never_exceeds_cap(ops in proptest::collection::vec(op(), 0..200), seed in any::<u64>()) {
            let mut e = ParticleEmitter::new(&Settings::default(), seed);
            let mut now = 0.0;
            for op in ops {
                match op {
                    Op::Move(dt) => {
                        now += dt;
                        e.on_pointer_move(Vec2::new(50.0, 50.0), now);
                    }
                    Op::Click => {
                        e.on_pointer_click(Vec2::new(50.0, 50.0));
                    }
                    Op::Frame => e.update(),
                }
                prop_assert!(e.len() <= MAX_PARTICLES);
                prop_assert!(e.particles().all(|p| p.life > 0.0));
            }
        }
    }
}
