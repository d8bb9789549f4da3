use glam::Vec2;

use crate::clock::ClockSample;
use crate::flower::{hours_to_angle, NUM_HOURS};
use crate::palette::{self, Color};
use crate::render::petal::Petal;

/// Alpha of a falling petal before the dissolve (of 255).
const FALL_ALPHA: f32 = 128.0;
/// Upper bound of the random per-petal start delay.
const MAX_START_DELAY_MS: f64 = 400.0;
/// Hold at full alpha after every petal has landed.
const REST_MS: f64 = 2000.0;
/// Linear fade to transparent after the rest.
const FADE_MS: f64 = 5000.0;
/// The fall starts at 00:00:05.
const TRIGGER_SECOND: u32 = 5;
/// Share of the petal length kept above the floor: the base stops early
/// because the tip reaches further.
const LANDING_LIFT: f32 = 0.3;

/// One of the 24 petals dropping at midnight.
/// Velocities are in logical pixels per tick, rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingPetal {
    pub angle: f32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub rotation_vel: f32,
    pub gravity: f32,
    pub landed: bool,
    pub alpha: f32,
    pub color: [f32; 3],
    pub start_delay_ms: f64,
    pub spawn_ms: f64,
}

impl FallingPetal {
    fn spawn(hour: usize, center: Vec2, color: [f32; 3], now_ms: f64, rng: &mut fastrand::Rng) -> Self {
        Self {
            angle: hours_to_angle(hour as f32),
            pos: center,
            // Mostly downward, slight horizontal scatter
            vel: Vec2::new(rng.f32() * 3.0 - 1.5, 1.0 + rng.f32() * 3.0),
            rotation: 0.0,
            rotation_vel: rng.f32() * 3.0 - 1.5,
            gravity: 0.15 + rng.f32() * 0.2,
            landed: false,
            alpha: FALL_ALPHA,
            color,
            start_delay_ms: rng.f64() * MAX_START_DELAY_MS,
            spawn_ms: now_ms,
        }
    }

    /// Still holding still before its first move.
    pub fn waiting(&self, now_ms: f64) -> bool {
        now_ms - self.spawn_ms < self.start_delay_ms
    }

    /// One physics tick. `floor_line` is where the base comes to rest.
    fn step(&mut self, floor_line: f32) {
        self.vel.y += self.gravity;
        self.pos += self.vel;
        self.rotation += self.rotation_vel;

        if self.pos.y >= floor_line {
            self.pos.y = floor_line;
            self.landed = true;
            self.vel = Vec2::ZERO;
            self.rotation_vel = 0.0;
        }
    }
}

/// Where the midnight animation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallPhase {
    Idle,
    Falling,
    Resting,
    Fading,
}

/// Every petal of a non-empty batch is on the ground.
pub fn all_landed(petals: &[FallingPetal]) -> bool {
    !petals.is_empty() && petals.iter().all(|p| p.landed)
}

/// Every petal of a non-empty batch is on the ground and invisible.
pub fn all_dissolved(petals: &[FallingPetal]) -> bool {
    !petals.is_empty() && petals.iter().all(|p| p.landed && p.alpha <= 0.0)
}

/// Alpha for a petal `elapsed_ms` after the dissolve started.
/// `None` during the rest, when alpha is left untouched.
pub fn dissolve_alpha(elapsed_ms: f64) -> Option<f32> {
    if elapsed_ms <= REST_MS {
        return None;
    }
    let frac = ((elapsed_ms - REST_MS) / FADE_MS).clamp(0.0, 1.0) as f32;
    Some(FALL_ALPHA + (0.0 - FALL_ALPHA) * frac)
}

/// Owns the midnight fall: trigger, physics, dissolve and cleanup.
pub struct FallController {
    petals: Vec<FallingPetal>,
    /// Day of month of the last trigger. `None` matches no real day.
    trigger_day: Option<u32>,
    /// When every petal was first seen on the ground.
    dissolve_start_ms: Option<f64>,
    rng: fastrand::Rng,
}

impl FallController {
    pub fn new(rng: fastrand::Rng) -> Self {
        Self {
            petals: Vec::with_capacity(NUM_HOURS),
            trigger_day: None,
            dissolve_start_ms: None,
            rng,
        }
    }

    pub fn petals(&self) -> &[FallingPetal] {
        &self.petals
    }

    pub fn trigger_day(&self) -> Option<u32> {
        self.trigger_day
    }

    pub fn dissolve_start_ms(&self) -> Option<f64> {
        self.dissolve_start_ms
    }

    pub fn is_active(&self) -> bool {
        !self.petals.is_empty()
    }

    pub fn phase(&self, now_ms: f64) -> FallPhase {
        if self.petals.is_empty() {
            return FallPhase::Idle;
        }
        match self.dissolve_start_ms {
            None => FallPhase::Falling,
            Some(start) if now_ms - start <= REST_MS => FallPhase::Resting,
            Some(_) => FallPhase::Fading,
        }
    }

    /// Start the fall if it is 00:00:05 or later and it has not run today.
    /// Returns true when a new batch was created.
    pub fn check_trigger(&mut self, clock: &ClockSample, center: Vec2) -> bool {
        let due = clock.hour == 0 && clock.minute == 0 && clock.second >= TRIGGER_SECOND;
        if !due || self.trigger_day == Some(clock.day) {
            return false;
        }
        self.trigger_day = Some(clock.day);
        self.start(center, clock.now_ms);
        log::info!("Midnight fall triggered (day {})", clock.day);
        true
    }

    /// Replace any batch with 24 fresh petals at `center`.
    /// Does not touch the trigger-day marker.
    pub fn start(&mut self, center: Vec2, now_ms: f64) {
        self.petals.clear();
        self.dissolve_start_ms = None;

        let color = palette::end_of_day_color();
        for h in 0..NUM_HOURS {
            self.petals
                .push(FallingPetal::spawn(h, center, color, now_ms, &mut self.rng));
        }
    }

    /// One fixed physics tick for every petal that is free to move.
    pub fn tick(&mut self, now_ms: f64, floor_y: f32, petal_length: f32) {
        let floor_line = floor_y - petal_length * LANDING_LIFT;
        for p in &mut self.petals {
            if p.landed || p.waiting(now_ms) {
                continue;
            }
            p.step(floor_line);
        }
    }

    /// Per-frame timers: start the dissolve, fade, and clear when done.
    pub fn advance(&mut self, now_ms: f64) {
        if self.petals.is_empty() {
            return;
        }

        if self.dissolve_start_ms.is_none() && all_landed(&self.petals) {
            self.dissolve_start_ms = Some(now_ms);
            log::debug!("All petals landed, dissolve starts");
        }

        if let Some(start) = self.dissolve_start_ms {
            if let Some(alpha) = dissolve_alpha(now_ms - start) {
                for p in &mut self.petals {
                    p.alpha = p.alpha.min(alpha);
                }
            }
        }

        if all_dissolved(&self.petals) {
            self.petals.clear();
            self.dissolve_start_ms = None;
            log::info!("Midnight fall finished");
        }
    }

    /// Append the visible ghost petals.
    pub fn build_petals(&self, now_ms: f64, petal_length: f32, buf: &mut Vec<Petal>) {
        for p in &self.petals {
            let angle = if p.waiting(now_ms) {
                p.angle
            } else if p.alpha <= 0.0 {
                continue;
            } else {
                p.angle + p.rotation
            };
            buf.push(Petal {
                anchor: p.pos,
                angle,
                length: petal_length,
                color: Color::new(p.color, p.alpha),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::at;

    const TICK_MS: f64 = 1000.0 / 60.0;
    const CENTER: Vec2 = Vec2::new(400.0, 300.0);
    const FLOOR_Y: f32 = 560.0;
    const LENGTH: f32 = 210.0;

    fn controller() -> FallController {
        FallController::new(fastrand::Rng::with_seed(0xF10E))
    }

    /// Tick and advance until everything is on the ground. Returns the time.
    fn run_until_landed(fall: &mut FallController, mut now: f64) -> f64 {
        for _ in 0..10_000 {
            if all_landed(fall.petals()) {
                return now;
            }
            now += TICK_MS;
            fall.tick(now, FLOOR_Y, LENGTH);
        }
        panic!("petals never landed");
    }

    #[test]
    fn test_triggers_once_across_the_first_ten_seconds() {
        let mut fall = controller();
        let mut triggers = Vec::new();
        for ms in (0..=10_000u32).step_by(50) {
            let clock = at(12, 0, 0, ms / 1000, ms % 1000, ms as f64);
            if fall.check_trigger(&clock, CENTER) {
                triggers.push(ms);
            }
        }
        assert_eq!(triggers, vec![5000]);
    }

    #[test]
    fn test_replay_same_day_does_not_retrigger() {
        let mut fall = controller();
        let clock = at(12, 0, 0, 5, 0, 0.0);
        assert!(fall.check_trigger(&clock, CENTER));
        assert!(!fall.check_trigger(&clock, CENTER));
        assert!(!fall.check_trigger(&at(12, 0, 0, 59, 999, 1.0), CENTER));
        // Next day fires again.
        assert!(fall.check_trigger(&at(13, 0, 0, 5, 0, 2.0), CENTER));
        assert_eq!(fall.trigger_day(), Some(13));
    }

    #[test]
    fn test_no_trigger_outside_the_window() {
        let mut fall = controller();
        assert!(!fall.check_trigger(&at(12, 0, 0, 4, 999, 0.0), CENTER));
        assert!(!fall.check_trigger(&at(12, 0, 1, 5, 0, 0.0), CENTER));
        assert!(!fall.check_trigger(&at(12, 12, 0, 5, 0, 0.0), CENTER));
        assert_eq!(fall.trigger_day(), None);
        assert_eq!(fall.phase(0.0), FallPhase::Idle);
    }

    #[test]
    fn test_trigger_creates_full_batch_at_center() {
        let mut fall = controller();
        let clock = at(21, 0, 0, 5, 0, 1000.0);
        assert!(fall.check_trigger(&clock, CENTER));
        assert_eq!(fall.trigger_day(), Some(21));
        assert_eq!(fall.dissolve_start_ms(), None);

        let petals = fall.petals();
        assert_eq!(petals.len(), NUM_HOURS);
        for (h, p) in petals.iter().enumerate() {
            assert_eq!(p.pos, CENTER);
            assert_eq!(p.color, palette::end_of_day_color());
            assert_eq!(p.angle, hours_to_angle(h as f32));
            assert_eq!(p.alpha, FALL_ALPHA);
            assert_eq!(p.rotation, 0.0);
            assert_eq!(p.spawn_ms, 1000.0);
            assert!(!p.landed);
            assert!((-1.5..=1.5).contains(&p.vel.x));
            assert!((1.0..=4.0).contains(&p.vel.y));
            assert!((-1.5..=1.5).contains(&p.rotation_vel));
            assert!((0.15..=0.35).contains(&p.gravity));
            assert!((0.0..=MAX_START_DELAY_MS).contains(&p.start_delay_ms));
        }
        assert_eq!(fall.phase(1000.0), FallPhase::Falling);

        // Checking again the same day changes nothing.
        let before = fall.petals().to_vec();
        assert!(!fall.check_trigger(&at(21, 0, 0, 6, 0, 2000.0), CENTER));
        assert_eq!(fall.petals(), &before[..]);
    }

    #[test]
    fn test_waiting_petals_hold_still() {
        let mut fall = controller();
        fall.start(CENTER, 0.0);
        fall.tick(0.0, FLOOR_Y, LENGTH);
        for p in fall.petals().iter().filter(|p| p.start_delay_ms > 0.0) {
            assert_eq!(p.pos, CENTER);
            assert_eq!(p.rotation, 0.0);
        }
        // Past the longest delay everything has moved.
        fall.tick(MAX_START_DELAY_MS, FLOOR_Y, LENGTH);
        assert!(fall.petals().iter().all(|p| p.pos.y > CENTER.y));
    }

    #[test]
    fn test_every_petal_lands_and_rests() {
        let mut fall = controller();
        fall.start(CENTER, 0.0);
        run_until_landed(&mut fall, 0.0);

        let floor_line = FLOOR_Y - LENGTH * LANDING_LIFT;
        for p in fall.petals() {
            assert!(p.landed);
            assert_eq!(p.vel, Vec2::ZERO);
            assert_eq!(p.rotation_vel, 0.0);
            assert_eq!(p.pos.y, floor_line);
        }

        // Resting petals never move again.
        let rested = fall.petals().to_vec();
        fall.tick(1e6, FLOOR_Y, LENGTH);
        assert_eq!(fall.petals(), &rested[..]);
    }

    #[test]
    fn test_dissolve_start_recorded_once() {
        let mut fall = controller();
        fall.start(CENTER, 0.0);
        let landed_at = run_until_landed(&mut fall, 0.0);

        fall.advance(landed_at);
        assert_eq!(fall.dissolve_start_ms(), Some(landed_at));
        for i in 1..10 {
            fall.advance(landed_at + i as f64 * 100.0);
            assert_eq!(fall.dissolve_start_ms(), Some(landed_at));
        }
        assert_eq!(fall.phase(landed_at + 1500.0), FallPhase::Resting);
    }

    #[test]
    fn test_no_fade_before_everything_lands() {
        let mut fall = controller();
        fall.start(CENTER, 0.0);
        // A single tick leaves petals in the air.
        fall.tick(TICK_MS, FLOOR_Y, LENGTH);
        fall.advance(60_000.0);
        assert_eq!(fall.dissolve_start_ms(), None);
        assert!(fall.petals().iter().all(|p| p.alpha == FALL_ALPHA));
    }

    #[test]
    fn test_fade_schedule_and_cleanup() {
        let mut fall = controller();
        fall.start(CENTER, 0.0);
        let t0 = run_until_landed(&mut fall, 0.0).ceil();
        fall.advance(t0);

        let mut prev = FALL_ALPHA;
        let mut t = t0;
        while t < t0 + 6_900.0 {
            t += 50.0;
            fall.advance(t);
            let alpha = fall.petals()[0].alpha;
            assert!(alpha <= prev, "alpha rose from {prev} to {alpha}");
            assert!(fall.petals().iter().all(|p| p.alpha == alpha));
            prev = alpha;
        }
        assert!(prev > 0.0);
        assert_eq!(fall.phase(t), FallPhase::Fading);

        // Fully transparent: the batch goes away in one piece.
        fall.advance(t0 + 7_000.0);
        assert!(fall.petals().is_empty());
        assert_eq!(fall.phase(t0 + 7_000.0), FallPhase::Idle);
        assert_eq!(fall.dissolve_start_ms(), None);
    }

    #[test]
    fn test_rest_keeps_full_alpha() {
        let mut fall = controller();
        fall.start(CENTER, 0.0);
        let t0 = run_until_landed(&mut fall, 0.0).ceil();
        fall.advance(t0);
        fall.advance(t0 + 2_000.0);
        assert!(fall.petals().iter().all(|p| p.alpha == FALL_ALPHA));
        fall.advance(t0 + 4_500.0);
        assert!(fall.petals().iter().all(|p| (p.alpha - 64.0).abs() < 1e-3));
    }

    #[test]
    fn test_dissolve_alpha_curve() {
        assert_eq!(dissolve_alpha(0.0), None);
        assert_eq!(dissolve_alpha(2_000.0), None);
        assert_eq!(dissolve_alpha(7_000.0), Some(0.0));
        assert_eq!(dissolve_alpha(60_000.0), Some(0.0));
        let mid = dissolve_alpha(4_500.0).unwrap();
        assert!((mid - 64.0).abs() < 1e-4);
    }

    #[test]
    fn test_predicates_need_both_landed_and_transparent() {
        let mut fall = controller();
        fall.start(CENTER, 0.0);
        let mut petals = fall.petals().to_vec();
        assert!(!all_landed(&petals));
        assert!(!all_dissolved(&petals));

        for p in &mut petals {
            p.alpha = 0.0;
        }
        assert!(!all_dissolved(&petals), "transparent but airborne");

        for p in &mut petals {
            p.landed = true;
        }
        assert!(all_landed(&petals));
        assert!(all_dissolved(&petals));

        assert!(!all_landed(&[]));
        assert!(!all_dissolved(&[]));
    }

    #[test]
    fn test_build_petals_draws_waiting_and_skips_faded() {
        let mut fall = controller();
        fall.start(CENTER, 0.0);
        let mut buf = Vec::new();
        fall.build_petals(0.0, LENGTH, &mut buf);
        assert_eq!(buf.len(), NUM_HOURS);
        assert!(buf.iter().all(|p| p.anchor == CENTER && p.length == LENGTH));
        assert!(buf.iter().all(|p| p.color.alpha == FALL_ALPHA));

        let t0 = run_until_landed(&mut fall, 0.0);
        fall.advance(t0);
        buf.clear();
        fall.build_petals(t0, LENGTH, &mut buf);
        for (drawn, p) in buf.iter().zip(fall.petals()) {
            assert_eq!(drawn.angle, p.angle + p.rotation);
            assert_eq!(drawn.anchor, p.pos);
        }

        // Hand-fade one petal: it disappears but the batch stays.
        let mut faded = FallController::new(fastrand::Rng::with_seed(1));
        faded.start(CENTER, 0.0);
        faded.petals[0].alpha = 0.0;
        buf.clear();
        faded.build_petals(1_000.0, LENGTH, &mut buf);
        assert_eq!(buf.len(), NUM_HOURS - 1);
        assert_eq!(faded.petals().len(), NUM_HOURS);
    }

    #[test]
    fn test_start_resets_dissolve_but_not_marker() {
        let mut fall = controller();
        fall.start(CENTER, 0.0);
        let t0 = run_until_landed(&mut fall, 0.0);
        fall.advance(t0);
        assert!(fall.dissolve_start_ms().is_some());

        fall.start(CENTER, t0);
        assert_eq!(fall.dissolve_start_ms(), None);
        assert_eq!(fall.petals().len(), NUM_HOURS);
        assert_eq!(fall.trigger_day(), None);
        assert!(fall.is_active());
    }

    #[test]
    fn test_seeded_batches_are_reproducible() {
        let mut a = FallController::new(fastrand::Rng::with_seed(99));
        let mut b = FallController::new(fastrand::Rng::with_seed(99));
        a.start(CENTER, 0.0);
        b.start(CENTER, 0.0);
        assert_eq!(a.petals(), b.petals());
        let ta = run_until_landed(&mut a, 0.0);
        let tb = run_until_landed(&mut b, 0.0);
        assert_eq!(ta, tb);
        assert_eq!(a.petals(), b.petals());
    }
}
