//! Inflow drivers on the left border.
//!
//! Both actions prescribe a water level in border column `x = -1` and derive
//! the inflow velocity from the characteristic leaving the first interior
//! column: `U = 2 (c - c_right) + U_right` with `c = sqrt(g H)`. The border
//! velocity then relaxes toward that value over the step.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::solver::{CalculatorPars, GlobalParameters};

use super::{ActionContext, GridAction, snap_speed};

/// First interior column sampled by both inflow actions.
struct Neighbour {
    u: f64,
    speed: f64,
}

impl Neighbour {
    fn read(ctx: &ActionContext<'_>, y: isize, gravity: f64) -> Self {
        let h = ctx.current.h.get(0, y);
        Self {
            u: ctx.current.u.get(0, y),
            speed: (gravity * h).sqrt(),
        }
    }
}

/// Stochastic phase of a [`SineWaveGenerator`], for irregular waves.
///
/// A new random profile along the border is drawn every `time_coherence`
/// seconds and the phase blends linearly from the previous profile to the
/// new one in between. Each profile is a running mean of uniform samples
/// over `space_coherence * rows` neighbouring rows, rescaled to unit-sample
/// variance, so nearby rows move together.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseNoise {
    /// Noise strength; the row phase is `2 pi * omega * amplitude * noise`.
    pub amplitude: f64,
    /// Averaging window as a fraction of the border length.
    pub space_coherence: f64,
    /// Seconds between two drawn profiles; `0` draws every step.
    pub time_coherence: f64,
    pub seed: u64,
}

impl PhaseNoise {
    pub fn new(amplitude: f64, space_coherence: f64, time_coherence: f64, seed: u64) -> Self {
        Self {
            amplitude,
            space_coherence,
            time_coherence,
            seed,
        }
    }

    /// Width of the averaging window for a border of `rows` cells.
    fn window(&self, rows: usize) -> usize {
        ((rows as f64 * self.space_coherence).round() as usize).clamp(1, (rows * 10).max(1))
    }
}

/// Random profiles drawn so far by a [`PhaseNoise`].
#[derive(Clone, Debug)]
struct NoiseState {
    rng: StdRng,
    previous: Vec<f64>,
    next: Vec<f64>,
    /// Time the `next` profile was drawn.
    drawn_at: Option<f64>,
}

impl NoiseState {
    fn new(noise: &PhaseNoise, rows: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(noise.seed),
            previous: vec![0.0; rows],
            next: vec![0.0; rows],
            drawn_at: None,
        }
    }

    /// Draw a new profile if none exists yet or the coherence interval has
    /// elapsed.
    fn advance(&mut self, noise: &PhaseNoise, time: f64) {
        let period = noise.time_coherence;
        let first = self.drawn_at.is_none();
        self.drawn_at = match self.drawn_at {
            None => Some(time),
            Some(at) if period > 0.0 && time >= at + period => {
                Some(at + period * ((time - at) / period).floor().max(1.0))
            }
            Some(_) if period <= 0.0 => Some(time),
            Some(_) => return,
        };

        let rows = self.next.len();
        let span = noise.window(rows);
        let mut window: Vec<f64> = (0..span).map(|_| self.rng.gen_range(-0.5..0.5)).collect();
        let scale = (span as f64).sqrt() / span as f64;
        for y in 0..rows {
            self.previous[y] = self.next[y];
            let sum: f64 = window.iter().sum();
            window[y % span] = self.rng.gen_range(-0.5..0.5);
            self.next[y] = sum * scale;
            if first {
                self.previous[y] = self.next[y];
            }
        }
        log::debug!("sine_wave_generator: new phase noise profile at t = {time:.3}");
    }

    /// Blended noise of row `y` at `time`.
    fn at(&self, noise: &PhaseNoise, y: usize, time: f64) -> f64 {
        let drawn_at = self.drawn_at.unwrap_or(time);
        let t = if noise.time_coherence > 0.0 {
            ((time - drawn_at) / noise.time_coherence).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.previous[y] * (1.0 - t) + self.next[y] * t
    }
}

/// Sinusoidal water level along the left border.
///
/// The level is `depth + amplitude * sin(omega * t + k * y + phase[y])`. With a
/// positive `wavelength_along_side` the phase advances along the border, which
/// produces an oblique wave front. The per-row phase is the sum of the fixed
/// `row_phases` and the time-coherent [`PhaseNoise`], if any.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SineWaveGenerator {
    pub amplitude: f64,
    /// Angular frequency (rad/s).
    pub omega: f64,
    /// Wavelength projected on the border; `0` keeps the front parallel.
    pub wavelength_along_side: f64,
    /// Extra per-row phase (rad); rows past the end get none.
    pub row_phases: Vec<f64>,
    pub noise: Option<PhaseNoise>,
    #[cfg_attr(feature = "serde", serde(skip))]
    noise_state: Option<NoiseState>,
}

impl SineWaveGenerator {
    pub fn new(amplitude: f64, omega: f64) -> Self {
        Self {
            amplitude,
            omega,
            wavelength_along_side: 0.0,
            row_phases: Vec::new(),
            noise: None,
            noise_state: None,
        }
    }

    pub fn with_wavelength_along_side(mut self, length: f64) -> Self {
        self.wavelength_along_side = length;
        self
    }

    /// Per-row phase offsets, e.g. seeded noise to break up the front.
    pub fn with_row_phases(mut self, phases: Vec<f64>) -> Self {
        self.row_phases = phases;
        self
    }

    /// Random phase regenerated every `noise.time_coherence` seconds.
    pub fn with_noise(mut self, noise: PhaseNoise) -> Self {
        self.noise = Some(noise);
        self.noise_state = None;
        self
    }

    /// Noise phase (rad) of every border row at `time`, drawing a new profile
    /// when one is due. Empty without noise.
    fn noise_phases(&mut self, rows: usize, time: f64) -> Vec<f64> {
        let Some(noise) = self.noise.filter(|n| n.amplitude > 0.0) else {
            return Vec::new();
        };
        let stale = self.noise_state.as_ref().is_none_or(|s| s.next.len() < rows);
        if stale {
            self.noise_state = Some(NoiseState::new(&noise, rows));
        }
        let Some(state) = self.noise_state.as_mut() else {
            return Vec::new();
        };
        state.advance(&noise, time);
        let k = 2.0 * PI * self.omega * noise.amplitude;
        (0..rows).map(|y| k * state.at(&noise, y, time)).collect()
    }

    /// Phase increment per border row.
    fn row_phase_step(&self, step_w: f64) -> f64 {
        if self.wavelength_along_side > 0.0 {
            2.0 * PI * step_w / self.wavelength_along_side
        } else {
            0.0
        }
    }
}

impl GridAction for SineWaveGenerator {
    fn name(&self) -> &'static str {
        "sine_wave_generator"
    }

    fn run(&mut self, ctx: &mut ActionContext<'_>, pars: &CalculatorPars, globals: &GlobalParameters) {
        let (_, h) = ctx.dims();
        let g = globals.gravity;
        let k = self.row_phase_step(ctx.step_w);
        let base = self.omega * pars.time;
        let noise = self.noise_phases(h, pars.time);

        for y in 0..h as isize {
            let phase = self.row_phases.get(y as usize).copied().unwrap_or(0.0)
                + noise.get(y as usize).copied().unwrap_or(0.0);
            let depth = ctx.bottom.height().get(-1, y);
            let level = depth + self.amplitude * (base + k * y as f64 + phase).sin();

            let (mut h_new, mut u_new) = (0.0, 0.0);
            if level > 0.0 {
                let right = Neighbour::read(ctx, y, g);
                let speed = (g * level).sqrt();
                let u_inter = 2.0 * (speed - right.speed) + right.u;
                let u_in = ctx.current.u.get(-1, y);
                let u = u_in
                    + pars.tau * (u_inter - u_in) * (right.speed - right.u + speed - u_inter)
                        / (ctx.rcp_step_w * 2.0);
                h_new = level;
                u_new = snap_speed(u, globals.min_non_zero_speed);
            }
            ctx.dest.h.set(-1, y, h_new);
            ctx.dest.u.set(-1, y, u_new);
            ctx.dest.v.set(-1, y, 0.0);
        }
    }
}

/// Water level on the left border ramped from `start_level` to `stop_level`.
///
/// Levels are measured upward from the reference, so a border cell of depth
/// `b` gets water height `b + level` once that is positive.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaterRise {
    pub start_level: f64,
    pub stop_level: f64,
    /// Ramp duration (s); the level stays at `stop_level` afterwards.
    pub duration: f64,
}

impl WaterRise {
    pub fn new(start_level: f64, stop_level: f64, duration: f64) -> Self {
        Self {
            start_level,
            stop_level,
            duration,
        }
    }

    /// Prescribed level at time `t`.
    pub fn level_at(&self, t: f64) -> f64 {
        if t < self.duration {
            self.start_level + (self.stop_level - self.start_level) * t / self.duration
        } else {
            self.stop_level
        }
    }
}

impl GridAction for WaterRise {
    fn name(&self) -> &'static str {
        "water_rise"
    }

    fn run(&mut self, ctx: &mut ActionContext<'_>, pars: &CalculatorPars, globals: &GlobalParameters) {
        let (_, h) = ctx.dims();
        let g = globals.gravity;
        let level = self.level_at(pars.time);

        for y in 0..h as isize {
            ctx.dest.h.set(-1, y, 0.0);
            ctx.dest.u.set(-1, y, 0.0);
            ctx.dest.v.set(-1, y, 0.0);

            let depth = ctx.bottom.height().get(-1, y);
            if level <= -depth {
                continue;
            }
            let h_new = depth + level;
            let right = Neighbour::read(ctx, y, g);
            let u_new = if right.u.abs() < right.speed {
                let speed = (g * h_new).sqrt();
                let u_inter = 2.0 * (speed - right.speed) + right.u;
                let u_in = ctx.current.u.get(-1, y);
                let rcp_dt = 0.5 * (right.speed - right.u + speed - u_inter) * ctx.rcp_step_w;
                (u_in + pars.tau * (u_inter - u_in) * rcp_dt).max(right.u)
            } else {
                right.u
            };
            ctx.dest.h.set(-1, y, h_new);
            ctx.dest.u.set(-1, y, u_new);
        }
        log::trace!("water_rise: level {level:.4} at t = {:.3}", pars.time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::test_util::{Bench, pars};
    use approx::assert_relative_eq;

    fn globals() -> GlobalParameters {
        GlobalParameters::default().with_gravity(9.81)
    }

    #[test]
    fn test_sine_level_at_rest_phase() {
        let mut b = Bench::new(4, 3, 1.0, 9.81);
        b.current.h.fill(1.0);
        let mut wave = SineWaveGenerator::new(0.2, PI);
        // sin(pi * 0.5) = 1
        wave.run(&mut b.ctx(), &pars(0.5, 0.01), &globals());
        for y in 0..3 {
            assert_relative_eq!(b.dest.h.get(-1, y), 1.2, epsilon = 1e-12);
            assert!(b.dest.u.get(-1, y) > 0.0);
            assert_eq!(b.dest.v.get(-1, y), 0.0);
        }
    }

    #[test]
    fn test_sine_inflow_velocity() {
        let mut b = Bench::new(2, 1, 1.0, 10.0);
        b.current.h.fill(1.0);
        let g = GlobalParameters::default();
        let mut wave = SineWaveGenerator::new(0.21, PI);
        wave.run(&mut b.ctx(), &pars(0.5, 0.1), &g);
        let speed_r = 10.0f64.sqrt();
        let speed = (10.0 * 1.21f64).sqrt();
        let u_inter = 2.0 * (speed - speed_r);
        let expected = 0.1 * u_inter * (speed_r + speed - u_inter) / 2.0;
        assert_relative_eq!(b.dest.u.get(-1, 0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sine_trough_below_bottom_is_dry() {
        let mut b = Bench::new(2, 2, 0.1, 9.81);
        b.dest.h.fill(3.0);
        let mut wave = SineWaveGenerator::new(0.5, PI);
        // sin(1.5 pi) = -1
        wave.run(&mut b.ctx(), &pars(1.5, 0.01), &globals());
        assert_eq!(b.dest.h.get(-1, 0), 0.0);
        assert_eq!(b.dest.u.get(-1, 1), 0.0);
    }

    #[test]
    fn test_sine_oblique_front_and_row_phases() {
        let mut b = Bench::new(2, 4, 1.0, 9.81);
        b.current.h.fill(1.0);
        let mut wave = SineWaveGenerator::new(0.1, 0.0)
            .with_wavelength_along_side(4.0)
            .with_row_phases(vec![PI / 2.0]);
        wave.run(&mut b.ctx(), &pars(0.0, 0.01), &globals());
        // Row 0: extra phase pi/2; row 1: k = pi/2.
        assert_relative_eq!(b.dest.h.get(-1, 0), 1.1, epsilon = 1e-12);
        assert_relative_eq!(b.dest.h.get(-1, 1), 1.1, epsilon = 1e-12);
        assert_relative_eq!(b.dest.h.get(-1, 2), 1.0, epsilon = 1e-12);
        assert_relative_eq!(b.dest.h.get(-1, 3), 0.9, epsilon = 1e-12);
    }

    fn noisy(seed: u64) -> SineWaveGenerator {
        SineWaveGenerator::new(0.1, 1.0).with_noise(PhaseNoise::new(0.5, 0.25, 1.0, seed))
    }

    #[test]
    fn test_noise_window_is_clamped() {
        let n = PhaseNoise::new(1.0, 0.25, 1.0, 0);
        assert_eq!(n.window(16), 4);
        assert_eq!(PhaseNoise { space_coherence: 0.0, ..n }.window(16), 1);
        assert_eq!(PhaseNoise { space_coherence: 50.0, ..n }.window(16), 160);
    }

    #[test]
    fn test_noise_is_seeded() {
        let (mut a, mut b, mut c) = (noisy(7), noisy(7), noisy(8));
        let pa = a.noise_phases(16, 0.0);
        assert_eq!(pa, b.noise_phases(16, 0.0));
        assert_ne!(pa, c.noise_phases(16, 0.0));
        assert!(pa.iter().any(|&p| p != 0.0));
        // Bounded by the window mean of samples in [-0.5, 0.5).
        let bound = 2.0 * PI * 0.5 * 0.5 * 2.0;
        assert!(pa.iter().all(|p| p.abs() <= bound));
    }

    #[test]
    fn test_noise_blends_linearly_between_profiles() {
        let mut wave = noisy(3);
        let start = wave.noise_phases(8, 0.0);
        // First profile: no earlier one to blend from.
        assert_eq!(start, wave.noise_phases(8, 0.5));

        // Second profile drawn at t = 1, reached at t = 2.
        let from = wave.noise_phases(8, 1.0);
        assert_eq!(from, start);
        let mid = wave.noise_phases(8, 1.5);
        let state = wave.noise_state.clone().unwrap();
        let k = 2.0 * PI * 0.5;
        for y in 0..8 {
            assert_relative_eq!(from[y], k * state.previous[y], epsilon = 1e-12);
            assert_relative_eq!(mid[y], k * 0.5 * (state.previous[y] + state.next[y]), epsilon = 1e-12);
        }
        let end = wave.noise_phases(8, 1.999);
        for y in 0..8 {
            assert_relative_eq!(end[y], k * (0.001 * state.previous[y] + 0.999 * state.next[y]), epsilon = 1e-12);
        }
        assert!((0..8).any(|y| state.previous[y] != state.next[y]));
    }

    #[test]
    fn test_noise_profile_is_continuous_in_time() {
        let mut wave = noisy(11);
        let mut last = wave.noise_phases(12, 0.0);
        let mut t = 0.0;
        for _ in 0..400 {
            t += 0.01;
            let now = wave.noise_phases(12, t);
            for (a, b) in now.iter().zip(&last) {
                // 0.01 of an interval moves at most 0.01 of the profile range.
                assert!((a - b).abs() < 0.1, "jump {a} -> {b} at t = {t}");
            }
            last = now;
        }
    }

    #[test]
    fn test_noise_shifts_border_level() {
        let mut b = Bench::new(2, 6, 1.0, 9.81);
        b.current.h.fill(1.0);
        let mut plain = SineWaveGenerator::new(0.1, 1.0);
        plain.run(&mut b.ctx(), &pars(0.0, 0.01), &globals());
        let flat: Vec<f64> = (0..6).map(|y| b.dest.h.get(-1, y)).collect();

        let mut wave = noisy(5);
        wave.run(&mut b.ctx(), &pars(0.0, 0.01), &globals());
        let phases = wave.noise_phases(6, 0.0);
        for y in 0..6 {
            assert_relative_eq!(b.dest.h.get(-1, y as isize), 1.0 + 0.1 * phases[y].sin(), epsilon = 1e-12);
        }
        assert!((0..6).any(|y| b.dest.h.get(-1, y) != flat[y as usize]));
    }

    #[test]
    fn test_zero_noise_amplitude_is_silent() {
        let mut wave = SineWaveGenerator::new(0.1, 1.0).with_noise(PhaseNoise::new(0.0, 0.5, 1.0, 1));
        assert!(wave.noise_phases(4, 0.0).is_empty());
    }

    #[test]
    fn test_rise_ramp() {
        let rise = WaterRise::new(-1.0, 1.0, 10.0);
        assert_eq!(rise.level_at(0.0), -1.0);
        assert_eq!(rise.level_at(5.0), 0.0);
        assert_eq!(rise.level_at(10.0), 1.0);
        assert_eq!(rise.level_at(50.0), 1.0);
    }

    #[test]
    fn test_rise_floods_border() {
        let mut b = Bench::new(3, 2, 0.5, 9.81);
        b.current.h.fill(0.5);
        let mut rise = WaterRise::new(0.0, 0.2, 1.0);
        rise.run(&mut b.ctx(), &pars(2.0, 0.01), &globals());
        assert_relative_eq!(b.dest.h.get(-1, 0), 0.7, epsilon = 1e-12);
        // Inflow never runs slower than the interior neighbour.
        assert!(b.dest.u.get(-1, 0) >= 0.0);

        let mut low = WaterRise::new(-1.0, -1.0, 1.0);
        low.run(&mut b.ctx(), &pars(2.0, 0.01), &globals());
        assert_eq!(b.dest.h.get(-1, 1), 0.0);
    }

    #[test]
    fn test_rise_supercritical_neighbour_passes_through() {
        let mut b = Bench::new(3, 1, 1.0, 10.0);
        b.current.h.fill(0.1);
        b.current.u.fill(5.0);
        let mut rise = WaterRise::new(0.5, 0.5, 1.0);
        rise.run(&mut b.ctx(), &pars(0.0, 0.01), &GlobalParameters::default());
        assert_eq!(b.dest.u.get(-1, 0), 5.0);
    }
}
