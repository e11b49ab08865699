//! Flux-splitting formulas.
//!
//! Every formula is generic over [`Real`] so the scalar calculator (`f64`) and
//! the batch calculator ([`F64x4`](super::lanes::F64x4)) evaluate the very same
//! expression tree. Along an axis, `n` is the normal velocity and `t` the
//! tangential one: for the x axis `n = u, t = v` with left/right neighbours,
//! for the y axis `n = v, t = u` with up/down neighbours.

use super::lanes::Real;
use super::params::{CalculatorPars, GlobalParameters};
use super::regime::FlowRegime;

/// Per-step constants, splatted to the lane type once per tile.
#[derive(Clone, Copy, Debug)]
pub struct Coefficients<T> {
    pub gravity: T,
    pub half_gravity: T,
    pub h_min: T,
    pub min_speed: T,
    /// `tau * Cf`
    pub tau_mul_cf: T,
    /// `tau / dx` and a quarter of it.
    pub k_w: T,
    pub k_w_quarter: T,
    /// `tau / dy` and a quarter of it.
    pub k_h: T,
    pub k_h_quarter: T,
}

impl Coefficients<f64> {
    pub fn new(
        globals: &GlobalParameters,
        pars: &CalculatorPars,
        rcp_step_w: f64,
        rcp_step_h: f64,
    ) -> Self {
        let k_w = pars.tau * rcp_step_w;
        let k_h = pars.tau * rcp_step_h;
        Self {
            gravity: globals.gravity,
            half_gravity: globals.half_gravity(),
            h_min: globals.h_min,
            min_speed: globals.min_non_zero_speed,
            tau_mul_cf: pars.tau * globals.cf,
            k_w,
            k_w_quarter: 0.25 * k_w,
            k_h,
            k_h_quarter: 0.25 * k_h,
        }
    }

    /// Broadcast to another lane type.
    pub fn splat<T: Real>(&self, arch: T::Arch) -> Coefficients<T> {
        let s = |v| T::splat(arch, v);
        Coefficients {
            gravity: s(self.gravity),
            half_gravity: s(self.half_gravity),
            h_min: s(self.h_min),
            min_speed: s(self.min_speed),
            tau_mul_cf: s(self.tau_mul_cf),
            k_w: s(self.k_w),
            k_w_quarter: s(self.k_w_quarter),
            k_h: s(self.k_h),
            k_h_quarter: s(self.k_h_quarter),
        }
    }
}

impl<T: Real> Coefficients<T> {
    #[inline(always)]
    pub fn arch(&self) -> T::Arch {
        self.gravity.arch()
    }

    /// `v` in the lane type of these coefficients.
    #[inline(always)]
    pub fn constant(&self, v: f64) -> T {
        T::splat(self.arch(), v)
    }
}

/// State of one node seen along one axis.
#[derive(Clone, Copy, Debug)]
pub struct Sample<T> {
    pub h: T,
    /// Normal velocity.
    pub n: T,
    /// Tangential velocity.
    pub t: T,
    /// Bottom height.
    pub hb: T,
    /// `b * sqrt(g * b)` of the bottom.
    pub hbs: T,
    /// Wave speed `sqrt(g * h)`.
    pub c: T,
}

/// Scaled flux contribution of one axis.
#[derive(Clone, Copy, Debug)]
pub struct AxisFlux<T> {
    pub h: T,
    pub n: T,
    pub t: T,
}

/// Accumulated flux of a node.
#[derive(Clone, Copy, Debug)]
pub struct Flow<T> {
    pub h: T,
    pub u: T,
    pub v: T,
}

impl Flow<f64> {
    pub fn zero() -> Self {
        Self::filled(0.0)
    }
}

impl<T: Real> Flow<T> {
    #[inline(always)]
    pub fn filled(z: T) -> Self {
        Self { h: z, u: z, v: z }
    }

    /// Add an x-axis contribution (normal is `u`).
    #[inline(always)]
    pub fn add_u(&mut self, f: AxisFlux<T>) {
        self.h = self.h + f.h;
        self.u = self.u + f.n;
        self.v = self.v + f.t;
    }

    /// Add a y-axis contribution (normal is `v`).
    #[inline(always)]
    pub fn add_v(&mut self, f: AxisFlux<T>) {
        self.h = self.h + f.h;
        self.v = self.v + f.n;
        self.u = self.u + f.t;
    }
}

/// Height and velocities of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell<T> {
    pub h: T,
    pub u: T,
    pub v: T,
}

impl Cell<f64> {
    pub fn zero() -> Self {
        Self::filled(0.0)
    }
}

impl<T: Real> Cell<T> {
    #[inline(always)]
    pub fn filled(z: T) -> Self {
        Self { h: z, u: z, v: z }
    }
}

/// Flux of one axis for a given regime.
///
/// `k` is `tau / step` of the axis and `k_quarter` a quarter of it; the
/// supercritical regimes use `k`, the subcritical ones `k_quarter`.
#[inline(always)]
pub fn regime_flux<T: Real>(
    regime: FlowRegime,
    co: &Coefficients<T>,
    k: T,
    k_quarter: T,
    cur: &Sample<T>,
    minus: &Sample<T>,
    plus: &Sample<T>,
) -> AxisFlux<T> {
    match regime {
        FlowRegime::SuperPos => super_pos(co, k, cur, minus),
        FlowRegime::SuperNeg => super_neg(co, k, cur, plus),
        FlowRegime::SubPos => sub_pos(co, k_quarter, cur, minus, plus),
        FlowRegime::SubNeg => sub_neg(co, k_quarter, cur, minus, plus),
    }
}

#[inline(always)]
fn super_pos<T: Real>(co: &Coefficients<T>, k: T, c: &Sample<T>, m: &Sample<T>) -> AxisFlux<T> {
    let hg = co.half_gravity;
    let h = c.h * c.n - m.h * m.n;
    let n = c.h * (hg * c.h + c.n * c.n)
        - m.h * (hg * m.h + m.n * m.n)
        - hg * (c.h + m.h) * (c.hb - m.hb);
    let t = c.h * c.n * c.t - m.h * m.n * m.t;
    AxisFlux {
        h: h * k,
        n: n * k,
        t: t * k,
    }
}

#[inline(always)]
fn super_neg<T: Real>(co: &Coefficients<T>, k: T, c: &Sample<T>, p: &Sample<T>) -> AxisFlux<T> {
    let hg = co.half_gravity;
    let h = -c.h * c.n + p.h * p.n;
    let n = -c.h * (hg * c.h + c.n * c.n) + p.h * (hg * p.h + p.n * p.n)
        - hg * (p.h + c.h) * (p.hb - c.hb);
    let t = -c.h * c.n * c.t + p.h * p.n * p.t;
    AxisFlux {
        h: h * k,
        n: n * k,
        t: t * k,
    }
}

#[inline(always)]
fn sub_pos<T: Real>(
    co: &Coefficients<T>,
    kq: T,
    c: &Sample<T>,
    m: &Sample<T>,
    p: &Sample<T>,
) -> AxisFlux<T> {
    let g = co.gravity;
    let two = co.constant(2.0);
    let three = co.constant(3.0);

    let mut h = two * c.h * (c.c + c.n);
    let mut n = two * c.h * (two * c.c + c.n) * c.n;
    let mut t = h * c.t;
    h = h - two * c.hbs;

    h = h - m.h * (three * m.n + m.c);
    n = n - m.h * (three * m.n * m.n + two * m.n * m.c + g * m.h);
    t = t - m.h * (three * m.n + m.c) * m.t;
    h = h + m.hbs;
    n = n - g * (c.h + m.h) * (c.hb - m.hb);

    h = h + p.h * (p.n - p.c);
    n = n + p.h * (p.n * p.n - two * p.n * p.c + g * p.h);
    t = t + p.h * (p.n - p.c) * p.t;
    h = h + p.hbs;
    n = n - g * (p.h + c.h) * (p.hb - c.hb);

    AxisFlux {
        h: h * kq,
        n: n * kq,
        t: t * kq,
    }
}

#[inline(always)]
fn sub_neg<T: Real>(
    co: &Coefficients<T>,
    kq: T,
    c: &Sample<T>,
    m: &Sample<T>,
    p: &Sample<T>,
) -> AxisFlux<T> {
    let g = co.gravity;
    let two = co.constant(2.0);
    let three = co.constant(3.0);

    let mut h = two * c.h * (c.c - c.n);
    let mut n = two * c.h * (two * c.c - c.n) * c.n;
    let mut t = h * c.t;
    h = h - two * c.hbs;

    h = h - m.h * (m.n + m.c);
    n = n - m.h * (m.n * m.n + two * m.n * m.c + g * m.h);
    t = t - m.h * (m.n + m.c) * m.t;
    h = h + m.hbs;
    n = n - g * (c.h + m.h) * (c.hb - m.hb);

    h = h + p.h * (three * p.n - p.c);
    n = n + p.h * (three * p.n * p.n - two * p.n * p.c + g * p.h);
    t = t + p.h * (three * p.n - p.c) * p.t;
    h = h + p.hbs;
    n = n - g * (p.h + c.h) * (p.hb - c.hb);

    AxisFlux {
        h: h * kq,
        n: n * kq,
        t: t * kq,
    }
}

/// Apply the accumulated flux, friction and the numeric guards.
///
/// A node whose new height is not positive becomes dry with zero velocity.
/// The velocity denominator is floored at `h_min` and speeds below
/// `min_speed` snap to zero.
#[inline(always)]
pub fn finalize<T: Real>(co: &Coefficients<T>, cur: Cell<T>, flow: Flow<T>) -> Cell<T> {
    let zero = co.constant(0.0);
    let h_new = cur.h - flow.h;
    let friction = co.tau_mul_cf * (cur.u * cur.u + cur.v * cur.v).sqrt();
    let rcp = co.constant(1.0) / h_new.max(co.h_min);
    let h_left = cur.h - friction;
    let u = snap(rcp * (h_left * cur.u - flow.u), co.min_speed);
    let v = snap(rcp * (h_left * cur.v - flow.v), co.min_speed);
    let wet = h_new.gt(zero);
    Cell {
        h: T::select(wet, h_new, zero),
        u: T::select(wet, u, zero),
        v: T::select(wet, v, zero),
    }
}

#[inline(always)]
fn snap<T: Real>(s: T, min_speed: T) -> T {
    T::select(s.abs().ge(min_speed), s, s.broadcast(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coefficients() -> Coefficients<f64> {
        let globals = GlobalParameters::new(0.01, 9.81, 0.0, 0.0);
        let pars = CalculatorPars::new(0.0, 0.01).unwrap();
        Coefficients::new(&globals, &pars, 1.0, 1.0)
    }

    fn still(h: f64, g: f64) -> Sample<f64> {
        Sample {
            h,
            n: 0.0,
            t: 0.0,
            hb: 0.0,
            hbs: 0.0,
            c: (g * h).sqrt(),
        }
    }

    #[test]
    fn test_uniform_still_water_has_no_flux() {
        let co = coefficients();
        let s = still(1.0, co.gravity);
        for regime in [
            FlowRegime::SuperPos,
            FlowRegime::SubPos,
            FlowRegime::SubNeg,
            FlowRegime::SuperNeg,
        ] {
            let f = regime_flux(regime, &co, co.k_w, co.k_w_quarter, &s, &s, &s);
            assert_eq!((f.h, f.n, f.t), (0.0, 0.0, 0.0), "{regime:?}");
        }
    }

    #[test]
    fn test_super_pos_upwind_mass_flux() {
        let co = coefficients();
        let cur = Sample {
            n: 5.0,
            ..still(1.0, co.gravity)
        };
        let left = Sample {
            n: 4.0,
            ..still(2.0, co.gravity)
        };
        let f = regime_flux(FlowRegime::SuperPos, &co, co.k_w, co.k_w_quarter, &cur, &left, &cur);
        approx::assert_relative_eq!(f.h, (5.0 - 8.0) * 0.01, max_relative = 1e-12);
    }

    #[test]
    fn test_finalize_clamps_to_dry() {
        let co = coefficients();
        let cur = Cell {
            h: 0.1,
            u: 1.0,
            v: -1.0,
        };
        let flow = Flow {
            h: 0.2,
            u: 0.0,
            v: 0.0,
        };
        assert_eq!(finalize(&co, cur, flow), Cell::zero());
    }

    #[test]
    fn test_finalize_snaps_slow_velocities() {
        let mut co = coefficients();
        co.min_speed = 0.5;
        let cur = Cell {
            h: 1.0,
            u: 0.4,
            v: 2.0,
        };
        let out = finalize(&co, cur, Flow::zero());
        assert_eq!(out.h, 1.0);
        assert_eq!(out.u, 0.0);
        assert_eq!(out.v, 2.0);
    }
}
