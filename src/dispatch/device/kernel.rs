//! Whole-grid flux step as tensor operations.
//!
//! Fields are uploaded with their one-cell border, shape `[H + 2, W + 2]`.
//! Shifted windows of shape `[H, W]` give the centre and its four face
//! neighbours. Every regime's flux is evaluated everywhere and the node's
//! regime selects one of them, so the result follows the scalar calculator
//! up to the backend's float precision.
//!
//! Masks are combined as 0/1 float tensors and turned back into boolean
//! masks only for selection.

use burn::prelude::*;

use crate::solver::Coefficients;

use super::program::BuildVariant;

/// Border-padded state of one grid, shape `[H + 2, W + 2]`.
pub(super) struct PaddedState<B: Backend> {
    pub h: Tensor<B, 2>,
    pub u: Tensor<B, 2>,
    pub v: Tensor<B, 2>,
}

/// Border-padded bottom fields.
#[derive(Clone)]
pub(super) struct PaddedBottom<B: Backend> {
    pub height: Tensor<B, 2>,
    pub precomputed: Tensor<B, 2>,
}

/// Interior result, shape `[H, W]`.
pub(super) struct StepOutput<B: Backend> {
    pub h: Tensor<B, 2>,
    pub u: Tensor<B, 2>,
    pub v: Tensor<B, 2>,
}

/// Window offsets into the padded layout.
const CENTRE: (usize, usize) = (1, 1);
const LEFT: (usize, usize) = (1, 0);
const RIGHT: (usize, usize) = (1, 2);
const UP: (usize, usize) = (0, 1);
const DOWN: (usize, usize) = (2, 1);

/// One node (or neighbour) seen along an axis, every field `[H, W]`.
#[derive(Clone)]
struct Samples<B: Backend> {
    h: Tensor<B, 2>,
    n: Tensor<B, 2>,
    t: Tensor<B, 2>,
    hb: Tensor<B, 2>,
    hbs: Tensor<B, 2>,
    c: Tensor<B, 2>,
}

#[derive(Clone)]
struct AxisFlux<B: Backend> {
    h: Tensor<B, 2>,
    n: Tensor<B, 2>,
    t: Tensor<B, 2>,
}

impl<B: Backend> AxisFlux<B> {
    fn scaled(self, k: f64) -> Self {
        Self {
            h: self.h.mul_scalar(k),
            n: self.n.mul_scalar(k),
            t: self.t.mul_scalar(k),
        }
    }

    /// Take `other` wherever `mask` is set.
    fn select(self, mask: Tensor<B, 2, Bool>, other: Self) -> Self {
        Self {
            h: self.h.mask_where(mask.clone(), other.h),
            n: self.n.mask_where(mask.clone(), other.n),
            t: self.t.mask_where(mask, other.t),
        }
    }
}

/// Regime selection for one axis.
struct AxisRegimes<B: Backend> {
    super_pos: Tensor<B, 2, Bool>,
    super_neg: Tensor<B, 2, Bool>,
    sub_pos: Tensor<B, 2, Bool>,
    sub_neg: Tensor<B, 2, Bool>,
}

fn window<B: Backend>(t: &Tensor<B, 2>, at: (usize, usize), dims: (usize, usize)) -> Tensor<B, 2> {
    let (w, h) = dims;
    t.clone().slice([at.0..at.0 + h, at.1..at.1 + w])
}

/// `1 - m` for a 0/1 float mask.
fn not<B: Backend>(m: Tensor<B, 2>) -> Tensor<B, 2> {
    m.neg().add_scalar(1.0)
}

fn set<B: Backend>(m: Tensor<B, 2>) -> Tensor<B, 2, Bool> {
    m.greater_elem(0.5)
}

/// Regimes from the normal velocity, overridden by the dry-face policy where
/// `dry_override` is set: a dry minus face forces `SuperNeg`, a dry plus face
/// `SuperPos`, both dry means no flux, neither means `SubPos`.
fn axis_regimes<B: Backend>(
    n: &Tensor<B, 2>,
    c: &Tensor<B, 2>,
    dry_override: &Tensor<B, 2>,
    minus_dry: &Tensor<B, 2>,
    plus_dry: &Tensor<B, 2>,
) -> AxisRegimes<B> {
    let pos = n.clone().greater_equal_elem(0.0).float();
    let neg = not(pos.clone());
    let fast_pos = n.clone().greater(c.clone()).float();
    let fast_neg = n.clone().lower(c.clone().neg()).float();

    let keep = not(dry_override.clone());
    let ov = dry_override.clone();
    let m_wet = not(minus_dry.clone());
    let p_wet = not(plus_dry.clone());

    let super_pos = pos.clone().mul(fast_pos.clone()).mul(keep.clone())
        + ov.clone().mul(m_wet.clone()).mul(plus_dry.clone());
    let sub_pos = pos.mul(not(fast_pos)).mul(keep.clone()) + ov.clone().mul(m_wet).mul(p_wet);
    let super_neg = neg.clone().mul(fast_neg.clone()).mul(keep.clone())
        + ov.mul(minus_dry.clone()).mul(not(plus_dry.clone()));
    let sub_neg = neg.mul(not(fast_neg)).mul(keep);

    AxisRegimes {
        super_pos: set(super_pos),
        super_neg: set(super_neg),
        sub_pos: set(sub_pos),
        sub_neg: set(sub_neg),
    }
}

/// Upstream-only flux: `up` is the node the flow comes from, `down` the one
/// it goes to. Super-positive uses `(centre, minus)`, super-negative
/// `(plus, centre)`.
fn supercritical<B: Backend>(hg: f64, up: &Samples<B>, down: &Samples<B>) -> AxisFlux<B> {
    let mass = |s: &Samples<B>| s.h.clone().mul(s.n.clone());
    let momentum = |s: &Samples<B>| {
        s.h.clone()
            .mul(s.h.clone().mul_scalar(hg).add(s.n.clone().mul(s.n.clone())))
    };
    let bed = up
        .h
        .clone()
        .add(down.h.clone())
        .mul_scalar(hg)
        .mul(up.hb.clone().sub(down.hb.clone()));
    AxisFlux {
        h: mass(up).sub(mass(down)),
        n: momentum(up).sub(momentum(down)).sub(bed),
        t: mass(up).mul(up.t.clone()).sub(mass(down).mul(down.t.clone())),
    }
}

/// Two-sided flux. `sign = 1, minus_w = 3, plus_w = 1` is the positive
/// subcritical split, `sign = -1, minus_w = 1, plus_w = 3` the negative one.
fn subcritical<B: Backend>(
    g: f64,
    sign: f64,
    minus_w: f64,
    plus_w: f64,
    c: &Samples<B>,
    m: &Samples<B>,
    p: &Samples<B>,
) -> AxisFlux<B> {
    let two_h = c.h.clone().mul_scalar(2.0);
    let h = two_h.clone().mul(c.c.clone().add(c.n.clone().mul_scalar(sign)));
    let n = two_h
        .mul(c.c.clone().mul_scalar(2.0).add(c.n.clone().mul_scalar(sign)))
        .mul(c.n.clone());
    let t = h.clone().mul(c.t.clone());
    let h = h.sub(c.hbs.clone().mul_scalar(2.0));

    let m_mass = m.n.clone().mul_scalar(minus_w).add(m.c.clone());
    let m_mom = m
        .n
        .clone()
        .mul(m.n.clone())
        .mul_scalar(minus_w)
        .add(m.n.clone().mul(m.c.clone()).mul_scalar(2.0))
        .add(m.h.clone().mul_scalar(g));
    let h = h.sub(m.h.clone().mul(m_mass.clone())).add(m.hbs.clone());
    let n = n
        .sub(m.h.clone().mul(m_mom))
        .sub(c.h.clone().add(m.h.clone()).mul_scalar(g).mul(c.hb.clone().sub(m.hb.clone())));
    let t = t.sub(m.h.clone().mul(m_mass).mul(m.t.clone()));

    let p_mass = p.n.clone().mul_scalar(plus_w).sub(p.c.clone());
    let p_mom = p
        .n
        .clone()
        .mul(p.n.clone())
        .mul_scalar(plus_w)
        .sub(p.n.clone().mul(p.c.clone()).mul_scalar(2.0))
        .add(p.h.clone().mul_scalar(g));
    let h = h.add(p.h.clone().mul(p_mass.clone())).add(p.hbs.clone());
    let n = n
        .add(p.h.clone().mul(p_mom))
        .sub(p.h.clone().add(c.h.clone()).mul_scalar(g).mul(p.hb.clone().sub(c.hb.clone())));
    let t = t.add(p.h.clone().mul(p_mass).mul(p.t.clone()));

    AxisFlux { h, n, t }
}

/// Flux of one axis with the per-node regime applied.
fn axis_flux<B: Backend>(
    co: &Coefficients<f64>,
    k: f64,
    k_quarter: f64,
    regimes: AxisRegimes<B>,
    c: &Samples<B>,
    m: &Samples<B>,
    p: &Samples<B>,
) -> AxisFlux<B> {
    let zero = Tensor::zeros_like(&c.h);
    let none = AxisFlux {
        h: zero.clone(),
        n: zero.clone(),
        t: zero,
    };
    let super_pos = supercritical(co.half_gravity, c, m).scaled(k);
    let super_neg = supercritical(co.half_gravity, p, c).scaled(k);
    let sub_pos = subcritical(co.gravity, 1.0, 3.0, 1.0, c, m, p).scaled(k_quarter);
    let sub_neg = subcritical(co.gravity, -1.0, 1.0, 3.0, c, m, p).scaled(k_quarter);
    none.select(regimes.sub_pos, sub_pos)
        .select(regimes.sub_neg, sub_neg)
        .select(regimes.super_pos, super_pos)
        .select(regimes.super_neg, super_neg)
}

/// One explicit step of the interior of a `width x height` grid.
pub(super) fn flux_step<B: Backend>(
    co: &Coefficients<f64>,
    variant: BuildVariant,
    state: &PaddedState<B>,
    bottom: &PaddedBottom<B>,
    dims: (usize, usize),
) -> StepOutput<B> {
    let speed = state.h.clone().mul_scalar(co.gravity).sqrt();
    let at = |off: (usize, usize), normal: &Tensor<B, 2>, tangent: &Tensor<B, 2>| Samples {
        h: window(&state.h, off, dims),
        n: window(normal, off, dims),
        t: window(tangent, off, dims),
        hb: window(&bottom.height, off, dims),
        hbs: window(&bottom.precomputed, off, dims),
        c: window(&speed, off, dims),
    };

    let cx = at(CENTRE, &state.u, &state.v);
    let cy = at(CENTRE, &state.v, &state.u);

    // Dry-face policy: only for a dry cell with at least one dry face.
    let dry = |off| window(&state.h, off, dims).equal_elem(0.0).float();
    let (left_dry, right_dry, up_dry, down_dry) = (dry(LEFT), dry(RIGHT), dry(UP), dry(DOWN));
    let any_face_dry = not(not(left_dry.clone())
        .mul(not(right_dry.clone()))
        .mul(not(up_dry.clone()))
        .mul(not(down_dry.clone())));
    let dry_override = dry(CENTRE).mul(any_face_dry);

    let x_regimes = axis_regimes(&cx.n, &cx.c, &dry_override, &left_dry, &right_dry);
    let y_regimes = axis_regimes(&cy.n, &cy.c, &dry_override, &up_dry, &down_dry);

    let fx = axis_flux(
        co,
        co.k_w,
        co.k_w_quarter,
        x_regimes,
        &cx,
        &at(LEFT, &state.u, &state.v),
        &at(RIGHT, &state.u, &state.v),
    );
    let fy = axis_flux(
        co,
        co.k_h,
        co.k_h_quarter,
        y_regimes,
        &cy,
        &at(UP, &state.v, &state.u),
        &at(DOWN, &state.v, &state.u),
    );

    let flow_h = fx.h.add(fy.h);
    let flow_u = fx.n.add(fy.t);
    let flow_v = fx.t.add(fy.n);
    finalize(co, variant, cx.h, cx.n, cx.t, flow_h, flow_u, flow_v)
}

#[allow(clippy::too_many_arguments)]
fn finalize<B: Backend>(
    co: &Coefficients<f64>,
    variant: BuildVariant,
    h: Tensor<B, 2>,
    u: Tensor<B, 2>,
    v: Tensor<B, 2>,
    flow_h: Tensor<B, 2>,
    flow_u: Tensor<B, 2>,
    flow_v: Tensor<B, 2>,
) -> StepOutput<B> {
    let h_new = h.clone().sub(flow_h);
    let friction = u
        .clone()
        .mul(u.clone())
        .add(v.clone().mul(v.clone()))
        .sqrt()
        .mul_scalar(co.tau_mul_cf);
    let h_left = h.sub(friction);
    let denom = h_new.clone().clamp_min(co.h_min);

    let velocity = |vel: Tensor<B, 2>, flow: Tensor<B, 2>| {
        let num = h_left.clone().mul(vel).sub(flow);
        let raw = match variant {
            BuildVariant::Standard => num.div(denom.clone()),
            BuildVariant::Relaxed => {
                let r = num.mul(denom.clone().recip());
                let tiny = r.clone().abs().lower_elem(f32::MIN_POSITIVE as f64);
                r.mask_fill(tiny, 0.0)
            }
        };
        let slow = raw.clone().abs().lower_elem(co.min_speed);
        raw.mask_fill(slow, 0.0)
    };
    let u_new = velocity(u, flow_u);
    let v_new = velocity(v, flow_v);

    let dry = h_new.clone().lower_equal_elem(0.0);
    StepOutput {
        h: h_new.mask_fill(dry.clone(), 0.0),
        u: u_new.mask_fill(dry.clone(), 0.0),
        v: v_new.mask_fill(dry, 0.0),
    }
}

#[cfg(all(test, feature = "burn-ndarray"))]
mod tests {
    use super::*;
    use crate::solver::{CalculatorPars, GlobalParameters};
    use burn_ndarray::NdArray;

    type B = NdArray<f64>;

    fn field(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> Tensor<B, 2> {
        let data: Vec<f64> = (0..rows * cols).map(|i| f(i / cols, i % cols)).collect();
        super::super::backend::upload::<B>(&data, rows, cols, &Default::default())
    }

    #[test]
    fn test_still_water_is_fixed_point() {
        let co = Coefficients::new(
            &GlobalParameters::new(0.01, 9.81, 0.0, 0.001),
            &CalculatorPars::new(0.0, 0.01).unwrap(),
            1.0,
            1.0,
        );
        let state = PaddedState {
            h: field(5, 6, |_, _| 1.0),
            u: field(5, 6, |_, _| 0.0),
            v: field(5, 6, |_, _| 0.0),
        };
        let bottom = PaddedBottom {
            height: field(5, 6, |_, _| 0.0),
            precomputed: field(5, 6, |_, _| 0.0),
        };
        let out = flux_step(&co, BuildVariant::Standard, &state, &bottom, (4, 3));
        assert_eq!(out.h.dims(), [3, 4]);
        let h = super::super::backend::download(out.h).unwrap();
        assert!(h.iter().all(|&x| (x - 1.0).abs() < 1e-12));
    }
}
