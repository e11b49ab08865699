//! Lane abstraction shared by the scalar and batched calculators.
//!
//! The flux formulas are written once, generic over [`Real`]. `f64` is the
//! one-lane instance; [`F64x4`] holds four horizontally adjacent cells and
//! runs its arithmetic through a `pulp` SIMD token picked at runtime by
//! [`pulp::Arch`]. Only correctly rounded lane operations are used (add, sub,
//! mul, div, max and no `mul_add`), so a batch lane produces exactly the bits
//! the scalar path produces for that cell, whatever the instruction set.

use std::ops::{Add, Div, Mul, Neg, Sub};

use pulp::Simd;

use crate::types::FieldLine;

/// Number of cells processed together by the batch calculator.
pub const LANES: usize = 4;

/// Arithmetic needed by the flux formulas.
pub trait Real:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    type Mask: Copy;
    /// Token needed to build a value: `()` for `f64`, the SIMD token for lanes.
    type Arch: Copy;

    fn splat(arch: Self::Arch, v: f64) -> Self;
    fn arch(self) -> Self::Arch;
    fn sqrt(self) -> Self;
    fn abs(self) -> Self;
    /// `f64::max` lane-wise.
    fn max(self, other: Self) -> Self;
    fn gt(self, other: Self) -> Self::Mask;
    fn ge(self, other: Self) -> Self::Mask;
    /// `a` where `mask` is set, `b` elsewhere.
    fn select(mask: Self::Mask, a: Self, b: Self) -> Self;
    /// Load the value(s) starting at offset `dx` of `line`.
    fn load(arch: Self::Arch, line: &FieldLine<'_>, dx: isize) -> Self;
    /// Store the value(s) into `out` starting at index `at`.
    fn store(self, out: &mut [f64], at: usize);

    /// Same lane type with every lane set to `v`.
    #[inline(always)]
    fn broadcast(self, v: f64) -> Self {
        Self::splat(self.arch(), v)
    }
}

impl Real for f64 {
    type Mask = bool;
    type Arch = ();

    #[inline(always)]
    fn splat(_: (), v: f64) -> Self {
        v
    }
    #[inline(always)]
    fn arch(self) {}
    #[inline(always)]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
    #[inline(always)]
    fn abs(self) -> Self {
        f64::abs(self)
    }
    #[inline(always)]
    fn max(self, other: Self) -> Self {
        f64::max(self, other)
    }
    #[inline(always)]
    fn gt(self, other: Self) -> bool {
        self > other
    }
    #[inline(always)]
    fn ge(self, other: Self) -> bool {
        self >= other
    }
    #[inline(always)]
    fn select(mask: bool, a: Self, b: Self) -> Self {
        if mask { a } else { b }
    }
    #[inline(always)]
    fn load(_: (), line: &FieldLine<'_>, dx: isize) -> Self {
        line.at(dx)
    }
    #[inline(always)]
    fn store(self, out: &mut [f64], at: usize) {
        out[at] = self;
    }
}

/// Four `f64` lanes computed with the SIMD token `S`.
///
/// The lanes are split into `S`-wide vectors plus a scalar remainder, so the
/// type stays four cells wide on every instruction set.
#[derive(Clone, Copy, Debug)]
pub struct F64x4<S> {
    simd: S,
    lanes: [f64; LANES],
}

/// Per-lane result of an [`F64x4`] comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mask4(pub [bool; LANES]);

impl<S: Simd> F64x4<S> {
    #[inline(always)]
    pub fn new(simd: S, lanes: [f64; LANES]) -> Self {
        Self { simd, lanes }
    }

    #[inline(always)]
    pub fn to_array(self) -> [f64; LANES] {
        self.lanes
    }

    #[inline(always)]
    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(self.simd, self.lanes.map(f))
    }

    #[inline(always)]
    fn zip(
        self,
        rhs: Self,
        vector: impl Fn(S, S::f64s, S::f64s) -> S::f64s,
        scalar: impl Fn(f64, f64) -> f64,
    ) -> Self {
        let mut out = self.lanes;
        let (out_head, out_tail) = S::f64s_as_mut_simd(&mut out);
        let (rhs_head, rhs_tail) = S::f64s_as_simd(&rhs.lanes);
        for (o, r) in out_head.iter_mut().zip(rhs_head) {
            *o = vector(self.simd, *o, *r);
        }
        for (o, r) in out_tail.iter_mut().zip(rhs_tail) {
            *o = scalar(*o, *r);
        }
        Self::new(self.simd, out)
    }

    #[inline(always)]
    fn cmp(self, rhs: Self, f: impl Fn(f64, f64) -> bool) -> Mask4 {
        Mask4(std::array::from_fn(|i| f(self.lanes[i], rhs.lanes[i])))
    }
}

macro_rules! lanewise_op {
    ($tr:ident, $method:ident, $simd_op:ident, $op:tt) => {
        impl<S: Simd> $tr for F64x4<S> {
            type Output = Self;
            #[inline(always)]
            fn $method(self, rhs: Self) -> Self {
                self.zip(rhs, |s, a, b| s.$simd_op(a, b), |a, b| a $op b)
            }
        }
    };
}

lanewise_op!(Add, add, f64s_add, +);
lanewise_op!(Sub, sub, f64s_sub, -);
lanewise_op!(Mul, mul, f64s_mul, *);
lanewise_op!(Div, div, f64s_div, /);

impl<S: Simd> Neg for F64x4<S> {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

impl<S: Simd> Real for F64x4<S> {
    type Mask = Mask4;
    type Arch = S;

    #[inline(always)]
    fn splat(simd: S, v: f64) -> Self {
        Self::new(simd, [v; LANES])
    }
    #[inline(always)]
    fn arch(self) -> S {
        self.simd
    }
    // IEEE square root is correctly rounded, lane by lane it equals the
    // vector instruction.
    #[inline(always)]
    fn sqrt(self) -> Self {
        self.map(f64::sqrt)
    }
    #[inline(always)]
    fn abs(self) -> Self {
        self.map(f64::abs)
    }
    #[inline(always)]
    fn max(self, other: Self) -> Self {
        self.zip(other, |s, a, b| s.f64s_max(a, b), f64::max)
    }
    #[inline(always)]
    fn gt(self, other: Self) -> Mask4 {
        self.cmp(other, |a, b| a > b)
    }
    #[inline(always)]
    fn ge(self, other: Self) -> Mask4 {
        self.cmp(other, |a, b| a >= b)
    }
    #[inline(always)]
    fn select(mask: Mask4, a: Self, b: Self) -> Self {
        Self::new(
            a.simd,
            std::array::from_fn(|i| if mask.0[i] { a.lanes[i] } else { b.lanes[i] }),
        )
    }
    #[inline(always)]
    fn load(simd: S, line: &FieldLine<'_>, dx: isize) -> Self {
        Self::new(simd, line.at4(dx))
    }
    #[inline(always)]
    fn store(self, out: &mut [f64], at: usize) {
        out[at..at + LANES].copy_from_slice(&self.lanes);
    }
}
