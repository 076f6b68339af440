//! An immutable integer vector viewed cyclically.
//!
//! Unifies the two divergent `Cyclic`/`cyclic` implementations found in the
//! original source (`sdfpy/cyclic.py` and `sdfpy/core.py`) into the single
//! behavior documented in the spec: indices wrap modulo the vector's
//! length, and windows (`slice`/`sum`) interpret `start`/`stop`/`step` as an
//! ordered view into the infinite periodic extension of the vector.

use crate::integers::gcd;

/// An immutable cyclically-indexed sequence of integers, with a cached
/// full-period sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicVector {
    data: Vec<i64>,
    total_sum: i64,
}

/// The result of [`CyclicVector::slice`]: either a finite ordered window
/// (when a `stop` was given) or a new cyclic pattern (when `stop` was
/// `None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CyclicSlice {
    /// A finite, ordered list of values.
    Window(Vec<i64>),
    /// A new cyclic vector formed from one period of the requested stride.
    Pattern(CyclicVector),
}

/// Floor division, matching Python's `//` for a positive divisor.
fn fdiv(a: i64, b: i64) -> i64 {
    a.div_euclid(b)
}

/// Non-negative modulus, matching Python's `%` for a positive divisor.
fn fmod(a: i64, b: i64) -> i64 {
    a.rem_euclid(b)
}

impl CyclicVector {
    /// Builds a new cyclic vector. Panics if `data` is empty — every
    /// `CyclicVector` in this crate (`wcet`, `production`, `consumption`)
    /// carries the invariant `length >= 1`.
    pub fn new(data: Vec<i64>) -> Self {
        assert!(!data.is_empty(), "CyclicVector must have length >= 1");
        let total_sum = data.iter().sum();
        CyclicVector { data, total_sum }
    }

    /// A single-valued cyclic vector (a constant-rate channel or actor).
    pub fn constant(value: i64) -> Self {
        CyclicVector::new(vec![value])
    }

    /// The vector's period length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The sum of one full period.
    pub fn full_sum(&self) -> i64 {
        self.total_sum
    }

    /// The raw, in-order entries of one period.
    pub fn as_slice(&self) -> &[i64] {
        &self.data
    }

    /// The element at index `i`, taken modulo the vector's length.
    pub fn at(&self, i: i64) -> i64 {
        let len = self.data.len() as i64;
        self.data[fmod(i, len) as usize]
    }

    /// `values[(start + k*step) mod L]` for `k = 0, 1, ...` until the
    /// window defined by `stop` is exhausted, or — if `stop` is `None` — a
    /// new cyclic vector of length `L / gcd(step, L)` covering one period
    /// of the requested stride.
    ///
    /// `step` must be strictly positive.
    pub fn slice(&self, start: i64, stop: Option<i64>, step: i64) -> CyclicSlice {
        assert!(step > 0, "CyclicVector::slice requires a positive step");
        let len = self.data.len() as i64;
        let period = len / gcd(step, len);

        let mut pattern = Vec::with_capacity(period as usize);
        for i in 0..period {
            pattern.push(self.at(start + i * step));
        }

        match stop {
            None => CyclicSlice::Pattern(CyclicVector::new(pattern)),
            Some(stop) => {
                let result_len = (1 + fdiv(stop - start - 1, step)).max(0) as usize;
                let period = period as usize;
                let num_periods = result_len / period;
                let mod_periods = result_len % period;
                let mut out = Vec::with_capacity(result_len);
                for _ in 0..num_periods {
                    out.extend_from_slice(&pattern);
                }
                out.extend_from_slice(&pattern[..mod_periods]);
                CyclicSlice::Window(out)
            }
        }
    }

    /// The exact sum of the window `[start, stop)` with the given `step`
    /// (`stop = None` means "through one full period starting at `start`",
    /// i.e. `stop = len`). Computed in `O(period)` by summing one period's
    /// pattern once and multiplying, as required by the spec.
    ///
    /// `step` must be strictly positive.
    pub fn sum(&self, start: i64, stop: Option<i64>, step: i64) -> i64 {
        assert!(step > 0, "CyclicVector::sum requires a positive step");
        let len = self.data.len() as i64;
        let start_mod = fmod(start, len);
        let g = gcd(step, len);
        let period = len / g;

        let (pattern, psum): (Vec<i64>, i64) = if start_mod != 0 || step != 1 {
            let mut pattern = Vec::with_capacity(period as usize);
            let mut psum = 0;
            for i in 0..period {
                let e = self.at(start + i * step);
                psum += e;
                pattern.push(e);
            }
            (pattern, psum)
        } else {
            (self.data.clone(), self.total_sum)
        };

        let stop = stop.unwrap_or(len);
        let result_len = (1 + fdiv(stop - start - 1, step)).max(0);
        let period = period;
        let num_periods = result_len / period;
        let mod_periods = (result_len % period) as usize;

        num_periods * psum + pattern[..mod_periods].iter().sum::<i64>()
    }
}
