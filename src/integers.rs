//! Scalar and iterable gcd/lcm, extended Euclid, modular inverse, and CRT.
//!
//! These are the number-theoretic primitives the rest of the crate builds
//! on: repetition-vector integralisation needs `lcm` over an iterable of
//! denominators, [`CyclicVector`](crate::cyclic::CyclicVector) windows need
//! `gcd` against the vector length, and the MCR engine's ratio bookkeeping
//! occasionally needs `xgcd` for unfolding (see [`crate::transform::unfold`]).

use num_integer::Integer;

/// Greatest common divisor. `gcd(0, 0) == 0`, matching `num_integer`.
pub fn gcd(a: i64, b: i64) -> i64 {
    a.gcd(&b)
}

/// Least common multiple. `lcm(0, n) == 0`.
pub fn lcm(a: i64, b: i64) -> i64 {
    a.lcm(&b)
}

/// `gcd` folded over an iterable; `gcd([]) == 0`.
pub fn gcd_many<I: IntoIterator<Item = i64>>(values: I) -> i64 {
    values.into_iter().fold(0, |acc, v| gcd(acc, v))
}

/// `lcm` folded over an iterable; `lcm([]) == 1` (the multiplicative
/// identity, so an empty set of constraints imposes no modulus).
pub fn lcm_many<I: IntoIterator<Item = i64>>(values: I) -> i64 {
    values.into_iter().fold(1, |acc, v| lcm(acc, v))
}

/// Returns `(g, x, y)` with `a*x + b*y == g == gcd(a, b)`.
///
/// Grounded on `sdfpy/integers.py::xgcd`.
pub fn extended_gcd(a: i64, b: i64) -> (i64, i64, i64) {
    let (mut old_r, mut r) = (a, b);
    let (mut old_s, mut s) = (1i64, 0i64);
    let (mut old_t, mut t) = (0i64, 1i64);

    while r != 0 {
        let q = old_r.div_euclid(r);
        let (new_r, new_s, new_t) = (old_r - q * r, old_s - q * s, old_t - q * t);
        old_r = r;
        r = new_r;
        old_s = s;
        s = new_s;
        old_t = t;
        t = new_t;
    }

    (old_r, old_s, old_t)
}

/// The inverse of `a` modulo `m`, or `None` if `gcd(a, m) != 1`.
///
/// Grounded on `sdfpy/integers.py::modinv`.
pub fn mod_inverse(a: i64, m: i64) -> Option<i64> {
    let (g, x, _) = extended_gcd(a, m);
    if g != 1 {
        None
    } else {
        Some(x.rem_euclid(m))
    }
}

/// Chinese Remainder Theorem over a list of `(residue, modulus)` pairs.
///
/// Returns `Some((x, modulus))` with `x` the unique solution modulo the lcm
/// of the input moduli, or `None` if the residues are pairwise
/// inconsistent. Moduli need not be coprime.
pub fn crt(congruences: &[(i64, i64)]) -> Option<(i64, i64)> {
    let mut iter = congruences.iter().copied();
    let (mut x, mut m) = iter.next()?;
    x = x.rem_euclid(m);

    for (xi, mi) in iter {
        let xi = xi.rem_euclid(mi);
        let (g, p, q) = extended_gcd(m, mi);
        if (xi - x) % g != 0 {
            return None;
        }
        let lcm_m = lcm(m, mi);
        let diff = (xi - x) / g;
        x = (x + m * p * diff).rem_euclid(lcm_m);
        m = lcm_m;
    }

    Some((x, m))
}
