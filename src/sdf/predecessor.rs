//! The predecessor function: for a channel with given production and
//! consumption rate patterns and an initial token count, the index of the
//! latest producing firing that must have completed before consuming
//! firing `k` is enabled.
//!
//! Grounded on `sdfpy/core.py::SDFGraph.__predecessor_fun` (the exact,
//! closed-form function, used by [`crate::schedule::strictly_periodic_schedule`])
//! and `sdfpy/transform.py::predecessor_lin_bounds` (a pessimistic/optimistic
//! linear envelope around it, used by
//! [`crate::transform::single_rate_apx`]).

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::cyclic::CyclicVector;
use crate::integers::gcd;

fn div_floor(a: i64, b: i64) -> i64 {
    a.div_euclid(b)
}

/// The exact predecessor function for firing `k` of the consuming actor.
///
/// Three closed forms, matching the three rate shapes the original
/// distinguishes: non-constant production, constant production with
/// non-constant consumption, and constant/constant.
pub fn predecessor(production: &CyclicVector, consumption: &CyclicVector, tokens: i64, k: i64) -> i64 {
    let p_len = production.len() as i64;
    let c_len = consumption.len() as i64;
    let p_sum = production.full_sum();

    if p_len > 1 {
        (0..p_len)
            .map(|i| {
                let num = consumption.sum(0, Some(k), 1) - 1 - tokens - production.sum(0, Some(i), 1);
                div_floor(num, p_sum) * p_len + i + 1
            })
            .max()
            .expect("production has at least one phase")
    } else if c_len > 1 {
        let num = consumption.sum(0, Some(k), 1) - 1 - tokens;
        div_floor(num, p_sum) + 1
    } else {
        let crate_ = consumption.at(0);
        let prate = production.at(0);
        div_floor(k * crate_ - 1 - tokens, prate) + 1
    }
}

/// A pessimistic upper bound and optimistic lower bound on the predecessor
/// function's growth rate, expressed as the `(max, min)` linear offsets
/// used when constructing a single-rate approximation of a channel.
///
/// Grounded on `sdfpy/transform.py::predecessor_lin_bounds`.
pub fn predecessor_lin_bounds(
    production: &CyclicVector,
    consumption: &CyclicVector,
    tokens: i64,
) -> (BigRational, BigRational) {
    let p_len = production.len() as i64;
    let c_len = consumption.len() as i64;
    let g = gcd(production.full_sum(), consumption.full_sum());
    let avg_prate = BigRational::new(BigInt::from(production.full_sum()), BigInt::from(p_len));
    let avg_crate = BigRational::new(BigInt::from(consumption.full_sum()), BigInt::from(c_len));

    let mut delta = tokens;
    let mut minval: Option<BigRational> = None;
    let mut maxval: Option<BigRational> = None;

    for i in 0..p_len {
        for j in 0..c_len {
            let floored = BigRational::from_integer(BigInt::from(g * div_floor(delta, g)));
            let val = floored - BigRational::from_integer(BigInt::from(i)) * &avg_prate
                + BigRational::from_integer(BigInt::from(j)) * &avg_crate;
            minval = Some(match minval {
                None => val.clone(),
                Some(m) => m.min(val.clone()),
            });
            maxval = Some(match maxval {
                None => val.clone(),
                Some(m) => m.max(val),
            });
            delta -= consumption.at(j);
        }
        delta += production.at(i) + consumption.full_sum();
    }

    let maxval = maxval.expect("production has at least one phase");
    let minval = minval.expect("production has at least one phase");
    (maxval, minval + BigRational::from_integer(BigInt::from(g)) - avg_prate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_rate_predecessor_matches_closed_form() {
        let production = CyclicVector::constant(1);
        let consumption = CyclicVector::constant(1);
        // with 1 token already present, firing 1 can fire before any producer
        assert_eq!(predecessor(&production, &consumption, 1, 1), 0);
        assert_eq!(predecessor(&production, &consumption, 0, 1), 1);
    }

    #[test]
    fn predecessor_is_monotone_in_k() {
        let production = CyclicVector::new(vec![2, 1]);
        let consumption = CyclicVector::constant(1);
        let mut prev = predecessor(&production, &consumption, 0, 1);
        for k in 2..10 {
            let cur = predecessor(&production, &consumption, 0, k);
            assert!(cur >= prev);
            prev = cur;
        }
    }

    #[test]
    fn lin_bounds_are_deterministic() {
        let production = CyclicVector::new(vec![2, 1]);
        let consumption = CyclicVector::new(vec![1, 1, 1]);
        let a = predecessor_lin_bounds(&production, &consumption, 0);
        let b = predecessor_lin_bounds(&production, &consumption, 0);
        assert_eq!(a, b);
    }
}
