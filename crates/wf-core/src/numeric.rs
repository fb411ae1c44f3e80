use crate::WfError;

/// Depth resolution below which two measured depths are the same point (m).
pub const MD_EPS: f64 = 1e-9;

/// Volume resolution below which a parcel is considered empty (m³).
pub const VOLUME_EPS: f64 = 1e-12;

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, WfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(WfError::NonFinite { what, value: v })
    }
}

/// Find `x` in `[lo, hi]` with `f(x) == 0` for a monotonic `f`.
///
/// Stops once the bracket is narrower than `x_tol` or after `max_iter` halvings.
/// Endpoints that already satisfy `f == 0` are returned directly.
pub fn bisect<F>(
    mut f: F,
    mut lo: f64,
    mut hi: f64,
    x_tol: f64,
    max_iter: usize,
    what: &'static str,
) -> Result<f64, WfError>
where
    F: FnMut(f64) -> f64,
{
    let mut f_lo = ensure_finite(f(lo), what)?;
    let f_hi = ensure_finite(f(hi), what)?;
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(WfError::NoBracket { what });
    }

    for _ in 0..max_iter {
        if (hi - lo).abs() <= x_tol {
            break;
        }
        let mid = 0.5 * (lo + hi);
        let f_mid = ensure_finite(f(mid), what)?;
        if f_mid == 0.0 {
            return Ok(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn bisect_inverts_linear_ramp(slope in 0.1_f64..100.0, target in 0.0_f64..1.0) {
            let x = bisect(|x| slope * x - slope * target, 0.0, 1.0, 1e-12, 200, "ramp").unwrap();
            prop_assert!((x - target).abs() < 1e-9);
        }
    }
}
