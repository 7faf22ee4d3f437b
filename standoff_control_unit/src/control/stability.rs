//! Jury stability criterion for discrete-time characteristic polynomials.
//!
//! Decides whether every root of `P(z)` lies strictly inside the unit circle
//! using only the coefficients. No root finding.

/// True when all roots of `poly` (coefficients highest power first) lie
/// strictly inside the unit circle.
///
/// Leading zeros are ignored. A polynomial with non-finite coefficients or
/// no non-zero coefficient is reported unstable.
pub fn jury_stable(poly: &[f64]) -> bool {
    let trimmed: Vec<f64> = poly.iter().copied().skip_while(|c| *c == 0.0).collect();
    if trimmed.is_empty() || trimmed.iter().any(|c| !c.is_finite()) {
        return false;
    }
    let n = trimmed.len() - 1;
    if n == 0 {
        return true;
    }

    // Normalize to a positive leading coefficient.
    let sign = trimmed[0].signum();
    let p: Vec<f64> = trimmed.iter().map(|c| c * sign).collect();

    let at_one: f64 = p.iter().sum();
    if at_one <= 0.0 {
        return false;
    }
    let at_minus_one: f64 = p
        .iter()
        .enumerate()
        .map(|(i, c)| if (n - i) % 2 == 0 { *c } else { -*c })
        .sum();
    let signed = if n % 2 == 0 { at_minus_one } else { -at_minus_one };
    if signed <= 0.0 {
        return false;
    }

    // Jury table rows, constant term first.
    let mut row: Vec<f64> = p.iter().rev().copied().collect();
    if row[0].abs() >= row[n] {
        return false;
    }
    while row.len() > 3 {
        let m = row.len() - 1;
        row = (0..m).map(|k| row[0] * row[k] - row[m] * row[m - k]).collect();
        let last = row.len() - 1;
        if row[0].abs() <= row[last].abs() {
            return false;
        }
    }
    true
}
