/// Year-over-year deltas derived from an aggregated series. Both sequences
/// are aligned index-for-index with the current-year list they were built
/// from.
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub absolute: Vec<f64>,
    pub relative: Vec<f64>,
}

/// Computes absolute and relative (%) variation for each year in
/// `current_years`. `series` and `years` share the same descending
/// chronological order, so the previous year sits one index to the right.
///
/// A year with no predecessor in the window yields 0.0 for both deltas, and
/// a zero previous value yields a relative delta of exactly 0.0 rather than
/// an error or infinity.
pub fn year_over_year(series: &[f64], years: &[i32], current_years: &[i32]) -> Variation {
    let mut absolute = Vec::with_capacity(current_years.len());
    let mut relative = Vec::with_capacity(current_years.len());

    for year in current_years {
        let idx = years.iter().position(|y| y == year);
        let (abs, rel) = match idx {
            Some(idx) if idx + 1 < series.len() => {
                let current = series[idx];
                let previous = series[idx + 1];
                let abs = current - previous;
                let rel = if previous != 0.0 {
                    abs / previous * 100.0
                } else {
                    0.0
                };
                (abs, rel)
            }
            _ => (0.0, 0.0),
        };
        absolute.push(abs);
        relative.push(rel);
    }

    Variation { absolute, relative }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VARIATION_YEARS, YEARS};

    #[test]
    fn single_year_variation() {
        let series = [100.0, 90.0, 80.0, 70.0, 60.0, 50.0, 40.0, 30.0];
        let v = year_over_year(&series, &YEARS, &[2017]);
        assert_eq!(v.absolute, vec![10.0]);
        assert!((v.relative[0] - 100.0 / 9.0).abs() < 1e-9); // 10/90*100
    }

    #[test]
    fn full_variation_window() {
        let series = [100.0, 90.0, 80.0, 70.0, 60.0, 50.0, 40.0, 30.0];
        let v = year_over_year(&series, &YEARS, &VARIATION_YEARS);
        assert_eq!(v.absolute, vec![10.0; 7]);
        // relative deltas shrink as the base grows
        assert!(v.relative[0] < v.relative[6]);
    }

    #[test]
    fn zero_previous_value_yields_zero_relative() {
        let series = [100.0, 0.0, 80.0, 70.0, 60.0, 50.0, 40.0, 30.0];
        let v = year_over_year(&series, &YEARS, &[2017]);
        assert_eq!(v.absolute, vec![100.0]);
        assert_eq!(v.relative, vec![0.0]);
    }

    #[test]
    fn earliest_year_has_no_predecessor() {
        let series = [100.0, 90.0, 80.0, 70.0, 60.0, 50.0, 40.0, 30.0];
        let v = year_over_year(&series, &YEARS, &[2010]);
        assert_eq!(v.absolute, vec![0.0]);
        assert_eq!(v.relative, vec![0.0]);
    }

    #[test]
    fn unknown_year_yields_zeros() {
        let series = [1.0; 8];
        let v = year_over_year(&series, &YEARS, &[1999]);
        assert_eq!(v.absolute, vec![0.0]);
        assert_eq!(v.relative, vec![0.0]);
    }
}
