//! Public histogram type returned by `RootFile::get_histogram`, plus the
//! `TH1` arithmetic used for normalized comparisons.
//!
//! All operations return new histograms; nothing mutates a value that was
//! read from a file.

use crate::error::{Result, RootError};

/// A 1D histogram extracted from a ROOT file.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// X-axis title (`fXaxis.fTitle`), empty when unset.
    pub x_title: String,
    /// Number of bins (excluding under/overflow).
    pub n_bins: usize,
    /// Lower edge of first bin.
    pub x_min: f64,
    /// Upper edge of last bin.
    pub x_max: f64,
    /// Bin edges (length = n_bins + 1).
    pub bin_edges: Vec<f64>,
    /// Bin contents (length = n_bins, excluding under/overflow).
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin (for statistical errors), if stored.
    pub sumw2: Option<Vec<f64>>,
    /// Number of entries as recorded by ROOT (`fEntries`).
    pub entries: f64,
}

/// A 1D histogram plus explicit underflow/overflow bin values.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramWithFlows {
    /// Main histogram (excluding under/overflow).
    pub histogram: Histogram,
    /// Underflow bin content.
    pub underflow: f64,
    /// Overflow bin content.
    pub overflow: f64,
    /// Underflow sumw2, if stored.
    pub underflow_sumw2: Option<f64>,
    /// Overflow sumw2, if stored.
    pub overflow_sumw2: Option<f64>,
}

impl Histogram {
    /// Sum of in-range bin contents (`TH1::Integral()`; under/overflow excluded).
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }

    /// Per-bin statistical error: `sqrt(sumw2)` when stored, else `sqrt(|content|)`.
    pub fn errors(&self) -> Vec<f64> {
        match &self.sumw2 {
            Some(sw2) => sw2.iter().map(|v| v.max(0.0).sqrt()).collect(),
            None => self.bin_content.iter().map(|c| c.abs().sqrt()).collect(),
        }
    }

    /// Bin centers.
    pub fn bin_centers(&self) -> Vec<f64> {
        self.bin_edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Multiply every bin by `factor` (`TH1::Scale`).
    ///
    /// Errors scale with the contents: sumw2 is multiplied by `factor²`,
    /// and is first seeded from `|content|` when the histogram has none.
    pub fn scaled(&self, factor: f64) -> Histogram {
        let sumw2 = self
            .sumw2
            .clone()
            .unwrap_or_else(|| self.bin_content.iter().map(|c| c.abs()).collect());
        Histogram {
            bin_content: self.bin_content.iter().map(|c| c * factor).collect(),
            sumw2: Some(sumw2.iter().map(|w| w * factor * factor).collect()),
            ..self.clone()
        }
    }

    /// Scale to unit integral.
    ///
    /// Fails with [`RootError::ZeroIntegral`] when the integral is zero or not finite.
    pub fn normalized(&self) -> Result<Histogram> {
        let integral = self.usable_integral()?;
        Ok(self.scaled(1.0 / integral))
    }

    /// Bin-by-bin ratio `self / denominator` (`TH1::Divide` without options).
    ///
    /// Errors are propagated as uncorrelated:
    /// `e² = (e1²·c2² + e2²·c1²) / c2⁴`. Bins with a zero denominator get
    /// content 0 and error 0.
    pub fn divide(&self, denominator: &Histogram) -> Result<Histogram> {
        self.check_compatible(denominator)?;

        let e1 = self.errors();
        let e2 = denominator.errors();
        let mut content = Vec::with_capacity(self.n_bins);
        let mut sumw2 = Vec::with_capacity(self.n_bins);
        for i in 0..self.n_bins {
            let c1 = self.bin_content[i];
            let c2 = denominator.bin_content[i];
            if c2 == 0.0 {
                content.push(0.0);
                sumw2.push(0.0);
                continue;
            }
            let c2sq = c2 * c2;
            content.push(c1 / c2);
            sumw2.push((e1[i] * e1[i] * c2sq + e2[i] * e2[i] * c1 * c1) / (c2sq * c2sq));
        }

        Ok(Histogram {
            name: format!("{}_over_{}", self.name, denominator.name),
            title: self.title.clone(),
            bin_content: content,
            sumw2: Some(sumw2),
            ..self.clone()
        })
    }

    /// Ensure `other` has the same number of bins and the same edges.
    pub fn check_compatible(&self, other: &Histogram) -> Result<()> {
        let mismatch = |detail: String| RootError::BinningMismatch {
            left: self.name.clone(),
            right: other.name.clone(),
            detail,
        };
        if self.n_bins != other.n_bins {
            return Err(mismatch(format!("{} vs {} bins", self.n_bins, other.n_bins)));
        }
        for (i, (a, b)) in self.bin_edges.iter().zip(&other.bin_edges).enumerate() {
            let tol = 1e-9 * a.abs().max(b.abs()).max(1.0);
            if (a - b).abs() > tol {
                return Err(mismatch(format!("edge {i} differs: {a} vs {b}")));
            }
        }
        Ok(())
    }

    fn usable_integral(&self) -> Result<f64> {
        let integral = self.integral();
        if integral == 0.0 || !integral.is_finite() {
            return Err(RootError::ZeroIntegral { name: self.name.clone(), integral });
        }
        Ok(integral)
    }
}

/// Scale ratio of two histograms: `compared.integral() / reference.integral()`,
/// taken on the raw (pre-normalization) integrals.
pub fn kappa(reference: &Histogram, compared: &Histogram) -> Result<f64> {
    let denominator = reference.usable_integral()?;
    Ok(compared.integral() / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hist(name: &str, content: Vec<f64>) -> Histogram {
        let n = content.len();
        Histogram {
            name: name.into(),
            title: String::new(),
            x_title: String::new(),
            n_bins: n,
            x_min: 0.0,
            x_max: n as f64,
            bin_edges: (0..=n).map(|i| i as f64).collect(),
            bin_content: content,
            sumw2: None,
            entries: 0.0,
        }
    }

    #[test]
    fn integral_excludes_nothing_in_range() {
        assert_relative_eq!(hist("a", vec![1.0, 2.5, 6.5]).integral(), 10.0);
    }

    #[test]
    fn kappa_uses_raw_integrals() {
        let truth = hist("truth", vec![4.0, 6.0]);
        let method = hist("method", vec![0.5, 1.5]);
        assert_relative_eq!(kappa(&truth, &method).unwrap(), 0.2);
    }

    #[test]
    fn kappa_rejects_zero_reference() {
        let truth = hist("truth", vec![0.0, 0.0]);
        let method = hist("method", vec![1.0, 1.0]);
        match kappa(&truth, &method) {
            Err(RootError::ZeroIntegral { name, .. }) => assert_eq!(name, "truth"),
            other => panic!("expected ZeroIntegral, got {other:?}"),
        }
    }

    #[test]
    fn normalized_has_unit_integral_and_leaves_source_untouched() {
        let h = hist("h", vec![2.0, 6.0, 2.0]);
        let n = h.normalized().unwrap();
        assert_relative_eq!(n.integral(), 1.0);
        assert_eq!(h.bin_content, vec![2.0, 6.0, 2.0]);
        assert!(h.sumw2.is_none());
    }

    #[test]
    fn normalized_rejects_zero_and_nan_integrals() {
        assert!(matches!(
            hist("z", vec![0.0, 0.0]).normalized(),
            Err(RootError::ZeroIntegral { .. })
        ));
        assert!(matches!(
            hist("c", vec![1.0, -1.0]).normalized(),
            Err(RootError::ZeroIntegral { .. })
        ));
        assert!(matches!(
            hist("n", vec![f64::NAN]).normalized(),
            Err(RootError::ZeroIntegral { .. })
        ));
    }

    #[test]
    fn scaled_seeds_sumw2_from_contents() {
        let s = hist("h", vec![4.0, 9.0]).scaled(0.5);
        assert_eq!(s.bin_content, vec![2.0, 4.5]);
        assert_eq!(s.sumw2, Some(vec![1.0, 2.25]));
        assert_relative_eq!(s.errors()[0], 1.0);
        assert_relative_eq!(s.errors()[1], 1.5);
    }

    #[test]
    fn scaled_keeps_existing_sumw2() {
        let mut h = hist("h", vec![4.0]);
        h.sumw2 = Some(vec![16.0]);
        assert_eq!(h.scaled(2.0).sumw2, Some(vec![64.0]));
    }

    #[test]
    fn divide_propagates_uncorrelated_errors() {
        let num = hist("num", vec![4.0, 1.0]);
        let den = hist("den", vec![2.0, 0.0]);
        let r = num.divide(&den).unwrap();

        assert_relative_eq!(r.bin_content[0], 2.0);
        // e1² = 4, e2² = 2: (4·4 + 2·16) / 16 = 3
        assert_relative_eq!(r.sumw2.as_ref().unwrap()[0], 3.0);
        assert_eq!(r.bin_content[1], 0.0);
        assert_eq!(r.errors()[1], 0.0);
        assert_eq!(r.name, "num_over_den");
    }

    #[test]
    fn divide_rejects_mismatched_binning() {
        let a = hist("a", vec![1.0, 2.0]);
        let b = hist("b", vec![1.0, 2.0, 3.0]);
        assert!(matches!(a.divide(&b), Err(RootError::BinningMismatch { .. })));

        let mut c = hist("c", vec![1.0, 2.0]);
        c.bin_edges[1] = 1.5;
        let err = a.divide(&c).unwrap_err();
        assert!(err.to_string().contains("edge 1"));
    }

    #[test]
    fn centers_are_bin_midpoints() {
        assert_eq!(hist("h", vec![0.0, 0.0]).bin_centers(), vec![0.5, 1.5]);
    }
}
