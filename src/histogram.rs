/// Fixed-range histogram rendered as text, one line per bin.
///
/// Matches the occupancy plot of the analysis: values binned over a fixed
/// range (0..100 for percentages), values outside the range are dropped,
/// and a value equal to the upper bound lands in the last bin.
#[derive(Debug, Clone)]
pub struct Histogram {
    lo: f64,
    hi: f64,
    counts: Vec<usize>,
}

impl Histogram {
    pub fn from_values(values: &[f64], bins: usize, lo: f64, hi: f64) -> Result<Self, String> {
        if bins == 0 {
            return Err("Histogram must have at least one bin".to_string());
        }
        if !(hi > lo) {
            return Err(format!("Invalid histogram range [{}, {}]", lo, hi));
        }

        let mut counts = vec![0usize; bins];
        let width = (hi - lo) / bins as f64;

        for &value in values {
            if value < lo || value > hi {
                continue;
            }
            let bin = (((value - lo) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Ok(Self { lo, hi, counts })
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Render the histogram with bars scaled to `max_width` characters
    pub fn render(&self, max_width: usize) -> String {
        let max_count = self.counts.iter().copied().max().unwrap_or(0);
        let width = (self.hi - self.lo) / self.bins() as f64;

        let mut out = String::new();
        for (i, &count) in self.counts.iter().enumerate() {
            let bin_lo = self.lo + i as f64 * width;
            let bin_hi = bin_lo + width;
            let bar_len = if max_count > 0 {
                (count * max_width + max_count - 1) / max_count
            } else {
                0
            };
            out.push_str(&format!(
                "{:>6.1} - {:>6.1} | {:<width$} {}\n",
                bin_lo,
                bin_hi,
                "#".repeat(bar_len),
                count,
                width = max_width
            ));
        }
        out
    }
}
