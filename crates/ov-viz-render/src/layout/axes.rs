/// Axis configuration with tick generation and data→pixel mapping.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub log: bool,
    pub label: String,
    pub tick_positions: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub minor_ticks: Vec<f64>,
}

impl Axis {
    /// Auto-scale linear axis with "nice number" ticks; limits are widened to whole steps.
    pub fn auto_linear(data_min: f64, data_max: f64, target_ticks: usize) -> Self {
        let (nice_min, nice_max, _) = nice_range(data_min, data_max, target_ticks);
        Self::bounded_linear(nice_min, nice_max, target_ticks)
    }

    /// Linear axis over exactly `[min, max]` with nice ticks inside it.
    pub fn bounded_linear(min: f64, max: f64, target_ticks: usize) -> Self {
        let (min, max) = if (max - min).abs() < 1e-15 { (min - 1.0, max + 1.0) } else { (min, max) };
        let step = nice_step((max - min) / (target_ticks.max(2) - 1) as f64);
        let eps = step * 0.01;

        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        let first = (min / step).ceil() as i64;
        let last = (max / step + 0.01).floor() as i64;
        for k in first..=last {
            let v = k as f64 * step;
            ticks.push(v);
            labels.push(format_tick(v, step));
        }

        // Minor ticks: 5 subdivisions per major
        let minor_step = step / 5.0;
        let mut minor = Vec::new();
        let first = (min / minor_step - 0.01).ceil() as i64;
        let last = (max / minor_step + 0.01).floor() as i64;
        for k in first..=last {
            let mv = k as f64 * minor_step;
            if !ticks.iter().any(|t| (t - mv).abs() < eps) {
                minor.push(mv);
            }
        }

        Self {
            min,
            max,
            log: false,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    /// Auto-scale logarithmic axis; limits are widened to whole decades.
    pub fn auto_log(data_min: f64, data_max: f64) -> Self {
        let log_min = data_min.max(1e-20).log10().floor() as i32;
        let log_max = data_max.max(1e-20).log10().ceil().max(log_min as f64 + 1.0) as i32;
        Self::bounded_log(10.0_f64.powi(log_min), 10.0_f64.powi(log_max))
    }

    /// Logarithmic axis over exactly `[min, max]` (both > 0), decade ticks inside it.
    pub fn bounded_log(min: f64, max: f64) -> Self {
        let min = min.max(1e-20);
        let max = max.max(min * 10.0);
        let tol = 1e-9;
        let log_min = (min.log10() - tol).ceil() as i32;
        let log_max = (max.log10() + tol).floor() as i32;

        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        let mut minor = Vec::new();

        for exp in (log_min - 1)..=log_max {
            let v = 10.0_f64.powi(exp);
            if exp >= log_min {
                ticks.push(v);
                labels.push(format!("10{}", superscript(exp)));
            }
            // Minor ticks at 2..9
            for m in 2..=9 {
                let mv = m as f64 * v;
                if mv >= min * (1.0 - tol) && mv <= max * (1.0 + tol) {
                    minor.push(mv);
                }
            }
        }

        Self {
            min,
            max,
            log: true,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Keep tick marks but drop their labels (shared x axis of a main panel).
    pub fn without_tick_labels(mut self) -> Self {
        self.tick_labels.clear();
        self
    }

    /// Map a data value to pixel coordinate.
    pub fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        if self.log {
            let log_val = value.max(1e-20).ln();
            let log_min = self.min.max(1e-20).ln();
            let log_max = self.max.max(1e-20).ln();
            let frac = (log_val - log_min) / (log_max - log_min);
            px_min + frac * (px_max - px_min)
        } else {
            let frac = (value - self.min) / (self.max - self.min);
            px_min + frac * (px_max - px_min)
        }
    }

    /// Like [`Axis::data_to_pixel`] with the result kept inside the pixel range.
    pub fn data_to_pixel_clamped(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let px = self.data_to_pixel(value, px_min, px_max);
        let (lo, hi) = if px_min <= px_max { (px_min, px_max) } else { (px_max, px_min) };
        if px.is_nan() { hi } else { px.clamp(lo, hi) }
    }
}

/// "Nice numbers" algorithm for pleasant tick spacing.
fn nice_range(data_min: f64, data_max: f64, target_ticks: usize) -> (f64, f64, f64) {
    if (data_max - data_min).abs() < 1e-15 {
        return (data_min - 1.0, data_max + 1.0, 1.0);
    }
    let range = data_max - data_min;
    let rough_step = range / (target_ticks.max(2) - 1) as f64;
    let step = nice_step(rough_step);
    let nice_min = (data_min / step).floor() * step;
    let nice_max = (data_max / step).ceil() * step;
    (nice_min, nice_max, step)
}

fn nice_step(rough: f64) -> f64 {
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice_frac = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice_frac * 10.0_f64.powf(exp)
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 { 0 } else { (-step.log10() - 1e-9).ceil() as usize };
    // Avoid "-0"
    let v = if value.abs() < step * 0.01 { 0.0 } else { value };
    if decimals == 0 {
        format!("{}", v.round() as i64)
    } else {
        format!("{:.prec$}", v, prec = decimals)
    }
}

fn superscript(n: i32) -> String {
    let s = n.to_string();
    s.chars()
        .map(|c| match c {
            '-' => '\u{207B}',
            '0' => '\u{2070}',
            '1' => '\u{00B9}',
            '2' => '\u{00B2}',
            '3' => '\u{00B3}',
            '4' => '\u{2074}',
            '5' => '\u{2075}',
            '6' => '\u{2076}',
            '7' => '\u{2077}',
            '8' => '\u{2078}',
            '9' => '\u{2079}',
            _ => c,
        })
        .collect()
}
