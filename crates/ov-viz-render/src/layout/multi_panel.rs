use crate::layout::margins::PlotArea;

/// Main + Ratio panel layout stacked vertically, sharing the x axis.
#[derive(Debug, Clone)]
pub struct MainRatioLayout {
    pub main: PlotArea,
    pub ratio: PlotArea,
}

impl MainRatioLayout {
    /// Split `content` so the ratio panel gets `ratio_frac` of its height.
    pub fn split(content: &PlotArea, gap: f64, ratio_frac: f64) -> Self {
        Self::new(content.left, content.top, content.width, content.height, gap, ratio_frac)
    }

    pub fn new(
        left: f64,
        top: f64,
        width: f64,
        total_height: f64,
        gap: f64,
        ratio_frac: f64,
    ) -> Self {
        let ratio_h = total_height * ratio_frac;
        let main_h = total_height - ratio_h - gap;

        Self {
            main: PlotArea::manual(left, top, width, main_h),
            ratio: PlotArea::manual(left, top + main_h + gap, width, ratio_h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panels_tile_the_content_box() {
        let l = MainRatioLayout::new(50.0, 40.0, 400.0, 500.0, 4.0, 0.3);
        assert!((l.ratio.height - 150.0).abs() < 1e-9);
        assert!((l.main.height - 346.0).abs() < 1e-9);
        assert!((l.ratio.bottom() - 540.0).abs() < 1e-9);
        assert_eq!(l.main.left, l.ratio.left);
        assert_eq!(l.main.width, l.ratio.width);
    }
}
