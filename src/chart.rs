//! Bar chart of the top words, laid out as SVG and rasterized to PNG.

use crate::error::{Result, WordFreqError};
use crate::rank::ChartValue;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::debug;
use usvg::{TreeParsing, TreeTextToPath};

const MARGIN_LEFT: u32 = 100;
const MARGIN_RIGHT: u32 = 40;
const MARGIN_TOP: u32 = 40;
const MARGIN_BOTTOM: u32 = 160;
const BAR_GAP: u32 = 20;
const Y_TICKS: u32 = 5;

/// A fixed-height bar chart, one bar per value
#[derive(Debug, Clone)]
pub struct BarChart {
    height: u32,
    bar_width: u32,
    bars: Vec<ChartValue>,
}

impl BarChart {
    pub fn new(bars: Vec<ChartValue>) -> Self {
        Self {
            height: 2000,
            bar_width: 100,
            bars,
        }
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn with_bar_width(mut self, bar_width: u32) -> Self {
        self.bar_width = bar_width;
        self
    }

    pub fn width(&self) -> u32 {
        MARGIN_LEFT + MARGIN_RIGHT + self.bars.len() as u32 * (self.bar_width + BAR_GAP)
    }

    /// Top of the Y axis: the largest value rounded up to a whole percent
    fn y_max(&self) -> f64 {
        let max = self.bars.iter().map(|bar| bar.value).fold(0.0, f64::max);
        max.ceil().max(1.0)
    }

    pub fn render_svg(&self) -> String {
        let width = self.width();
        let plot_height = self.height.saturating_sub(MARGIN_TOP + MARGIN_BOTTOM) as f64;
        let baseline = (MARGIN_TOP as f64) + plot_height;
        let y_max = self.y_max();

        // Writing into a String cannot fail.
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{h}" viewBox="0 0 {width} {h}" font-family="sans-serif" font-size="14">"#,
            h = self.height
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

        for tick in 0..=Y_TICKS {
            let value = y_max * tick as f64 / Y_TICKS as f64;
            let y = baseline - plot_height * tick as f64 / Y_TICKS as f64;
            let _ = writeln!(
                svg,
                r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="#dddddd"/><text x="{tx}" y="{y:.1}" text-anchor="end" dominant-baseline="middle">{value:.2}%</text>"##,
                x2 = width - MARGIN_RIGHT,
                tx = MARGIN_LEFT - 8,
            );
        }

        for (i, bar) in self.bars.iter().enumerate() {
            let x = MARGIN_LEFT + BAR_GAP / 2 + i as u32 * (self.bar_width + BAR_GAP);
            let bar_height = plot_height * (bar.value / y_max);
            let center = x + self.bar_width / 2;
            let _ = writeln!(
                svg,
                r##"<rect x="{x}" y="{top:.1}" width="{bw}" height="{bar_height:.1}" fill="#4a7ebb"/><text x="{center}" y="{ly:.1}" text-anchor="end" transform="rotate(-45 {center} {ly:.1})">{label}</text>"##,
                top = baseline - bar_height,
                bw = self.bar_width,
                ly = baseline + 20.0,
                label = escape(&bar.label),
            );
        }

        let _ = writeln!(
            svg,
            r#"<line x1="{MARGIN_LEFT}" y1="{baseline:.1}" x2="{x2}" y2="{baseline:.1}" stroke="black"/><line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{baseline:.1}" stroke="black"/>"#,
            x2 = width - MARGIN_RIGHT,
        );
        svg.push_str("</svg>\n");
        svg
    }

    /// Rasterize the chart and encode it as PNG.
    ///
    /// Labels are drawn with whatever system fonts are installed; without any,
    /// the bars and grid still render.
    pub fn render_png(&self) -> Result<Vec<u8>> {
        let svg = self.render_svg();
        let mut tree = usvg::Tree::from_str(&svg, &usvg::Options::default())
            .map_err(|e| WordFreqError::Render(format!("Failed to parse chart SVG: {e}")))?;

        let mut fonts = usvg::fontdb::Database::new();
        fonts.load_system_fonts();
        tree.convert_text(&fonts);

        let mut pixmap = tiny_skia::Pixmap::new(self.width(), self.height).ok_or_else(|| {
            WordFreqError::Render(format!(
                "Failed to create {}x{} pixmap",
                self.width(),
                self.height
            ))
        })?;
        resvg::Tree::from_usvg(&tree).render(tiny_skia::Transform::identity(), &mut pixmap.as_mut());

        debug!(
            width = pixmap.width(),
            height = pixmap.height(),
            fonts = fonts.len(),
            "chart rasterized"
        );
        pixmap
            .encode_png()
            .map_err(|e| WordFreqError::Render(format!("Failed to encode PNG: {e}")))
    }

    /// Render the chart as PNG and write it to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let png = self.render_png()?;
        fs::write(path, png).map_err(WordFreqError::Chart)
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bar(label: &str, value: f64) -> ChartValue {
        ChartValue {
            value,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_one_rect_per_bar() {
        let chart = BarChart::new(vec![bar("CAT", 66.7), bar("DOG", 33.3)]);
        let svg = chart.render_svg();
        // background + two bars
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains(">CAT</text>"));
        assert!(svg.contains(">DOG</text>"));
        assert!(svg.contains(r#"height="2000""#));
    }

    #[test]
    fn test_labels_are_escaped() {
        let svg = BarChart::new(vec![bar("<A&B>", 10.0)]).render_svg();
        assert!(svg.contains("&lt;A&amp;B&gt;"));
    }

    #[test]
    fn test_empty_chart_is_valid() {
        let chart = BarChart::new(Vec::new());
        let svg = chart.render_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(!svg.contains("NaN"));
        assert_eq!(chart.width(), MARGIN_LEFT + MARGIN_RIGHT);
    }

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    /// Width and height from the IHDR chunk that follows the signature
    fn png_dimensions(png: &[u8]) -> (u32, u32) {
        let word = |at: usize| u32::from_be_bytes([png[at], png[at + 1], png[at + 2], png[at + 3]]);
        (word(16), word(20))
    }

    #[test]
    fn test_write_to_file_is_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart.png");
        let chart = BarChart::new(vec![bar("CAT", 66.7), bar("DOG", 33.3)])
            .with_height(600)
            .with_bar_width(50);
        chart.write_to(&path).unwrap();

        let written = fs::read(&path).unwrap();
        assert_eq!(written[..8], PNG_SIGNATURE);
        assert_eq!(png_dimensions(&written), (chart.width(), 600));
    }

    #[test]
    fn test_empty_chart_rasterizes() {
        let png = BarChart::new(Vec::new()).with_height(300).render_png().unwrap();
        assert_eq!(png[..8], PNG_SIGNATURE);
        assert_eq!(png_dimensions(&png), (MARGIN_LEFT + MARGIN_RIGHT, 300));
    }

    #[test]
    fn test_zero_height_is_render_error() {
        let result = BarChart::new(vec![bar("CAT", 100.0)]).with_height(0).render_png();
        assert!(matches!(result, Err(WordFreqError::Render(_))));
    }

    #[test]
    fn test_write_error_surfaces() {
        let dir = TempDir::new().unwrap();
        let result = BarChart::new(Vec::new()).write_to(&dir.path().join("missing/chart.png"));
        assert!(matches!(result, Err(WordFreqError::Chart(_))));
    }
}
