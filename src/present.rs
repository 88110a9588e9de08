//! Chart series and result tiles, plus their terminal renderings.

/// Magnitude bucket of a result tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// value < 2
    Low,
    /// 2 <= value < 10
    Mid,
    /// value >= 10
    High,
}

impl Bucket {
    pub fn of(value: f64) -> Self {
        if value < 2.0 {
            Bucket::Low
        } else if value < 10.0 {
            Bucket::Mid
        } else {
            Bucket::High
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Bucket::Low => "#00BFFF",
            Bucket::Mid => "#8A2BE2",
            Bucket::High => "#FF00FF",
        }
    }

    fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Bucket::Low => (0x00, 0xBF, 0xFF),
            Bucket::Mid => (0x8A, 0x2B, 0xE2),
            Bucket::High => (0xFF, 0x00, 0xFF),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Low => "low",
            Bucket::Mid => "mid",
            Bucket::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub text: String,
    pub bucket: Bucket,
}

impl Tile {
    pub fn color(&self) -> &'static str {
        self.bucket.color()
    }

    /// Tile as an ANSI true-color block.
    pub fn ansi(&self) -> String {
        let (r, g, b) = self.bucket.rgb();
        format!("\x1b[48;2;{};{};{}m\x1b[97m {} \x1b[0m", r, g, b, self.text)
    }
}

pub fn render_block(value: f64) -> Tile {
    Tile {
        text: format!("{:.2}", value),
        bucket: Bucket::of(value),
    }
}

/// Growing line series; labels are the 1-based running count.
#[derive(Debug, Clone, Default)]
pub struct ChartSeries {
    labels: Vec<usize>,
    points: Vec<f64>,
}

impl ChartSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_point(&mut self, index: usize, value: f64) {
        self.labels.push(index);
        self.points.push(value);
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Horizontal bar rendering, y axis starting at zero.
    pub fn render_text(&self, width: usize) -> String {
        if self.points.is_empty() {
            return "(no results yet)".to_string();
        }
        let max = self.points.iter().copied().fold(0.0_f64, f64::max);
        let label_w = self.labels.last().map(|l| l.to_string().len()).unwrap_or(1);
        let mut out = String::new();
        for (label, value) in self.labels.iter().zip(&self.points) {
            let filled = if max > 0.0 {
                ((value / max) * width as f64).round() as usize
            } else {
                0
            };
            out.push_str(&format!(
                "{:>lw$} | {:>8.2} {}\n",
                label,
                value,
                "#".repeat(filled.max(1)),
                lw = label_w
            ));
        }
        out
    }
}

pub fn render_tiles(tiles: &[Tile]) -> String {
    tiles.iter().map(Tile::ansi).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_thresholds() {
        assert_eq!(Bucket::of(1.99), Bucket::Low);
        assert_eq!(Bucket::of(2.0), Bucket::Mid);
        assert_eq!(Bucket::of(9.99), Bucket::Mid);
        assert_eq!(Bucket::of(10.0), Bucket::High);
        assert_eq!(render_block(1.99).color(), "#00BFFF");
        assert_eq!(render_block(2.0).color(), "#8A2BE2");
        assert_eq!(render_block(10.0).color(), "#FF00FF");
    }

    #[test]
    fn test_tile_text_two_decimals() {
        assert_eq!(render_block(3.456).text, "3.46");
        assert_eq!(render_block(12.0).text, "12.00");
    }

    #[test]
    fn test_chart_render_one_row_per_point() {
        let mut chart = ChartSeries::new();
        chart.append_point(1, 1.0);
        chart.append_point(2, 4.0);
        let text = chart.render_text(20);
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().ends_with(&"#".repeat(20)));
        assert_eq!(chart.labels(), &[1, 2]);
    }
}
