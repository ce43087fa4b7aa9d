//! Terminal line charts.
//!
//! A fixed-size character grid with a labelled Y axis on the left and day
//! ticks along the bottom. Each line gets its own glyph; points are joined
//! by straight segments drawn with the same glyph.

const GLYPHS: &[char] = &['*', '+', 'o', 'x', '#', '@', '%', '&', '=', '$'];
const BAND: char = ':';
const Y_LABEL_WIDTH: usize = 8;

/// One plotted line.
pub struct Line {
    pub label: String,
    /// `(x, y, band half-width)`, sorted by x.
    pub points: Vec<(f64, f64, f64)>,
}

pub struct Chart {
    pub width: usize,
    pub height: usize,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub y_format: fn(f64) -> String,
}

impl Chart {
    pub fn glyph(index: usize) -> char {
        GLYPHS[index % GLYPHS.len()]
    }

    fn col(&self, x: f64) -> usize {
        let (x0, x1) = self.x_range;
        let span = if x1 > x0 { x1 - x0 } else { 1.0 };
        let c = ((x - x0) / span * (self.width - 1) as f64).round();
        c.clamp(0.0, (self.width - 1) as f64) as usize
    }

    fn row(&self, y: f64) -> usize {
        let (y0, y1) = self.y_range;
        let span = if y1 > y0 { y1 - y0 } else { 1.0 };
        let r = ((y1 - y) / span * (self.height - 1) as f64).round();
        r.clamp(0.0, (self.height - 1) as f64) as usize
    }

    /// Render the lines and axes to a string (no trailing newline).
    pub fn render(&self, lines: &[Line]) -> String {
        let mut grid = vec![vec![' '; self.width]; self.height];

        // Bands first so lines draw over them.
        for line in lines {
            for &(x, y, band) in &line.points {
                if band <= 0.0 {
                    continue;
                }
                let c = self.col(x);
                let (top, bottom) = (self.row(y + band), self.row(y - band));
                for cells in grid.iter_mut().take(bottom + 1).skip(top) {
                    cells[c] = BAND;
                }
            }
        }

        for (i, line) in lines.iter().enumerate() {
            let glyph = Self::glyph(i);
            for pair in line.points.windows(2) {
                let (xa, ya, _) = pair[0];
                let (xb, yb, _) = pair[1];
                let (ca, cb) = (self.col(xa), self.col(xb));
                if cb > ca {
                    for c in ca..=cb {
                        let t = (c - ca) as f64 / (cb - ca) as f64;
                        grid[self.row(ya + (yb - ya) * t)][c] = glyph;
                    }
                }
            }
            for &(x, y, _) in &line.points {
                grid[self.row(y)][self.col(x)] = glyph;
            }
        }

        let mut out: Vec<String> = Vec::with_capacity(self.height + 2);
        let mid = self.height / 2;
        for (r, cells) in grid.iter().enumerate() {
            let label = if r == 0 {
                (self.y_format)(self.y_range.1)
            } else if r == self.height - 1 {
                (self.y_format)(self.y_range.0)
            } else if r == mid {
                (self.y_format)((self.y_range.0 + self.y_range.1) / 2.0)
            } else {
                String::new()
            };
            let body: String = cells.iter().collect();
            out.push(format!(
                "{label:>w$} |{}",
                body.trim_end(),
                w = Y_LABEL_WIDTH
            ));
        }
        out.push(format!(
            "{:>w$} +{}",
            "",
            "-".repeat(self.width),
            w = Y_LABEL_WIDTH
        ));
        out.push(self.x_ticks());
        out.join("\n")
    }

    fn x_ticks(&self) -> String {
        let mut ticks = vec![' '; self.width + 8];
        let (x0, x1) = self.x_range;
        for x in [x0, (x0 + x1) / 2.0, x1] {
            let text = format!("{}", x.round() as i64);
            let start = self.col(x).saturating_sub(text.len() / 2);
            for (k, ch) in text.chars().enumerate() {
                if let Some(cell) = ticks.get_mut(start + k) {
                    *cell = ch;
                }
            }
        }
        let body: String = ticks.iter().collect();
        format!("{:>w$}  {}", "", body.trim_end(), w = Y_LABEL_WIDTH)
    }
}

/// One legend row per line, prefixed with its glyph.
pub fn legend(lines: &[Line]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| format!("  {} {}", Chart::glyph(i), l.label))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Y tick formatter for retained fractions: `0.94` → `94%`.
pub fn percent(y: f64) -> String {
    format!("{}%", (y * 100.0).round() as i64)
}

/// Y tick formatter for weights in grams.
pub fn grams(y: f64) -> String {
    format!("{y:.1}g")
}
