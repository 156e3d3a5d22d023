//! Writing a finished matrix to disk.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::matrix::LatencyMatrix;

pub trait Export {
    /// File extension of the artifact, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, matrix: &LatencyMatrix, title: &str) -> String;

    fn write(&self, matrix: &LatencyMatrix, title: &str, path: &Path) -> Result<()> {
        fs::write(path, self.render(matrix, title)).map_err(|source| Error::Export {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "wrote {}", self.extension());
        Ok(())
    }
}

/// One `from,to,ns` line per measured pair, like the raw console dump.
#[derive(Debug, Default)]
pub struct CsvExport;

impl Export for CsvExport {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, matrix: &LatencyMatrix, title: &str) -> String {
        let mut out = String::new();
        if !title.is_empty() {
            let _ = writeln!(out, "# {}", title);
        }
        out.push_str("from,to,ns\n");
        let cores = matrix.cores();
        for i in 0..matrix.size() {
            for (j, cell) in matrix.row(i).iter().enumerate() {
                if let Some(ns) = cell {
                    let _ = writeln!(out, "{},{},{:.2}", cores[i], cores[j], ns);
                }
            }
        }
        out
    }
}

type Rgb = (u8, u8, u8);

const LOW: Rgb = (99, 190, 123);
const MID: Rgb = (255, 235, 132);
const HIGH: Rgb = (248, 105, 107);

/// Labeled grid with every measured cell on a low/mid/high colour scale.
#[derive(Debug, Default)]
pub struct HtmlExport;

impl HtmlExport {
    /// Colour for `v` on the three-point scale spanning `lo..=hi`.
    pub fn color(v: f64, lo: f64, hi: f64) -> Rgb {
        if hi <= lo {
            return MID;
        }
        let t = ((v - lo) / (hi - lo)).max(0.0).min(1.0);
        if t < 0.5 {
            mix(LOW, MID, t * 2.0)
        } else {
            mix(MID, HIGH, (t - 0.5) * 2.0)
        }
    }
}

fn mix(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let ch = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    (ch(a.0, b.0), ch(a.1, b.1), ch(a.2, b.2))
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Export for HtmlExport {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, matrix: &LatencyMatrix, title: &str) -> String {
        let (lo, hi) = matrix.range().unwrap_or((0.0, 0.0));
        let title = escape(title);

        let mut out = String::new();
        let _ = writeln!(out, "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">");
        let _ = writeln!(out, "<title>{}</title>", title);
        out.push_str(
            "<style>td,th{padding:4px 8px;text-align:right;font-family:monospace}\
             td.na{color:#888}</style>\n</head>\n<body>\n",
        );
        let _ = writeln!(out, "<h1>{}</h1>", title);
        out.push_str("<table>\n<tr><th>from \\ to</th>");
        for to in matrix.cores() {
            let _ = write!(out, "<th>{}</th>", to);
        }
        out.push_str("</tr>\n");

        for (i, from) in matrix.cores().iter().enumerate() {
            let _ = write!(out, "<tr><th>{}</th>", from);
            for cell in matrix.row(i) {
                match cell {
                    Some(ns) => {
                        let (r, g, b) = Self::color(*ns, lo, hi);
                        let _ = write!(
                            out,
                            "<td style=\"background:#{:02x}{:02x}{:02x}\">{:.2}</td>",
                            r, g, b, ns
                        );
                    }
                    None => out.push_str("<td class=\"na\">n/a</td>"),
                }
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</table>\n</body>\n</html>\n");
        out
    }
}
