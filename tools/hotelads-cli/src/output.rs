//! Rendering of command results.
//!
//! Every command produces either one JSON document on stdout (`--json`) or
//! human text. Diagnostics go to stderr in both modes.

use std::fmt::Display;

use console::style;
use serde::Serialize;

/// Width of the name column in [`Output::field`].
const FIELD_WIDTH: usize = 22;

/// Column gap in rendered tables.
const GAP: &str = "  ";

/// Where and how results are written.
#[derive(Debug, Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Write `value` as the command's JSON document.
    ///
    /// Returns `false` without writing anything in human mode, so callers can
    /// fall through to their text rendering.
    pub fn emit_json<T: Serialize>(&self, value: &T) -> bool {
        if !self.json {
            return false;
        }
        match serde_json::to_string_pretty(value) {
            Ok(doc) => println!("{}", doc),
            Err(e) => eprintln!("{}", serde_json::json!({ "error": e.to_string() })),
        }
        true
    }

    /// Bold section title.
    pub fn section(&self, title: &str) {
        if !self.json {
            println!("\n{}", style(title).bold());
        }
    }

    /// Aligned `name: value` line.
    pub fn field(&self, name: &str, value: impl Display) {
        if !self.json {
            let label = format!("{:<width$}", format!("{}:", name), width = FIELD_WIDTH);
            println!("  {}{}", style(label).dim(), value);
        }
    }

    /// Plain line of text.
    pub fn line(&self, text: &str) {
        if !self.json {
            println!("{}", text);
        }
    }

    pub fn table(&self, table: &Table) {
        if self.json {
            return;
        }
        let mut lines = table.render().into_iter();
        if let Some(header) = lines.next() {
            println!("  {}", style(header).bold());
        }
        for line in lines {
            println!("  {}", line);
        }
    }

    /// Closing summary of a successful command.
    pub fn done(&self, summary: &str) {
        if !self.json {
            println!("{} {}", style("done").green().bold(), summary);
        }
    }

    pub fn caution(&self, msg: &str) {
        if !self.json {
            eprintln!("{} {}", style("warning:").yellow().bold(), msg);
        }
    }

    /// Verbose-only diagnostic.
    pub fn trace(&self, msg: &str) {
        if self.verbose && !self.json {
            eprintln!("{}", style(msg).dim());
        }
    }

    /// Report a failed command with its cause chain.
    pub fn failure(&self, err: &anyhow::Error) {
        if self.json {
            let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
            eprintln!(
                "{}",
                serde_json::json!({ "error": err.to_string(), "causes": causes })
            );
            return;
        }
        eprintln!("{} {}", style("error:").red().bold(), err);
        for cause in err.chain().skip(1) {
            eprintln!("  {} {}", style("caused by:").red(), cause);
        }
    }
}

/// Fixed-width text table. Cells longer than their column are shortened
/// with an ellipsis; a width of `0` leaves the column unbounded.
#[derive(Debug, Clone)]
pub struct Table {
    titles: Vec<&'static str>,
    widths: Vec<usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: &[(&'static str, usize)]) -> Self {
        Self {
            titles: columns.iter().map(|(title, _)| *title).collect(),
            widths: columns.iter().map(|(_, width)| *width).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    /// Header line followed by one line per row, without styling.
    pub fn render(&self) -> Vec<String> {
        let header: Vec<String> = self.titles.iter().map(|t| t.to_string()).collect();
        std::iter::once(&header)
            .chain(self.rows.iter())
            .map(|cells| self.render_cells(cells))
            .collect()
    }

    fn render_cells(&self, cells: &[String]) -> String {
        let line: Vec<String> = cells
            .iter()
            .zip(&self.widths)
            .map(|(cell, &width)| {
                if width == 0 {
                    cell.clone()
                } else {
                    format!("{:<width$}", shorten(cell, width), width = width)
                }
            })
            .collect();
        line.join(GAP).trim_end().to_string()
    }
}

fn shorten(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut short: String = value.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}
