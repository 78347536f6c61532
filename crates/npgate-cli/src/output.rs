use npgate_core::validator::ValidationVerdict;
use serde::Serialize;

/// Pretty JSON on stdout for `--json`.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Left-aligned columns for `npgate taxonomy list`. Widths count chars, so
/// Japanese names line up as well as a terminal allows.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .fold(headers[col].chars().count(), usize::max)
        })
        .collect();

    print_row(headers.iter().copied(), &widths);
    println!(
        "{}",
        widths.iter().map(|&w| "-".repeat(w)).collect::<Vec<_>>().join("  ")
    );
    for row in &rows {
        print_row(row.iter().map(String::as_str), &widths);
    }
}

fn print_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:w$}"))
        .collect();
    println!("{}", padded.join("  ").trim_end());
}

/// One `kind: detail` line per violation, then `warning:` lines.
pub fn print_verdict(verdict: &ValidationVerdict) {
    for v in &verdict.violations {
        println!("{v}");
    }
    for w in &verdict.warnings {
        println!("warning: {w}");
    }
}
