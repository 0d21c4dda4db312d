use polars::prelude::{AnyValue, DataFrame};

fn cell_text(av: &AnyValue<'_>) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        _ => av.to_string(),
    }
}

/// Boxed plain-text rendering of a frame, with a leading 1-based row number.
pub fn render_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let mut headers: Vec<String> = vec!["#".to_string()];
    headers.extend(columns.iter().map(|c| c.name().to_string()));

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let mut row = vec![(row_idx + 1).to_string()];
        for col in columns {
            let text = col
                .get(row_idx)
                .map(|av| cell_text(&av))
                .unwrap_or_default();
            row.push(text);
        }
        rows.push(row);
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &headers, &widths);
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        out.push(' ');
        out.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        out.push_str(&" ".repeat(pad));
        out.push_str(" |");
    }
    out.push('\n');
}
