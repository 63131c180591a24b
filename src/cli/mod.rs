use crate::serialize::RecordSet;

/// Widest a column may grow before its cells are clipped.
const MAX_CELL: usize = 80;

/// Render records as an ASCII table, fields in header order, followed by a
/// `records: N, fields: M` footer. `None` when there is nothing to show.
pub fn render_records(records: &RecordSet) -> Option<String> {
    let fields: Vec<&str> = records.first()?.keys().map(String::as_str).collect();
    if fields.is_empty() {
        return None;
    }
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| fields.iter().map(|f| cell(r.get(*f).map(String::as_str).unwrap_or(""))).collect())
        .collect();
    let header: Vec<String> = fields.iter().map(|f| cell(f)).collect();

    let widths: Vec<usize> = (0..fields.len())
        .map(|i| {
            std::iter::once(&header)
                .chain(&rows)
                .map(|row| row[i].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule = rule(&widths);
    let mut lines = vec![rule.clone(), line(&header, &widths), rule.clone()];
    lines.extend(rows.iter().map(|row| line(row, &widths)));
    lines.push(rule);
    lines.push(format!("records: {}, fields: {}", rows.len(), fields.len()));
    Some(lines.join("\n"))
}

// One table cell: single line, clipped to MAX_CELL characters.
fn cell(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() <= MAX_CELL {
        return flat;
    }
    let mut clipped: String = flat.chars().take(MAX_CELL - 1).collect();
    clipped.push('…');
    clipped
}

fn rule(widths: &[usize]) -> String {
    widths.iter().fold("+".to_string(), |acc, w| format!("{acc}{}+", "-".repeat(w + 2)))
}

fn line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .fold("|".to_string(), |acc, (c, w)| format!("{acc} {c:<w$} |", w = *w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::Record;

    fn rec(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn renders_fields_in_header_order() {
        let records = vec![rec(&[("name", "Alice"), ("id", "1")]), rec(&[("name", "Bob"), ("id", "22")])];
        let out = render_records(&records).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "+-------+----+");
        assert_eq!(lines[1], "| name  | id |");
        assert_eq!(lines[3], "| Alice | 1  |");
        assert_eq!(lines[4], "| Bob   | 22 |");
        assert_eq!(lines[5], "+-------+----+");
        assert_eq!(lines[6], "records: 2, fields: 2");
    }

    #[test]
    fn nothing_to_render() {
        assert!(render_records(&Vec::new()).is_none());
    }

    #[test]
    fn long_and_multiline_cells_are_flattened() {
        assert_eq!(cell("two\nlines"), "two lines");
        let long = "x".repeat(MAX_CELL + 5);
        let clipped = cell(&long);
        assert_eq!(clipped.chars().count(), MAX_CELL);
        assert!(clipped.ends_with('…'));
        assert_eq!(cell("short"), "short");
    }
}
