use std::fs;
use std::path::Path;

/// Canonical text artifacts use `\n` endings and end with a newline.
pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}

/// Numeric cells use the shortest round-trip decimal form.
pub fn format_float(value: f64) -> String {
    format!("{value}")
}

/// Render a labeled matrix as CSV: the first header cell is the index label,
/// each row leads with its index entry.
pub fn render_labeled_csv(
    index_label: &str,
    index: &[String],
    columns: &[String],
    data: &[Vec<f64>],
) -> String {
    let mut lines = Vec::with_capacity(data.len() + 1);

    let mut header = vec![index_label.to_string()];
    header.extend(columns.iter().cloned());
    lines.push(header.join(","));

    for (label, row) in index.iter().zip(data) {
        let mut cells = vec![label.clone()];
        cells.extend(row.iter().map(|value| format_float(*value)));
        lines.push(cells.join(","));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{format_float, normalize_text_artifact, render_labeled_csv, write_text_artifact};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn normalize_text_artifact_uses_canonical_line_endings() {
        let normalized = normalize_text_artifact("alpha\r\nbeta\rgamma");
        assert_eq!(normalized, "alpha\nbeta\ngamma\n");
    }

    #[test]
    fn repeated_text_writes_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("artifact.csv");
        let input = "a,b\r\n1,2";

        write_text_artifact(&path, input).expect("first write should succeed");
        let first = fs::read(&path).expect("artifact should be readable");

        write_text_artifact(&path, input).expect("second write should succeed");
        let second = fs::read(&path).expect("artifact should be readable");

        assert_eq!(first, second);
        assert_eq!(second, b"a,b\n1,2\n");
    }

    #[test]
    fn float_formatting_round_trips() {
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(f64::INFINITY), "inf");
        let reparsed: f64 = format_float(0.1).parse().expect("value should parse");
        assert_eq!(reparsed, 0.1);
    }

    #[test]
    fn labeled_csv_leads_rows_with_their_index() {
        let rendered = render_labeled_csv(
            "attributes",
            &["a".to_string(), "b".to_string()],
            &["a".to_string(), "b".to_string()],
            &[vec![1.0, 0.5], vec![0.5, 1.0]],
        );
        assert_eq!(rendered, "attributes,a,b\na,1,0.5\nb,0.5,1");
    }
}
