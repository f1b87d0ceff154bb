//! Export of an annotated sequence
//!
//! Markdown reads as the narrative: each hunk in display order under its
//! description. JSON is the persisted record.

use anyhow::Result;
use literate_diff::sequence::AnnotatedSequence;
use literate_diff::store::PersistedDiff;

/// Renders the sequence as a markdown narrative
pub fn export_markdown(sequence: &AnnotatedSequence) -> String {
    if sequence.is_empty() {
        return "# No chunks found\n".to_string();
    }

    let mut output = String::new();
    match sequence.id() {
        Some(id) => output.push_str(&format!("# Literate diff {}\n\n", id)),
        None => output.push_str("# Literate diff\n\n"),
    }

    for (position, unit) in sequence.units().iter().enumerate() {
        output.push_str(&format!(
            "## {}. {} (hunk {})\n\n",
            position + 1,
            unit.file_pair.label(),
            unit.chunk_index + 1
        ));

        if !unit.description.is_empty() {
            output.push_str(&unit.description);
            output.push_str("\n\n");
        }

        output.push_str("```diff\n");
        for chunk in &unit.chunks {
            output.push_str(&chunk.content);
            output.push('\n');
            for change in &chunk.changes {
                output.push_str(&change.content);
                output.push('\n');
            }
        }
        output.push_str("```\n\n");
    }

    output
}

/// Exports the sequence as the `{ id, diff }` record
pub fn export_json(sequence: &AnnotatedSequence) -> Result<String> {
    let record = PersistedDiff {
        id: sequence.id().map(String::from),
        diff: sequence.units().to_vec(),
    };

    serde_json::to_string_pretty(&record).map_err(Into::into)
}

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Main export function that handles format selection
pub fn export(sequence: &AnnotatedSequence, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Markdown => Ok(export_markdown(sequence)),
        ExportFormat::Json => export_json(sequence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use literate_diff::chunk::{expand, FilePair};
    use literate_diff::diff::parse;

    const DIFF: &str = "\
--- a/src/main.rs
+++ b/src/main.rs
@@ -1 +1 @@
-fn old() {}
+fn new() {}
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -4 +4 @@
-pub mod a;
+pub mod b;
";

    fn sequence() -> AnnotatedSequence {
        let mut seq = AnnotatedSequence::with_id("abc", expand(parse(DIFF)));
        seq.reorder(1, 0).unwrap();
        seq.set_description(&FilePair::new("src/main.rs", "src/main.rs"), 0, "Rename the entry point")
            .unwrap();
        seq
    }

    #[test]
    fn test_export_markdown() {
        let md = export_markdown(&sequence());

        assert!(md.contains("# Literate diff abc"));
        assert!(md.contains("## 1. src/lib.rs (hunk 1)"));
        assert!(md.contains("## 2. src/main.rs (hunk 1)"));
        assert!(md.contains("Rename the entry point"));
        assert!(md.contains("```diff\n@@ -4 +4 @@\n-pub mod a;\n+pub mod b;\n```"));
        assert!(md.find("src/lib.rs").unwrap() < md.find("src/main.rs").unwrap());
    }

    #[test]
    fn test_export_json() {
        let json = export_json(&sequence()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["id"], "abc");
        assert_eq!(parsed["diff"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["diff"][1]["description"], "Rename the entry point");
        assert_eq!(parsed["diff"][0]["from"], "src/lib.rs");
    }

    #[test]
    fn test_empty_and_format_names() {
        assert_eq!(export_markdown(&AnnotatedSequence::default()), "# No chunks found\n");
        assert_eq!(ExportFormat::from_str("MD"), Some(ExportFormat::Markdown));
        assert_eq!(ExportFormat::from_str("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_str("html"), None);
    }
}
