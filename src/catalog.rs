//! Static format catalog: which target formats each source type converts to.
//!
//! The table is process-wide and read-only. Entry order matters: the first
//! target listed for a source extension is the default selection, and the
//! slice order is the display order.

use serde::Serialize;

/// One target format offered for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetFormatOption {
    /// Presentational label, e.g. "Word Document".
    pub label: &'static str,
    /// Canonical format code sent verbatim to the gateway, e.g. "DOCX".
    pub code: &'static str,
    /// Short human description.
    pub description: &'static str,
}

impl TargetFormatOption {
    const fn new(label: &'static str, code: &'static str, description: &'static str) -> Self {
        Self {
            label,
            code,
            description,
        }
    }

    /// Lowercase file extension for this format (`"DOCX"` → `"docx"`).
    pub fn extension(&self) -> String {
        self.code.to_ascii_lowercase()
    }

    /// Case-insensitive match against a format code.
    pub fn matches(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code.trim())
    }
}

const FROM_PDF: &[TargetFormatOption] = &[
    TargetFormatOption::new("Word Document", "DOCX", "Editable Microsoft Word file"),
    TargetFormatOption::new("Excel Sheet", "XLSX", "Extract tables to Excel"),
    TargetFormatOption::new("CSV Data", "CSV", "Extract text to raw data"),
    TargetFormatOption::new("PNG Image", "PNG", "High-quality lossless image"),
    TargetFormatOption::new("JPG Image", "JPG", "Compressed photography format"),
];

const FROM_DOCX: &[TargetFormatOption] = &[
    TargetFormatOption::new("PDF Document", "PDF", "Standard portable document"),
    TargetFormatOption::new("Excel Sheet", "XLSX", "Convert tables to Excel"),
    TargetFormatOption::new("CSV Data", "CSV", "Convert tables to CSV"),
];

const FROM_CSV: &[TargetFormatOption] = &[
    TargetFormatOption::new("Excel Sheet", "XLSX", "Microsoft Excel spreadsheet"),
    TargetFormatOption::new("PDF Report", "PDF", "Print-ready PDF layout"),
];

const FROM_XLSX: &[TargetFormatOption] = &[
    TargetFormatOption::new("PDF Document", "PDF", "Fixed layout spreadsheet"),
    TargetFormatOption::new("CSV Data", "CSV", "Plain text data file"),
];

const FROM_JPG: &[TargetFormatOption] = &[
    TargetFormatOption::new("PDF Document", "PDF", "Convert image to document"),
    TargetFormatOption::new("PNG Image", "PNG", "Switch to lossless format"),
];

const FROM_PNG: &[TargetFormatOption] = &[
    TargetFormatOption::new("PDF Document", "PDF", "Convert image to document"),
    TargetFormatOption::new("JPG Image", "JPG", "Convert to compressed JPG"),
];

/// Source extension → targets, in display order.
const CATALOG: &[(&str, &[TargetFormatOption])] = &[
    ("pdf", FROM_PDF),
    ("docx", FROM_DOCX),
    ("csv", FROM_CSV),
    ("xlsx", FROM_XLSX),
    ("jpg", FROM_JPG),
    ("jpeg", FROM_JPG),
    ("png", FROM_PNG),
];

/// Normalised extension of `filename`: the text after the final `.`,
/// lowercased. A name without a `.` has no extension.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Target formats registered for `filename`, or an empty slice when its
/// extension is unknown.
pub fn lookup(filename: &str) -> &'static [TargetFormatOption] {
    extension_of(filename)
        .and_then(|ext| targets_for_extension(&ext))
        .unwrap_or(&[])
}

/// Target formats registered for an already-normalised extension.
pub fn targets_for_extension(ext: &str) -> Option<&'static [TargetFormatOption]> {
    CATALOG
        .iter()
        .find(|(source, _)| source.eq_ignore_ascii_case(ext))
        .map(|(_, targets)| *targets)
}

/// The default (first) target for `filename`.
pub fn default_target(filename: &str) -> Option<&'static TargetFormatOption> {
    lookup(filename).first()
}

/// Find `code` among the targets offered for `filename`.
pub fn find_target(filename: &str, code: &str) -> Option<&'static TargetFormatOption> {
    lookup(filename).iter().find(|t| t.matches(code))
}

/// Whether `filename` has any registered target.
pub fn is_supported(filename: &str) -> bool {
    !lookup(filename).is_empty()
}

/// All registered source extensions, in catalog order.
pub fn source_extensions() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|(source, _)| *source)
}

/// File-picker accept list, e.g. `".pdf,.docx,.csv,..."`.
pub fn accepted_extensions() -> String {
    source_extensions()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(filename: &str) -> Vec<&'static str> {
        lookup(filename).iter().map(|t| t.code).collect()
    }

    #[test]
    fn pdf_targets_in_order() {
        assert_eq!(codes("report.pdf"), vec!["DOCX", "XLSX", "CSV", "PNG", "JPG"]);
        assert_eq!(default_target("report.pdf").map(|t| t.code), Some("DOCX"));
    }

    #[test]
    fn registered_mapping() {
        assert_eq!(codes("a.docx"), vec!["PDF", "XLSX", "CSV"]);
        assert_eq!(codes("a.csv"), vec!["XLSX", "PDF"]);
        assert_eq!(codes("a.xlsx"), vec!["PDF", "CSV"]);
        assert_eq!(codes("a.png"), vec!["PDF", "JPG"]);
        assert_eq!(codes("a.jpg"), vec!["PDF", "PNG"]);
        assert_eq!(codes("a.jpeg"), vec!["PDF", "PNG"]);
    }

    #[test]
    fn extension_is_case_insensitive_and_uses_final_dot() {
        assert_eq!(codes("SCAN.PDF"), codes("scan.pdf"));
        assert_eq!(extension_of("archive.tar.PNG").as_deref(), Some("png"));
        assert_eq!(codes("my.report.docx"), vec!["PDF", "XLSX", "CSV"]);
    }

    #[test]
    fn unknown_or_missing_extension_is_empty() {
        assert!(lookup("data.xyz").is_empty());
        assert!(lookup("pdf").is_empty());
        assert!(lookup("trailing.").is_empty());
        assert!(lookup("").is_empty());
        assert!(!is_supported("data.xyz"));
    }

    #[test]
    fn every_source_has_targets() {
        for ext in source_extensions() {
            let targets = targets_for_extension(ext).unwrap();
            assert!(!targets.is_empty(), "{ext} has no targets");
        }
    }

    #[test]
    fn find_target_ignores_case() {
        let t = find_target("photo.png", "jpg").expect("JPG offered for png");
        assert_eq!(t.code, "JPG");
        assert_eq!(t.extension(), "jpg");
        assert!(find_target("photo.png", "DOCX").is_none());
    }

    #[test]
    fn accept_list_covers_all_sources() {
        assert_eq!(
            accepted_extensions(),
            ".pdf,.docx,.csv,.xlsx,.jpg,.jpeg,.png"
        );
    }
}
