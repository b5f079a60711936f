//! Full line-by-line report between two file structures.
//!
//! Both structures are rendered to a listing (one line per section and per
//! header card, or per catalog column) and compared with a unified line
//! diff.

use similar::TextDiff;
use skydm_format::FileStructure;

/// Report text when the two listings are identical.
pub const NO_DIFFERENCES: &str = "No differences found.\n";

/// Unified diff of the rendered structures, labeled with the two versions.
pub fn full_report(old: &FileStructure, new: &FileStructure, old_label: &str, new_label: &str) -> String {
    let old_text = old.render();
    let new_text = new.render();
    if old_text == new_text {
        return NO_DIFFERENCES.to_string();
    }

    TextDiff::from_lines(&old_text, &new_text)
        .unified_diff()
        .context_radius(3)
        .header(old_label, new_label)
        .to_string()
}
