//! Inject previews
//!
//! Before a template is copied over an existing file the user sees what
//! would change: a unified diff from the current file to the template.

use serde::Serialize;
use similar::TextDiff;

/// Number of context lines around each change
const CONTEXT_LINES: usize = 3;

/// What injecting a template into a destination would do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preview {
    /// Destination does not exist; the template is written as-is
    NewFile { name: String, content: String },
    /// Destination already holds exactly the template content
    Identical { name: String },
    /// Destination differs; unified diff from current file to template
    Diff { name: String, diff: String },
}

impl Preview {
    /// Printable form of the preview
    pub fn text(&self) -> String {
        match self {
            Preview::NewFile { name, content } => format!("New file: {}\n\n{}", name, content),
            Preview::Identical { name } => format!("'{}' is identical to the template", name),
            Preview::Diff { diff, .. } => diff.clone(),
        }
    }
}

/// Whether content looks binary (contains a NUL byte)
pub fn is_binary(content: &[u8]) -> bool {
    content.contains(&0)
}

/// Build the preview for injecting `template` as `dest_name`
///
/// `current` is the existing destination content, if any. Non-UTF-8 bytes
/// are compared lossily.
pub fn diff_preview(
    template_name: &str,
    template: &[u8],
    dest_name: &str,
    current: Option<&[u8]>,
) -> Preview {
    let template_text = String::from_utf8_lossy(template);

    let Some(current) = current else {
        return Preview::NewFile {
            name: dest_name.to_string(),
            content: template_text.into_owned(),
        };
    };

    if current == template {
        return Preview::Identical {
            name: dest_name.to_string(),
        };
    }

    let current_text = String::from_utf8_lossy(current);
    let diff = TextDiff::from_lines(current_text.as_ref(), template_text.as_ref())
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(
            &format!("current: {}", dest_name),
            &format!("template: {}", template_name),
        )
        .to_string();

    Preview::Diff {
        name: dest_name.to_string(),
        diff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_file_preview() {
        let preview = diff_preview(".gitignore", b"target/\n", ".gitignore", None);

        assert_eq!(preview.text(), "New file: .gitignore\n\ntarget/\n");
    }

    #[test]
    fn test_identical_preview() {
        let preview = diff_preview("a", b"same\n", "a", Some(b"same\n".as_slice()));
        assert_eq!(
            preview,
            Preview::Identical {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn test_diff_preview() {
        let preview = diff_preview(
            "python-gitignore",
            b"__pycache__/\n.env\nvenv/\n",
            ".gitignore",
            Some(b"__pycache__/\nnode_modules/\n".as_slice()),
        );

        let Preview::Diff { diff, .. } = &preview else {
            panic!("expected a diff, got {:?}", preview);
        };
        assert!(diff.contains("--- current: .gitignore"));
        assert!(diff.contains("+++ template: python-gitignore"));
        assert!(diff.contains("-node_modules/"));
        assert!(diff.contains("+.env"));
        assert!(diff.contains(" __pycache__/"));
    }

    #[test]
    fn test_is_binary() {
        assert!(is_binary(b"PK\x03\x04\0\0"));
        assert!(!is_binary("plain text, ünïcode".as_bytes()));
    }

    #[test]
    fn test_binary_content_is_lossy() {
        let preview = diff_preview("bin", &[0xff, b'\n'], "bin", Some(b"text\n".as_slice()));
        assert!(matches!(preview, Preview::Diff { .. }));
    }
}
