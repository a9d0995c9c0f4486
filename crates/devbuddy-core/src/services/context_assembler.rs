use std::fmt::Write;

use github_client::GitTreeItem;
use tracing::debug;

use super::persona::build_persona;
use crate::models::ProjectFile;

/// Maximum number of tree paths listed in the context.
pub const TREE_LISTING_LIMIT: usize = 500;

const TRUNCATED_MARKER: &str = "[truncated]";
const OMITTED_MARKER: &str = "[content omitted]";

const INTERACTION_INSTRUCTIONS: &str = "\
INTERACTION INSTRUCTIONS:
1. You have access to the project structure (file list) and to the content of the open files.
2. PLANNING: If the request is complex, start by planning. Draw flows (Mermaid) or describe the architecture before writing code.
3. IMPLEMENTATION: Provide complete, working code. Do not skip important parts.
4. REFACTORING: If you see poor code in the open files, suggest improvements.
";

/// Builds the unbounded context: tree listing plus every open file in full.
pub fn build_context(open_files: &[ProjectFile], tree: &[GitTreeItem]) -> String {
    ContextAssembler::default().build_context(open_files, tree)
}

/// Assembles the per-turn prompt payload.
///
/// The tree listing is always capped at [`TREE_LISTING_LIMIT`] entries. Open
/// file content is capped only when a byte budget is configured; files past
/// the budget keep their header so the model still knows they are open.
#[derive(Clone, Debug, Default)]
pub struct ContextAssembler {
    open_file_budget: Option<usize>,
}

impl ContextAssembler {
    pub fn new(open_file_budget: Option<usize>) -> Self {
        Self { open_file_budget }
    }

    pub fn open_file_budget(&self) -> Option<usize> {
        self.open_file_budget
    }

    pub fn build_context(&self, open_files: &[ProjectFile], tree: &[GitTreeItem]) -> String {
        let mut out = String::from("REPOSITORY FILE STRUCTURE (GIT):\n");
        write_tree_listing(&mut out, tree);

        out.push_str("\nFILES OPEN IN THE IDE (with content):\n");
        let mut remaining = self.open_file_budget;
        for file in open_files {
            let body = match remaining.as_mut() {
                None => file.content.as_str(),
                Some(left) => take_budget(&file.content, left),
            };
            write_file_block(&mut out, file, body, file.content.len());
        }
        out
    }

    /// Wrap `user_text` with persona, context and the focused file path into
    /// the single composite message sent for this turn.
    pub fn build_prompt(
        &self,
        focus: &ProjectFile,
        open_files: &[ProjectFile],
        tree: &[GitTreeItem],
        user_text: &str,
    ) -> String {
        let persona = build_persona(&focus.language);
        let context = self.build_context(open_files, tree);
        debug!(
            focus = %focus.path,
            language = %focus.language,
            open_files = open_files.len(),
            tree_items = tree.len(),
            "Assembled chat context"
        );

        format!(
            "{persona}\nDEVELOPMENT ENVIRONMENT CONTEXT:\n{context}\n\
             FILE CURRENTLY IN FOCUS: {}\n\n{INTERACTION_INSTRUCTIONS}\n\
             USER QUESTION:\n{user_text}\n",
            focus.path
        )
    }
}

fn write_tree_listing(out: &mut String, tree: &[GitTreeItem]) {
    for item in tree.iter().take(TREE_LISTING_LIMIT) {
        let _ = writeln!(out, "- {}", item.path);
    }
    if tree.len() > TREE_LISTING_LIMIT {
        let _ = writeln!(out, "... (+{} files)", tree.len() - TREE_LISTING_LIMIT);
    }
}

fn write_file_block(out: &mut String, file: &ProjectFile, body: &str, full_len: usize) {
    let _ = writeln!(
        out,
        "\n--- FILE CONTENT: {} ({}) ---",
        file.path, file.language
    );
    let _ = writeln!(out, "```{}", file.language);
    if body.is_empty() && full_len > 0 {
        out.push_str(OMITTED_MARKER);
        out.push('\n');
    } else {
        out.push_str(body);
        if body.len() < full_len {
            out.push('\n');
            out.push_str(TRUNCATED_MARKER);
        }
        out.push('\n');
    }
    out.push_str("```\n");
    let _ = writeln!(out, "--- END OF FILE: {} ---", file.path);
}

/// Longest prefix of `content` that fits in `left` bytes on a char boundary.
fn take_budget<'a>(content: &'a str, left: &mut usize) -> &'a str {
    if content.len() <= *left {
        *left -= content.len();
        return content;
    }
    let mut end = *left;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    *left = 0;
    &content[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(n: usize) -> Vec<GitTreeItem> {
        (0..n)
            .map(|i| GitTreeItem::blob(format!("src/file_{i}.rs"), format!("sha{i}")))
            .collect()
    }

    fn listing_lines(context: &str) -> usize {
        context.lines().filter(|l| l.starts_with("- ")).count()
    }

    #[test]
    fn test_tree_of_501_is_truncated_with_note() {
        let context = build_context(&[], &tree(501));
        assert_eq!(listing_lines(&context), 500);
        assert!(context.contains("... (+1 files)"));
        assert!(context.contains("- src/file_499.rs"));
        assert!(!context.contains("- src/file_500.rs"));
    }

    #[test]
    fn test_tree_within_limit_has_no_note() {
        let context = build_context(&[], &tree(500));
        assert_eq!(listing_lines(&context), 500);
        assert!(!context.contains("... (+"));
    }

    #[test]
    fn test_empty_tree_still_builds() {
        let file = ProjectFile::new("local", "scratch.py", "python", "print(1)");
        let context = build_context(std::slice::from_ref(&file), &[]);
        assert_eq!(listing_lines(&context), 0);
        assert!(context.contains("--- FILE CONTENT: scratch.py (python) ---"));
        assert!(context.contains("```python\nprint(1)\n```"));
        assert!(context.contains("--- END OF FILE: scratch.py ---"));
    }

    #[test]
    fn test_open_files_keep_sequence_order() {
        let a = ProjectFile::new("a", "b.rs", "rust", "fn b() {}");
        let b = ProjectFile::new("b", "a.rs", "rust", "fn a() {}");
        let context = build_context(&[a, b], &[]);
        let first = context.find("FILE CONTENT: b.rs").unwrap();
        let second = context.find("FILE CONTENT: a.rs").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_budget_truncates_then_omits() {
        let a = ProjectFile::new("a", "a.txt", "plaintext", "0123456789");
        let b = ProjectFile::new("b", "b.txt", "plaintext", "abcdefghij");
        let c = ProjectFile::new("c", "c.txt", "plaintext", "klmnop");
        let context = ContextAssembler::new(Some(14)).build_context(&[a, b, c], &[]);

        assert!(context.contains("0123456789\n```"));
        assert!(context.contains("abcd\n[truncated]\n```"));
        assert!(!context.contains("abcde"));
        assert!(context.contains("--- FILE CONTENT: c.txt (plaintext) ---"));
        assert!(context.contains("```plaintext\n[content omitted]\n```"));
    }

    #[test]
    fn test_budget_respects_char_boundaries() {
        let mut left = 2;
        assert_eq!(take_budget("é!", &mut left), "é");
        let mut left = 1;
        assert_eq!(take_budget("é!", &mut left), "");
        assert_eq!(left, 0);
    }

    #[test]
    fn test_prompt_wraps_question_with_persona_and_focus() {
        let focus = ProjectFile::new("f", "api/server.go", "go", "package main");
        let prompt = ContextAssembler::default().build_prompt(
            &focus,
            std::slice::from_ref(&focus),
            &tree(3),
            "why does this leak?",
        );

        assert!(prompt.contains("SYSTEMS ENGINEER"));
        assert!(prompt.contains("FILE CURRENTLY IN FOCUS: api/server.go"));
        assert!(prompt.contains("- src/file_2.rs"));
        assert!(prompt.trim_end().ends_with("why does this leak?"));
    }
}
