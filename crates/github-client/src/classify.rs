/// Extensions that never open as text in the editor.
const BINARY_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".ico", ".pdf", ".zip", ".woff", ".woff2", ".ttf", ".eot",
    ".mp4", ".mov",
];

/// Extension to language tag, checked in order.
const LANGUAGE_BY_EXTENSION: &[(&[&str], &str)] = &[
    (&[".ts", ".tsx"], "typescript"),
    (&[".js", ".jsx"], "javascript"),
    (&[".css"], "css"),
    (&[".html"], "html"),
    (&[".json"], "json"),
    (&[".py"], "python"),
    (&[".go"], "go"),
    (&[".rs"], "rust"),
    (&[".java"], "java"),
    (&[".md"], "markdown"),
];

/// Returns true when the path looks like an image, archive, font or video.
pub fn is_binary(path: &str) -> bool {
    let lower = path.to_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Maps a file name to the language tag used by the editor and the persona
/// selection. Unknown extensions fall back to `plaintext`.
pub fn detect_language(filename: &str) -> &'static str {
    LANGUAGE_BY_EXTENSION
        .iter()
        .find(|(exts, _)| exts.iter().any(|ext| filename.ends_with(ext)))
        .map(|(_, language)| *language)
        .unwrap_or("plaintext")
}
