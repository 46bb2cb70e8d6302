//! Static extension → language table.

use std::path::Path;

/// Looks up the language tag for a file path by extension.
///
/// Unknown extensions yield `None`; the buffer simply carries no language
/// tag in that case.
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    language_for_extension(ext)
}

/// Looks up the language tag for a bare extension.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext.to_lowercase().as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "html" | "htm" => "html",
        "css" | "scss" | "sass" => "css",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" | "markdown" => "markdown",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" | "cxx" => "cpp",
        "go" => "go",
        "java" => "java",
        "rb" => "ruby",
        "sh" | "bash" | "zsh" => "bash",
        "sql" => "sql",
        "xml" => "xml",
        "lua" => "lua",
        _ => return None,
    };
    Some(lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_resolve() {
        assert_eq!(language_for_path(Path::new("/a.ts")), Some("typescript"));
        assert_eq!(language_for_path(Path::new("lib.rs")), Some("rust"));
        assert_eq!(language_for_path(Path::new("x.YAML")), Some("yaml"));
    }

    #[test]
    fn unknown_or_missing_extensions_are_none() {
        assert_eq!(language_for_path(Path::new("a.xyz")), None);
        assert_eq!(language_for_path(Path::new("Makefile")), None);
    }
}
