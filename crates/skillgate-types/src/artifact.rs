use serde::{Deserialize, Serialize};
use std::path::Path;

/// A source file under review. Immutable for one matching pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    path: String,
    content: String,
    language: String,
}

impl Artifact {
    /// Create an artifact, inferring the language tag from the path
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        // Globs are written with forward slashes
        let path = path.into().replace('\\', "/");
        let language = infer_language(&path).to_string();
        Self {
            path,
            content: content.into(),
            language,
        }
    }

    /// Override the inferred language tag
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

/// Infer a language tag from a file path (extension or well-known file name)
pub fn infer_language(path: &str) -> &'static str {
    let file = Path::new(path);
    let file_name = file.file_name().and_then(|n| n.to_str()).unwrap_or("");

    match file_name {
        "Dockerfile" => return "dockerfile",
        "Makefile" => return "make",
        "Cargo.toml" => return "toml",
        _ => {}
    }

    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "rs" => "rust",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "scala" => "scala",
        "py" => "python",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "go" => "go",
        "rb" => "ruby",
        "cs" => "csharp",
        "c" => "c",
        "cc" | "cpp" | "cxx" | "h" | "hpp" => "cpp",
        "swift" => "swift",
        "php" => "php",
        "sql" => "sql",
        "sh" | "bash" | "zsh" => "shell",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "json" => "json",
        "xml" => "xml",
        "md" | "markdown" => "markdown",
        _ => "unknown",
    }
}
