use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub source: String,
    pub text: String,
}

const SUPPORTED_EXTENSIONS: [&str; 4] = ["pdf", "txt", "md", "markdown"];

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_file() {
        if is_supported(path) {
            files.push(path.to_path_buf());
        }
        return Ok(());
    }

    let entries = fs::read_dir(path)
        .with_context(|| format!("Failed to read directory {}", path.display()))?;
    for entry in entries {
        collect_files(&entry?.path(), files)?;
    }
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        pdf_extract::extract_text(path)
            .map_err(|e| anyhow!("Failed to extract text from {}: {}", path.display(), e))
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Loads every supported file under `path` (or `path` itself), sorted by
/// path. Files with no text are skipped.
pub fn load_documents(path: &Path) -> Result<Vec<LoadedDocument>> {
    if !path.exists() {
        return Err(anyhow!("{} does not exist", path.display()));
    }

    let mut files = Vec::new();
    collect_files(path, &mut files)?;
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        let text = read_text(&file)?;
        if text.trim().is_empty() {
            log::warn!("Skipping {}: no extractable text", file.display());
            continue;
        }
        documents.push(LoadedDocument {
            source: file.display().to_string(),
            text,
        });
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_supported_files_recursively_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.txt"), "Gout is a form of arthritis.").unwrap();
        fs::write(dir.path().join("nested/a.md"), "# Asthma\nAirway inflammation.").unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();
        fs::write(dir.path().join("empty.txt"), "   ").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        let sources: Vec<&str> = docs.iter().map(|d| d.source.as_str()).collect();

        assert_eq!(docs.len(), 2);
        assert!(sources[0].ends_with("b.txt"));
        assert!(sources[1].ends_with("a.md"));
        assert_eq!(docs[0].text, "Gout is a form of arthritis.");
    }

    #[test]
    fn single_file_path_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.TXT");
        fs::write(&file, "Hypertension notes").unwrap();

        let docs = load_documents(&file).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(load_documents(Path::new("/definitely/not/here")).is_err());
    }
}
