//! Source material loaders for index ingestion.

use std::path::PathBuf;

use crate::document::Page;
use crate::error::{RagError, Result};

/// Provides the paginated source text the index is built from.
///
/// Loading is synchronous: the index invokes it once, inline, when a query
/// finds the collection empty.
pub trait SourceLoader: Send + Sync {
    /// Load every source page, in document order.
    ///
    /// An empty result is not an error here; the index treats it as
    /// "no source material" and reports unavailability at query time.
    fn load_pages(&self) -> Result<Vec<Page>>;
}

/// Loads pages by extracting text from every PDF in a directory.
///
/// Files are processed in name order so page numbering (per file, 1-based)
/// and downstream chunk ids are deterministic. A file that fails to extract
/// is logged and skipped rather than failing the whole ingestion.
#[derive(Debug, Clone)]
pub struct PdfDirSource {
    dir: PathBuf,
}

impl PdfDirSource {
    /// Create a loader over the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SourceLoader for PdfDirSource {
    fn load_pages(&self) -> Result<Vec<Page>> {
        let mut pdf_paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)
            .map_err(|e| RagError::SourceError(format!("{}: {e}", self.dir.display())))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            })
            .collect();
        pdf_paths.sort();

        if pdf_paths.is_empty() {
            tracing::warn!(dir = %self.dir.display(), "no PDF files found in data folder");
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for path in &pdf_paths {
            tracing::info!(file = %path.display(), "extracting source document");
            match pdf_extract::extract_text_by_pages(path) {
                Ok(page_texts) => {
                    let before = pages.len();
                    pages.extend(
                        page_texts
                            .into_iter()
                            .enumerate()
                            .filter(|(_, text)| !text.trim().is_empty())
                            .map(|(idx, text)| Page::new(idx as u32 + 1, text)),
                    );
                    tracing::info!(
                        file = %path.display(),
                        pages = pages.len() - before,
                        "extracted pages"
                    );
                }
                Err(e) => {
                    tracing::error!(file = %path.display(), error = %e, "pdf extraction failed");
                }
            }
        }

        Ok(pages)
    }
}

/// A fixed in-memory page set, for tests and embedded fixtures.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pages: Vec<Page>,
}

impl StaticSource {
    /// Create a loader that returns the given pages.
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }
}

impl SourceLoader for StaticSource {
    fn load_pages(&self) -> Result<Vec<Page>> {
        Ok(self.pages.clone())
    }
}
