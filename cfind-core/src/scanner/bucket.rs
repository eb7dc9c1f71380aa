use std::path::{Path, PathBuf};

use crate::registry::ExtractorId;

/// Files assigned to one extractor, in scan order
#[derive(Debug, Clone)]
pub struct Bucket {
    pub extractor: ExtractorId,
    pub files: Vec<PathBuf>,
}

/// Buckets in the order their extractor first received a file
#[derive(Debug, Default)]
pub struct SearchBuckets {
    buckets: Vec<Bucket>,
}

impl SearchBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file to its extractor's bucket, creating the bucket on first use
    pub fn push(&mut self, extractor: ExtractorId, path: PathBuf) {
        match self.buckets.iter_mut().find(|b| b.extractor == extractor) {
            Some(bucket) => bucket.files.push(path),
            None => self.buckets.push(Bucket {
                extractor,
                files: vec![path],
            }),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bucket> {
        self.buckets.iter()
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of files across all buckets
    pub fn file_count(&self) -> usize {
        self.buckets.iter().map(|b| b.files.len()).sum()
    }

    pub fn files_for(&self, extractor: ExtractorId) -> Option<&[PathBuf]> {
        self.buckets
            .iter()
            .find(|b| b.extractor == extractor)
            .map(|b| b.files.as_slice())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.buckets
            .iter()
            .any(|b| b.files.iter().any(|f| f == path))
    }
}

impl<'a> IntoIterator for &'a SearchBuckets {
    type Item = &'a Bucket;
    type IntoIter = std::slice::Iter<'a, Bucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}
