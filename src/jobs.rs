//! Job discovery and partitioning.
//!
//! A [`JobSet`] is the sorted list of files found in one working directory.
//! [`partition`] splits it into at most `worker_count` contiguous [`Batch`]es.

use crate::error::{MeshBatchError, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One file to convert, identified by its name relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct JobItem(String);

impl JobItem {
    /// Create a job item from a bare filename.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as sent over the worker pipe.
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Source path inside `source_dir`.
    pub fn source_path(&self, source_dir: &Path) -> PathBuf {
        source_dir.join(&self.0)
    }

    /// Destination path inside `dest_dir` (same filename).
    pub fn destination_path(&self, dest_dir: &Path) -> PathBuf {
        dest_dir.join(&self.0)
    }
}

impl std::fmt::Display for JobItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sorted, duplicate-free list of job items for one working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSet {
    items: Vec<JobItem>,
}

impl JobSet {
    /// Build a job set from identifiers in any order.
    ///
    /// Sorting is the normalizing step; duplicates collapse.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<JobItem> = ids.into_iter().map(JobItem::new).collect();
        Self {
            items: unique.into_iter().collect(),
        }
    }

    /// List the regular files in `dir` whose extension matches `extension`
    /// (case-insensitive).
    pub fn scan(dir: &Path, extension: &str) -> Result<Self> {
        if !dir.is_dir() {
            return Err(MeshBatchError::MissingSource(dir.to_path_buf()));
        }

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            // Follows symlinks; dangling links are not jobs.
            if !entry.path().is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(name = ?raw, "Skipping file with non-UTF-8 name");
                    continue;
                }
            };
            if name.contains(['\n', '\r']) {
                tracing::warn!(name = ?name, "Skipping file with a line break in its name");
                continue;
            }
            if has_extension(&name, extension) {
                ids.push(name);
            }
        }

        Ok(Self::from_ids(ids))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[JobItem] {
        &self.items
    }
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Contiguous slice of a job set owned by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Creation index, starting at 0.
    pub index: usize,
    pub items: Vec<JobItem>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Split `jobs` into consecutive batches of `ceil(len / worker_count)` items.
///
/// Returns at most `worker_count` non-empty batches in input order, and no
/// batches at all for an empty job set.
pub fn partition(jobs: &JobSet, worker_count: usize) -> Result<Vec<Batch>> {
    if worker_count < 1 {
        return Err(MeshBatchError::InvalidConfig(
            "worker count must be at least 1".into(),
        ));
    }
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = jobs.len().div_ceil(worker_count);
    Ok(jobs
        .items()
        .chunks(batch_size)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            items: chunk.to_vec(),
        })
        .collect())
}

/// Create the destination root if it does not exist yet.
///
/// Safe to call repeatedly; an existing directory is not an error.
pub fn ensure_destination(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ids(n: usize) -> JobSet {
        JobSet::from_ids((0..n).map(|i| format!("mesh_{:03}.obj", i)))
    }

    fn sizes(batches: &[Batch]) -> Vec<usize> {
        batches.iter().map(Batch::len).collect()
    }

    #[test]
    fn test_partition_ten_items_three_workers() {
        let batches = partition(&ids(10), 3).unwrap();
        assert_eq!(sizes(&batches), vec![4, 4, 2]);
        assert_eq!(
            batches.iter().map(|b| b.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_partition_empty() {
        let batches = partition(&JobSet::default(), 8).unwrap();
        assert!(batches.is_empty());
    }

    #[test]
    fn test_partition_more_workers_than_items() {
        let batches = partition(&ids(2), 5).unwrap();
        assert_eq!(sizes(&batches), vec![1, 1]);
    }

    #[test]
    fn test_partition_uneven_tail_skips_empty_chunks() {
        // ceil(5/4) = 2 -> [2, 2, 1]; the fourth worker gets nothing
        let batches = partition(&ids(5), 4).unwrap();
        assert_eq!(sizes(&batches), vec![2, 2, 1]);
    }

    #[test]
    fn test_partition_single_worker() {
        let batches = partition(&ids(7), 1).unwrap();
        assert_eq!(sizes(&batches), vec![7]);
    }

    #[test]
    fn test_partition_rejects_zero_workers() {
        assert!(matches!(
            partition(&ids(3), 0),
            Err(MeshBatchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_job_set_sorts_and_dedups() {
        let set = JobSet::from_ids(["b.obj", "a.obj", "c.obj", "a.obj"]);
        let names: Vec<_> = set.items().iter().map(JobItem::id).collect();
        assert_eq!(names, vec!["a.obj", "b.obj", "c.obj"]);
    }

    #[test]
    fn test_partition_deterministic_for_unsorted_listing() {
        let first = partition(&JobSet::from_ids(["z.obj", "m.obj", "a.obj", "q.obj"]), 2).unwrap();
        let second = partition(&JobSet::from_ids(["q.obj", "a.obj", "z.obj", "m.obj"]), 2).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].items[0].id(), "a.obj");
    }

    #[test]
    fn test_job_item_paths() {
        let item = JobItem::new("cube.obj");
        assert_eq!(
            item.source_path(Path::new("/in")),
            PathBuf::from("/in/cube.obj")
        );
        assert_eq!(
            item.destination_path(Path::new("/out")),
            PathBuf::from("/out/cube.obj")
        );
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let dir = tempdir().unwrap();
        for name in ["b.obj", "A.OBJ", "notes.txt", "c.obj.bak"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.obj")).unwrap();

        let set = JobSet::scan(dir.path(), "obj").unwrap();
        let names: Vec<_> = set.items().iter().map(JobItem::id).collect();
        assert_eq!(names, vec!["A.OBJ", "b.obj"]);
    }

    #[test]
    fn test_scan_skips_names_with_line_breaks() {
        let dir = tempdir().unwrap();
        for name in ["a.obj", "b\nc.obj", "d\r.obj", "e.obj"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let set = JobSet::scan(dir.path(), "obj").unwrap();
        let names: Vec<_> = set.items().iter().map(JobItem::id).collect();
        assert_eq!(names, vec!["a.obj", "e.obj"]);
        assert_eq!(partition(&set, 1).unwrap()[0].len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_follows_symlinks() {
        let dir = tempdir().unwrap();
        let store = tempdir().unwrap();
        std::fs::write(store.path().join("real.obj"), "").unwrap();
        std::os::unix::fs::symlink(store.path().join("real.obj"), dir.path().join("link.obj"))
            .unwrap();
        std::os::unix::fs::symlink(store.path().join("gone.obj"), dir.path().join("dangling.obj"))
            .unwrap();
        std::os::unix::fs::symlink(store.path(), dir.path().join("dir.obj")).unwrap();

        let set = JobSet::scan(dir.path(), "obj").unwrap();
        let names: Vec<_> = set.items().iter().map(JobItem::id).collect();
        assert_eq!(names, vec!["link.obj"]);
    }

    #[test]
    fn test_scan_missing_directory() {
        let err = JobSet::scan(Path::new("/no/such/meshes"), "obj").unwrap_err();
        assert!(matches!(err, MeshBatchError::MissingSource(_)));
    }

    #[test]
    fn test_ensure_destination_idempotent() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out").join("nested");
        ensure_destination(&dest).unwrap();
        ensure_destination(&dest).unwrap();
        assert!(dest.is_dir());
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn partition_covers_jobs_exactly_once(n in 0usize..300, w in 1usize..70) {
                let jobs = ids(n);
                let batches = partition(&jobs, w).unwrap();

                let expected_batches = if n == 0 { 0 } else { n.div_ceil(n.div_ceil(w)) };
                prop_assert_eq!(batches.len(), expected_batches);
                prop_assert!(batches.len() <= w.min(n));

                let limit = if n == 0 { 0 } else { n.div_ceil(w) };
                for batch in &batches {
                    prop_assert!(!batch.is_empty());
                    prop_assert!(batch.len() <= limit);
                }

                let flattened: Vec<JobItem> =
                    batches.into_iter().flat_map(|b| b.items).collect();
                prop_assert_eq!(flattened.as_slice(), jobs.items());
            }
        }
    }
}
