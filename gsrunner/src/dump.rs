/*
    Dumps are recognized by name only. The runner itself lists the dump directory, sorts it by
    file name, and takes every `count`-th entry starting at its batch id before filtering out
    anything that is not a dump. The helpers here follow the same rule so the harness can tell
    ahead of time what each batch is going to pick up.
*/
use crate::models::batch::Batch;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Suffixes the runner accepts, compared case-insensitively.
pub const GS_EXTENSIONS: [&str; 3] = [".gs", ".gs.xz", ".gs.zst"];

/// Logical dump name: the file name with its dump suffix stripped.
///
/// # Examples
/// ```
/// use gsrunner::dump::get_gs_name;
/// assert_eq!(get_gs_name("/a/b/foo.gs.xz").as_deref(), Some("foo"));
/// assert_eq!(get_gs_name("notadump.txt"), None);
/// ```
pub fn get_gs_name(path: impl AsRef<Path>) -> Option<String> {
    let name = path.as_ref().file_name()?.to_str()?;
    let lower = name.to_ascii_lowercase();
    GS_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| name[..name.len() - ext.len()].to_owned())
}

pub fn is_gs_dump(path: impl AsRef<Path>) -> bool {
    get_gs_name(path).is_some()
}

/// Every regular file in `dir`, sorted by file name. Not filtered: the runner strides over the
/// full listing.
pub fn list_dumps(dir: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// The dumps a runner started with `batch` will replay out of a sorted listing.
pub fn batch_dumps(files: &[PathBuf], batch: Batch) -> Vec<PathBuf> {
    files
        .iter()
        .skip(batch.id() as usize)
        .step_by(batch.count() as usize)
        .filter(|path| is_gs_dump(path))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn strips_known_suffixes() {
        assert_eq!(get_gs_name("/a/b/foo.gs.xz").as_deref(), Some("foo"));
        assert_eq!(get_gs_name("C.gs").as_deref(), Some("C"));
        assert_eq!(get_gs_name("bar.gs.zst").as_deref(), Some("bar"));
        assert_eq!(get_gs_name("notadump.txt"), None);
    }

    #[test]
    fn suffix_match_ignores_case_but_keeps_name() {
        assert_eq!(get_gs_name("Final Fantasy X.GS.XZ").as_deref(), Some("Final Fantasy X"));
        assert!(is_gs_dump("dump.Gs"));
        assert!(!is_gs_dump("dump.gsx"));
        assert!(!is_gs_dump("dump.xz"));
    }

    #[test]
    fn lists_files_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.gs", "a.gs.xz", "b.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.gs")).unwrap();

        let names: Vec<_> = list_dumps(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.gs.xz", "b.txt", "c.gs"]);
    }

    #[test]
    fn listing_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_dumps(dir.path().join("missing")).is_err());
    }

    #[test]
    fn batches_stride_over_full_listing() {
        let files: Vec<PathBuf> = ["0.gs", "1.txt", "2.gs", "3.gs.zst", "4.gs"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let first = batch_dumps(&files, Batch::new(2, 0).unwrap());
        assert_eq!(first, vec![PathBuf::from("0.gs"), PathBuf::from("2.gs"), PathBuf::from("4.gs")]);

        // index 1 is not a dump, so batch 1 only gets index 3
        let second = batch_dumps(&files, Batch::new(2, 1).unwrap());
        assert_eq!(second, vec![PathBuf::from("3.gs.zst")]);
    }

    #[test]
    fn batches_cover_every_dump_once() {
        let files: Vec<PathBuf> = (0..23).map(|i| PathBuf::from(format!("{i:02}.gs"))).collect();
        let count = 4;
        let mut seen = HashSet::new();
        let mut total = 0;
        for id in 0..count {
            let assigned = batch_dumps(&files, Batch::new(count, id).unwrap());
            total += assigned.len();
            seen.extend(assigned);
        }
        assert_eq!(total, files.len());
        assert_eq!(seen.len(), files.len());
        assert_eq!(batch_dumps(&files, Batch::single()), files);
    }
}
