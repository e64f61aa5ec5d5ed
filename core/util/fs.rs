//! Small async helpers over `tokio::fs` for moving package directories around.
//!
//! Every relative path handed out by this module uses `/` as its separator, regardless of the
//! host platform, since that is the format stored in package manifests.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Lists every file under `root`, as sorted relative paths.
///
/// A missing `root` is an error, an empty one yields an empty list.
pub(crate) async fn list_files(root: &Path) -> io::Result<Vec<String>> {
    let mut files = vec![];
    let mut dirs = vec![root.to_path_buf()];

    while let Some(dir) = dirs.pop() {
        let mut read_dir = fs::read_dir(&dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                dirs.push(path);
                continue;
            }
            if let Ok(relative) = path.strip_prefix(root) {
                files.push(to_slash_path(relative));
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Joins a `/`-separated relative path onto `base`, segment by segment.
pub(crate) fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}

pub(crate) fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<String>>()
        .join("/")
}

pub(crate) async fn dir_exists(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

pub(crate) async fn file_exists(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// A directory that does not exist counts as empty.
pub(crate) async fn is_dir_empty(path: &Path) -> io::Result<bool> {
    if !dir_exists(path).await {
        return Ok(true);
    }
    let mut read_dir = fs::read_dir(path).await?;
    Ok(read_dir.next_entry().await?.is_none())
}

pub(crate) async fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path).await {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

/// Copies a single file, creating any missing parent directories of `dst`.
pub(crate) async fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::copy(src, dst).await?;
    Ok(())
}

/// Copies the contents of `src` into `dst`. Whatever was in `dst` before is removed first.
pub(crate) async fn copy_dir(src: &Path, dst: &Path) -> io::Result<()> {
    remove_dir_if_exists(dst).await?;
    fs::create_dir_all(dst).await?;
    for file in list_files(src).await? {
        copy_file(&join_relative(src, &file), &join_relative(dst, &file)).await?;
    }
    Ok(())
}

/// Moves `src` to `dst` with a single rename, replacing anything already at `dst`.
///
/// Both paths are expected to live on the same filesystem, which holds for every environment
/// directory of one package.
pub(crate) async fn move_dir(src: &Path, dst: &Path) -> io::Result<()> {
    remove_dir_if_exists(dst).await?;
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::rename(src, dst).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[tokio::test]
    async fn lists_nested_files_with_forward_slashes() {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("b.txt").write_str("b").unwrap();
        root.child("sub/a.txt").write_str("a").unwrap();
        root.child("sub/deeper/c.bin").write_binary(&[0, 1, 2]).unwrap();
        root.child("empty").create_dir_all().unwrap();

        let files = list_files(root.path()).await.unwrap();

        assert_eq!(files, vec!["b.txt", "sub/a.txt", "sub/deeper/c.bin"]);
    }

    #[tokio::test]
    async fn copy_dir_replaces_destination() {
        let src = assert_fs::TempDir::new().unwrap();
        let dst = assert_fs::TempDir::new().unwrap();
        src.child("sub/a.txt").write_str("new").unwrap();
        dst.child("stale.txt").write_str("old").unwrap();

        copy_dir(src.path(), dst.path()).await.unwrap();

        dst.child("sub/a.txt").assert("new");
        assert!(!dst.child("stale.txt").exists());
    }

    #[tokio::test]
    async fn missing_directories_count_as_empty() {
        let root = assert_fs::TempDir::new().unwrap();
        assert!(is_dir_empty(&root.path().join("nope")).await.unwrap());
        assert!(is_dir_empty(root.path()).await.unwrap());

        root.child("a.txt").touch().unwrap();
        assert!(!is_dir_empty(root.path()).await.unwrap());
    }

    #[tokio::test]
    async fn move_dir_overwrites_target() {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("from/a.txt").write_str("fresh").unwrap();
        root.child("to/old.txt").write_str("old").unwrap();

        move_dir(&root.path().join("from"), &root.path().join("to"))
            .await
            .unwrap();

        root.child("to/a.txt").assert("fresh");
        assert!(!root.child("to/old.txt").exists());
        assert!(!root.child("from").exists());
    }

    #[test]
    fn joins_slash_separated_paths() {
        let path = join_relative(Path::new("/base"), "sub/b.txt");
        assert_eq!(path, Path::new("/base").join("sub").join("b.txt"));
    }
}
