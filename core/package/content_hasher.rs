use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::util::fs::join_relative;

/// Computes the content hash of a package's data directory.
///
/// Each file contributes its relative `/`-separated path followed by the hex digest of its
/// contents. Paths are fed in sorted order, so the hash only depends on what is in the
/// directory, never on the order the filesystem lists it in.
pub struct ContentHasher;

impl ContentHasher {
    pub async fn hash<P>(data_dir: P, files: &[String]) -> Result<String, std::io::Error>
    where
        P: AsRef<Path>,
    {
        let mut sorted: Vec<&String> = files.iter().collect();
        sorted.sort();

        let mut s = Sha256::new();
        for file in sorted {
            s.update(file.as_bytes());
            let file_hash = Self::hash_file(&join_relative(data_dir.as_ref(), file)).await?;
            s.update(file_hash.as_bytes());
        }
        Ok(format!("{:x}", s.finalize()))
    }

    async fn hash_file(path: &Path) -> Result<String, std::io::Error> {
        let mut f = File::open(path).await?;
        let mut s = Sha256::new();
        let mut buffer = [0; 8192];
        loop {
            let len = f.read(&mut buffer).await?;
            if len == 0 {
                break;
            }
            s.update(&buffer[..len]);
        }
        Ok(format!("{:x}", s.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[tokio::test]
    async fn hash_ignores_listing_order() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("a.txt").write_str("a").unwrap();
        dir.child("sub/b.txt").write_str("b").unwrap();

        let forward = vec!["a.txt".to_string(), "sub/b.txt".to_string()];
        let backward = vec!["sub/b.txt".to_string(), "a.txt".to_string()];

        assert_eq!(
            ContentHasher::hash(dir.path(), &forward).await.unwrap(),
            ContentHasher::hash(dir.path(), &backward).await.unwrap()
        );
    }

    #[tokio::test]
    async fn hash_covers_paths_and_contents() {
        let one = assert_fs::TempDir::new().unwrap();
        one.child("a.txt").write_str("same").unwrap();
        let two = assert_fs::TempDir::new().unwrap();
        two.child("b.txt").write_str("same").unwrap();
        let three = assert_fs::TempDir::new().unwrap();
        three.child("a.txt").write_str("different").unwrap();

        let h1 = ContentHasher::hash(one.path(), &["a.txt".to_string()])
            .await
            .unwrap();
        let h2 = ContentHasher::hash(two.path(), &["b.txt".to_string()])
            .await
            .unwrap();
        let h3 = ContentHasher::hash(three.path(), &["a.txt".to_string()])
            .await
            .unwrap();

        assert_ne!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 64);
    }
}
