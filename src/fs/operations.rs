use std::{io::ErrorKind, path::Path};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::trace;

/// Reads the whole file under a shared lock. A missing file is not an error, it simply has no
/// contents yet.
pub async fn read_locked(path: &Path) -> Result<Option<String>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    file.lock_shared()?;
    let mut contents = String::new();
    let result = file.read_to_string(&mut contents).await;
    file.unlock_async().await?;
    result?;
    trace!("Read {} bytes from {path:?}", contents.len());
    Ok(Some(contents))
}

/// Replaces the contents of a file under an exclusive lock. Truncation happens only after the
/// lock is held, so a reader never observes a half-cleared file.
pub async fn write_locked(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    // Semi-safe acquire-release for a file
    file.lock_exclusive()?;
    let result = overwrite(&mut file, contents).await;
    file.unlock_async().await?;
    result?;
    trace!("Wrote {} bytes to {path:?}", contents.len());
    Ok(())
}

/// Reads, changes and rewrites a file while holding one exclusive lock, so no other reader or
/// writer can interleave. A missing file is created and handed to `change` as empty contents.
/// Nothing is written when `change` fails.
pub async fn modify_locked<R>(
    path: &Path,
    change: impl FnOnce(&str) -> anyhow::Result<(Vec<u8>, R)>,
) -> anyhow::Result<R> {
    let mut file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    file.lock_exclusive()?;
    let result = read_change_write(&mut file, change).await;
    file.unlock_async().await?;
    trace!("Modified {path:?}");
    result
}

async fn read_change_write<R>(
    file: &mut File,
    change: impl FnOnce(&str) -> anyhow::Result<(Vec<u8>, R)>,
) -> anyhow::Result<R> {
    let mut contents = String::new();
    file.read_to_string(&mut contents).await?;
    let (buffer, value) = change(&contents)?;
    overwrite(file, &buffer).await?;
    Ok(value)
}

async fn overwrite(file: &mut File, contents: &[u8]) -> Result<(), io::Error> {
    file.set_len(0).await?;
    file.rewind().await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_data().await
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::fs::operations::{modify_locked, read_locked, write_locked};

    #[tokio::test]
    async fn test_read_missing_file() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_locked(&dir.path().join("missing.json")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_then_read() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("value.json");
        write_locked(&path, b"[1,2,3]").await?;
        assert_eq!(read_locked(&path).await?.as_deref(), Some("[1,2,3]"));
        Ok(())
    }

    #[tokio::test]
    async fn test_shorter_write_leaves_no_tail() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("value.json");
        write_locked(&path, b"a much longer first value").await?;
        write_locked(&path, b"[]").await?;
        assert_eq!(read_locked(&path).await?.as_deref(), Some("[]"));
        Ok(())
    }

    #[tokio::test]
    async fn test_modify_creates_and_rewrites() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("value.txt");
        let seen = modify_locked(&path, |contents| {
            Ok((b"first value".to_vec(), contents.to_owned()))
        })
        .await?;
        assert_eq!(seen, "");

        let seen = modify_locked(&path, |contents| Ok((b"second".to_vec(), contents.to_owned())))
            .await?;
        assert_eq!(seen, "first value");
        assert_eq!(read_locked(&path).await?.as_deref(), Some("second"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_modify_keeps_contents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("value.txt");
        write_locked(&path, b"kept").await?;
        let result: Result<()> =
            modify_locked(&path, |_| Err(anyhow::anyhow!("rejected"))).await;
        assert!(result.is_err());
        assert_eq!(read_locked(&path).await?.as_deref(), Some("kept"));
        Ok(())
    }
}
