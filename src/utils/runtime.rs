use anyhow::Result;

/// Every callback of the tracker runs on this one thread, so store operations never
/// interleave.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
