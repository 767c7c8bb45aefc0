use crate::error::{Error, Result};

/// Split `items` into contiguous chunks of `chunk_size`; the last chunk holds
/// the remainder. Empty input yields no chunks.
pub fn slice_batch<T>(items: &[T], chunk_size: usize) -> Result<Vec<&[T]>> {
    if chunk_size == 0 {
        return Err(Error::InvalidArgument(
            "batch chunk size must be positive".into(),
        ));
    }
    Ok(items.chunks(chunk_size).collect())
}
