//! Size-limited reader for upload paths.

use crate::traits::StorageError;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Error smuggled through the reader when the byte ceiling is crossed.
#[derive(Debug, thiserror::Error)]
#[error("read exceeded limit of {limit} bytes")]
pub struct SizeLimitReached {
    pub limit: u64,
}

/// Wraps an upload body and fails the read once more than `limit` bytes have
/// flowed through. Failing rather than truncating keeps a partial object
/// from ever reaching a backend as if it were complete.
pub struct LimitedReader<R> {
    inner: R,
    limit: u64,
    consumed: u64,
}

impl<R> LimitedReader<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        LimitedReader {
            inner,
            limit,
            consumed: 0,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for LimitedReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();

        match Pin::new(&mut self.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let read = (buf.filled().len() - before) as u64;
                self.consumed += read;

                if self.consumed > self.limit {
                    let limit = self.limit;
                    return Poll::Ready(Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        SizeLimitReached { limit },
                    )));
                }

                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

/// Rewrite an upload error that originated in a [`LimitedReader`] into the
/// contract's size-limit kind; any other error passes through unchanged.
pub fn map_size_limit(err: StorageError) -> StorageError {
    match err {
        StorageError::IoError(ref io_err) => match limit_from(io_err) {
            Some(limit) => StorageError::SizeLimitExceeded {
                size: limit + 1,
                limit,
            },
            None => err,
        },
        other => other,
    }
}

fn limit_from(err: &io::Error) -> Option<u64> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<SizeLimitReached>())
        .map(|reached| reached.limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_reads_under_limit_pass_through() {
        let mut reader = LimitedReader::new(&b"hello"[..], 16);
        let mut out = Vec::new();

        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");
    }

    #[tokio::test]
    async fn test_exceeding_limit_fails_instead_of_truncating() {
        let mut reader = LimitedReader::new(&b"hello, world"[..], 5);
        let mut out = Vec::new();

        let err = reader.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(limit_from(&err), Some(5));
    }

    #[tokio::test]
    async fn test_map_size_limit_rewrites_io_error() {
        let mut reader = LimitedReader::new(&b"hello, world"[..], 5);
        let mut out = Vec::new();
        let io_err = reader.read_to_end(&mut out).await.unwrap_err();

        let mapped = map_size_limit(StorageError::IoError(io_err));
        match mapped {
            StorageError::SizeLimitExceeded { limit, .. } => assert_eq!(limit, 5),
            other => panic!("expected SizeLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_map_size_limit_passes_other_errors() {
        let err = map_size_limit(StorageError::NotFound("k".to_string()));
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
