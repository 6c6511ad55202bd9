use futures::AsyncRead;
use pin_project::pin_project;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Reads a fixed size header of `N` bytes.
///
/// Resolves to `None` when the stream ends before the first byte, and to an
/// `UnexpectedEof` error when it ends in the middle of the header.
#[pin_project]
pub struct ReadHeaderFuture<'a, R: ?Sized, const N: usize> {
    reader: Pin<&'a mut R>,
    buffer: [u8; N],
    num_read: usize,
}

impl<'a, R, const N: usize> ReadHeaderFuture<'a, R, N>
where
    R: AsyncRead + ?Sized,
{
    pub fn new(reader: Pin<&'a mut R>) -> Self {
        ReadHeaderFuture {
            reader,
            buffer: [0; N],
            num_read: 0,
        }
    }
}

impl<R, const N: usize> Future for ReadHeaderFuture<'_, R, N>
where
    R: AsyncRead + ?Sized,
{
    type Output = io::Result<Option<[u8; N]>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        while *this.num_read < N {
            match this
                .reader
                .as_mut()
                .poll_read(cx, &mut this.buffer[*this.num_read..])
            {
                Poll::Ready(Ok(0)) if *this.num_read == 0 => return Poll::Ready(Ok(None)),
                Poll::Ready(Ok(0)) => {
                    return Poll::Ready(Err(io::Error::from(io::ErrorKind::UnexpectedEof)))
                }
                Poll::Ready(Ok(n)) => *this.num_read += n,
                Poll::Ready(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }
        Poll::Ready(Ok(Some(*this.buffer)))
    }
}
