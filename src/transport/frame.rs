//! Socket framing: `TOKEN 0x20 PAYLOAD 0x0a`.

use std::io::{self, Write};

use crate::error::DeliveryError;

const SEPARATOR: u8 = 0x20;
const TERMINATOR: u8 = 0x0a;

/// Reusable buffer holding one frame at a time.
///
/// The buffer grows on demand up to `max_size` bytes. Frames that would not
/// fit are rejected before anything is written.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    max_size: usize,
}

impl FrameBuffer {
    pub fn new(initial_capacity: usize, max_size: usize) -> Self {
        Self {
            buf: Vec::with_capacity(initial_capacity.min(max_size)),
            max_size,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Size in bytes of the frame for `token` and `payload`.
    pub fn frame_len(token: &[u8], payload: &[u8]) -> Option<usize> {
        token.len().checked_add(payload.len())?.checked_add(2)
    }

    /// Replace the buffer contents with the frame for `payload`.
    pub fn fill(&mut self, token: &[u8], payload: &[u8]) -> Result<&[u8], DeliveryError> {
        let size = Self::frame_len(token, payload).unwrap_or(usize::MAX);
        if size > self.max_size {
            return Err(DeliveryError::PayloadTooLarge {
                size,
                capacity: self.max_size,
            });
        }
        self.buf.clear();
        self.buf.reserve(size);
        self.buf.extend_from_slice(token);
        self.buf.push(SEPARATOR);
        self.buf.extend_from_slice(payload);
        self.buf.push(TERMINATOR);
        Ok(&self.buf)
    }
}

/// Write all of `frame` to `writer`, re-issuing writes for any bytes a
/// partial write left behind, then flush.
///
/// Interrupted writes are retried. A write that accepts zero bytes fails with
/// [`io::ErrorKind::WriteZero`].
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, frame: &[u8]) -> io::Result<usize> {
    let mut remaining = frame;
    while !remaining.is_empty() {
        match writer.write(remaining) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!(
                        "connection accepted no bytes with {} of {} remaining",
                        remaining.len(),
                        frame.len()
                    ),
                ));
            }
            Ok(written) => remaining = &remaining[written..],
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    writer.flush()?;
    Ok(frame.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Trickle {
        out: Vec<u8>,
        calls: usize,
        interrupt_every: usize,
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.interrupt_every > 0 && self.calls % self.interrupt_every == 0 {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.out.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Stalled;

    impl Write for Stalled {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn frames_token_payload_and_newline() {
        let mut buffer = FrameBuffer::new(16, 64);
        let frame = buffer.fill(b"tok", b"hello").expect("fits");
        assert_eq!(frame, b"tok hello\n");
    }

    #[test]
    fn buffer_is_reused_between_frames() {
        let mut buffer = FrameBuffer::new(4, 64);
        buffer.fill(b"t", b"a much longer payload").expect("fits");
        let frame = buffer.fill(b"t", b"x").expect("fits");
        assert_eq!(frame, b"t x\n");
    }

    #[test]
    fn oversized_frames_are_rejected() {
        let mut buffer = FrameBuffer::new(4, 8);
        let err = buffer.fill(b"tok", b"payload").expect_err("too large");
        assert!(matches!(
            err,
            DeliveryError::PayloadTooLarge {
                size: 12,
                capacity: 8
            }
        ));
    }

    #[test]
    fn frame_exactly_at_limit_fits() {
        let mut buffer = FrameBuffer::new(1, 6);
        assert_eq!(buffer.fill(b"ab", b"cd").expect("fits"), b"ab cd\n");
    }

    #[test]
    fn write_loop_survives_single_byte_writes_and_interrupts() {
        let mut writer = Trickle {
            out: Vec::new(),
            calls: 0,
            interrupt_every: 3,
        };
        let written = write_frame(&mut writer, b"tok payload\n").expect("write");
        assert_eq!(written, 12);
        assert_eq!(writer.out, b"tok payload\n");
    }

    #[test]
    fn zero_length_write_is_an_error() {
        let err = write_frame(&mut Stalled, b"abc").expect_err("stalled writer");
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }
}
