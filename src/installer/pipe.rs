//! Bounded in-memory byte pipe
//!
//! Connects the thread producing an unpacked archive to the registry call
//! consuming it. Bytes travel as chunks over a bounded channel, so the writer
//! blocks while the reader has not caught up and the whole archive never
//! sits in memory at once.
//!
//! A writer that is dropped ends the stream. A writer that fails delivers its
//! error to the reader instead, so a broken producer shows up as a failed
//! read rather than a silently truncated archive.

use std::io::{self, Read, Write};

use crossbeam::channel::{self, Receiver, Sender};

/// Size of the chunks handed to the reader
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered before the writer blocks
pub const DEFAULT_CAPACITY: usize = 16;

type Frame = std::result::Result<Vec<u8>, io::Error>;

/// Create a pipe holding at most `capacity` chunks in flight
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (sender, receiver) = channel::bounded(capacity);
    (
        PipeWriter {
            sender: Some(sender),
            buffer: Vec::with_capacity(CHUNK_SIZE),
        },
        PipeReader {
            receiver,
            chunk: Vec::new(),
            position: 0,
            finished: false,
        },
    )
}

/// Producer end of a [`pipe`]
#[derive(Debug)]
pub struct PipeWriter {
    sender: Option<Sender<Frame>>,
    buffer: Vec<u8>,
}

impl PipeWriter {
    /// Close the pipe, making the reader's next read fail with `error`
    pub fn fail(mut self, error: io::Error) {
        self.buffer.clear();
        if let Some(sender) = self.sender.take() {
            // the reader may already be gone
            let _ = sender.send(Err(error));
        }
    }

    fn send_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let Some(ref sender) = self.sender else {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        };
        let chunk = std::mem::replace(&mut self.buffer, Vec::with_capacity(CHUNK_SIZE));
        sender
            .send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed"))
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let taken = (CHUNK_SIZE - self.buffer.len()).min(buf.len());
        self.buffer.extend_from_slice(&buf[..taken]);
        if self.buffer.len() >= CHUNK_SIZE {
            self.send_buffer()?;
        }
        Ok(taken)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffer()
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        let _ = self.send_buffer();
    }
}

/// Consumer end of a [`pipe`]
#[derive(Debug)]
pub struct PipeReader {
    receiver: Receiver<Frame>,
    chunk: Vec<u8>,
    position: usize,
    finished: bool,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.position < self.chunk.len() {
                let available = &self.chunk[self.position..];
                let count = available.len().min(buf.len());
                buf[..count].copy_from_slice(&available[..count]);
                self.position += count;
                return Ok(count);
            }
            if self.finished {
                return Ok(0);
            }
            match self.receiver.recv() {
                Ok(Ok(chunk)) => {
                    self.chunk = chunk;
                    self.position = 0;
                }
                Ok(Err(error)) => {
                    self.finished = true;
                    return Err(error);
                }
                // every writer dropped: end of stream
                Err(_) => {
                    self.finished = true;
                    return Ok(0);
                }
            }
        }
    }
}
