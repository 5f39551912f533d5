//! Single-byte channel to the remote debugger.

use std::collections::VecDeque;
use std::io::{self, BufReader, BufWriter, Read, Write};

use crate::error::ChannelError;

/// The transport driver the stub talks through.
///
/// Reads block until a byte arrives; there is no timeout.
pub trait ByteChannel {
    /// Prepare the device. Called once before the first byte is exchanged.
    fn init(&mut self) -> Result<(), ChannelError>;

    /// Write one byte.
    fn put_byte(&mut self, byte: u8) -> Result<(), ChannelError>;

    /// Read one byte, blocking until it is available.
    fn get_byte(&mut self) -> Result<u8, ChannelError>;

    /// Push buffered output to the device.
    fn flush(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}

impl<C: ByteChannel + ?Sized> ByteChannel for &mut C {
    fn init(&mut self) -> Result<(), ChannelError> {
        (**self).init()
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), ChannelError> {
        (**self).put_byte(byte)
    }

    fn get_byte(&mut self) -> Result<u8, ChannelError> {
        (**self).get_byte()
    }

    fn flush(&mut self) -> Result<(), ChannelError> {
        (**self).flush()
    }
}

/// A [`ByteChannel`] over a blocking `std::io` reader/writer pair, such as
/// the two halves of a TCP socket or stdin/stdout.
pub struct StreamChannel<R: Read, W: Write> {
    reader: BufReader<R>,
    writer: BufWriter<W>,
}

impl<R: Read, W: Write> StreamChannel<R, W> {
    /// Wrap a reader and a writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
        }
    }
}

impl<R: Read, W: Write> ByteChannel for StreamChannel<R, W> {
    fn init(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), ChannelError> {
        self.writer.write_all(&[byte])?;
        Ok(())
    }

    fn get_byte(&mut self) -> Result<u8, ChannelError> {
        let mut byte = [0u8; 1];
        match self.reader.read_exact(&mut byte) {
            Ok(()) => Ok(byte[0]),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ChannelError::Closed),
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&mut self) -> Result<(), ChannelError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// An in-memory channel fed from a fixed script of incoming bytes.
///
/// Everything the stub writes is captured for inspection. Once the script
/// runs dry, reads fail with [`ChannelError::Closed`]. Used to drive the
/// stub on a host without a debugger attached.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    input: VecDeque<u8>,
    output: Vec<u8>,
    init_calls: usize,
    fail_writes: bool,
}

impl ScriptedChannel {
    /// Create a channel that will deliver `input` byte by byte.
    pub fn new(input: impl AsRef<[u8]>) -> Self {
        Self {
            input: input.as_ref().iter().copied().collect(),
            ..Default::default()
        }
    }

    /// Queue more bytes behind the ones not yet read.
    pub fn feed(&mut self, bytes: impl AsRef<[u8]>) {
        self.input.extend(bytes.as_ref());
    }

    /// Make every subsequent write fail with a broken-pipe error.
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }

    /// Bytes written so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Bytes of the script not consumed yet.
    pub fn unread(&self) -> usize {
        self.input.len()
    }

    /// How many times [`ByteChannel::init`] was called.
    pub fn init_calls(&self) -> usize {
        self.init_calls
    }
}

impl ByteChannel for ScriptedChannel {
    fn init(&mut self) -> Result<(), ChannelError> {
        self.init_calls += 1;
        Ok(())
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), ChannelError> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted write failure").into());
        }
        self.output.push(byte);
        Ok(())
    }

    fn get_byte(&mut self) -> Result<u8, ChannelError> {
        self.input.pop_front().ok_or(ChannelError::Closed)
    }
}
