//! RSP packet transport — `$payload#cc` framing with acknowledgments.

use crate::buffer::PacketBuffer;
use crate::channel::ByteChannel;
use crate::codec;
use crate::error::StubError;

/// Retransmissions (and resyncs) tolerated before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

const PACKET_START: u8 = b'$';
const PACKET_END: u8 = b'#';
const ACK: u8 = b'+';
const NACK: u8 = b'-';

/// Sends and receives framed packets over a [`ByteChannel`].
#[derive(Debug)]
pub struct PacketTransport<C> {
    channel: C,
    max_retries: u32,
}

impl<C: ByteChannel> PacketTransport<C> {
    /// Wrap `channel`, allowing `max_retries` retransmissions per packet.
    pub fn new(channel: C, max_retries: u32) -> Self {
        Self {
            channel,
            max_retries,
        }
    }

    /// Return a reference to the underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Return a mutable reference to the underlying channel.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Send `payload` as one frame and wait for the peer to acknowledge it.
    ///
    /// The frame is retransmitted whenever the reply is anything but `+`,
    /// including a failed read. After the first attempt plus `max_retries`
    /// retransmissions the send fails with
    /// [`StubError::RetryLimitExceeded`]. A write failure aborts at once.
    pub fn send_packet(&mut self, payload: &[u8]) -> Result<usize, StubError> {
        let digits = codec::checksum_digits(codec::checksum(payload));
        let attempts = self.max_retries + 1;

        for attempt in 1..=attempts {
            self.write_frame(payload, digits)?;
            match self.channel.get_byte() {
                Ok(ACK) => {
                    tracing::trace!(
                        len = payload.len(),
                        payload = %String::from_utf8_lossy(payload),
                        "packet sent"
                    );
                    return Ok(payload.len());
                }
                Ok(other) => {
                    tracing::warn!(attempt, reply = other, "packet not acknowledged");
                }
                Err(err) => {
                    tracing::warn!(attempt, %err, "failed to read acknowledgment");
                }
            }
        }

        Err(StubError::RetryLimitExceeded { attempts })
    }

    /// Receive one frame into `buf`, returning the payload length.
    ///
    /// Bytes before the first `$` are discarded. A frame with a bad checksum
    /// is NACKed and the retransmission is awaited. A `$` inside a payload
    /// restarts accumulation, and so does the `$` of a retransmission after
    /// a NACK; more than `max_retries` restarts per call fail.
    pub fn recv_packet(&mut self, buf: &mut PacketBuffer) -> Result<usize, StubError> {
        buf.clear();
        while self.channel.get_byte()? != PACKET_START {}

        let mut resyncs = 0;
        loop {
            match self.channel.get_byte()? {
                PACKET_END => {
                    let digits = [self.channel.get_byte()?, self.channel.get_byte()?];
                    let computed = codec::checksum(buf.as_slice());
                    match codec::parse_checksum(digits) {
                        Ok(received) if received == computed => {
                            self.reply(ACK)?;
                            tracing::trace!(
                                len = buf.len(),
                                payload = %String::from_utf8_lossy(buf.as_slice()),
                                "packet received"
                            );
                            return Ok(buf.len());
                        }
                        Ok(received) => {
                            let err = StubError::ChecksumMismatch { received, computed };
                            tracing::warn!(%err, "rejecting frame");
                        }
                        Err(err) => {
                            tracing::warn!(%err, "rejecting frame");
                        }
                    }
                    self.reply(NACK)?;
                }
                PACKET_START => {
                    resyncs += 1;
                    if resyncs > self.max_retries {
                        self.reply(NACK)?;
                        return Err(StubError::RetryLimitExceeded { attempts: resyncs });
                    }
                    tracing::debug!(resyncs, dropped = buf.len(), "frame restarted");
                    buf.clear();
                }
                byte => {
                    if let Err(err) = buf.push(byte) {
                        self.reply(NACK)?;
                        return Err(err);
                    }
                }
            }
        }
    }

    fn write_frame(&mut self, payload: &[u8], digits: [u8; 2]) -> Result<(), StubError> {
        self.channel.put_byte(PACKET_START)?;
        for &byte in payload {
            self.channel.put_byte(byte)?;
        }
        self.channel.put_byte(PACKET_END)?;
        self.channel.put_byte(digits[0])?;
        self.channel.put_byte(digits[1])?;
        self.channel.flush()?;
        Ok(())
    }

    fn reply(&mut self, ack: u8) -> Result<(), StubError> {
        self.channel.put_byte(ack)?;
        self.channel.flush()?;
        Ok(())
    }
}
