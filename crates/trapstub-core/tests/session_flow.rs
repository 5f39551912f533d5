use trapstub_core::{
    DebugState, RegisterFile, ResumeAction, Signal, Stub, StubOptions, TargetDescription,
};
use trapstub_proto::codec::{checksum, checksum_digits};
use trapstub_proto::{ChannelError, ScriptedChannel, StubError};

// ── helpers ─────────────────────────────────────────────────────

/// Builds the byte stream one side of the link puts on the wire.
#[derive(Default)]
struct Wire(Vec<u8>);

impl Wire {
    fn new() -> Self {
        Self::default()
    }

    /// A framed packet with a valid checksum.
    fn packet(mut self, payload: &[u8]) -> Self {
        self.0.push(b'$');
        self.0.extend_from_slice(payload);
        self.0.push(b'#');
        self.0.extend_from_slice(&checksum_digits(checksum(payload)));
        self
    }

    fn ack(mut self) -> Self {
        self.0.push(b'+');
        self
    }

    fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    fn bytes(self) -> Vec<u8> {
        self.0
    }
}

fn attached_stub(
    input: Vec<u8>,
    blob: &'static [u8],
    options: StubOptions,
) -> Stub<ScriptedChannel> {
    let mut stub = Stub::new(
        ScriptedChannel::new(input),
        TargetDescription::from_static(blob),
        options,
    );
    stub.init().unwrap();
    stub
}

fn trap_state() -> DebugState<4> {
    DebugState::new(RegisterFile::new(), Signal::TRAP)
}

// ── sessions ────────────────────────────────────────────────────

#[test]
fn gdb_style_handshake_then_continue() {
    let input = Wire::new()
        .ack()
        .packet(b"qSupported:multiprocess+;swbreak+;xmlRegisters=i386")
        .ack()
        .packet(b"?")
        .ack()
        .packet(b"qXfer:features:read:target.xml:0,ffb")
        .ack()
        .packet(b"c")
        .bytes();
    let mut stub = attached_stub(input, b"<target/>", StubOptions::default());
    let mut state = trap_state();

    assert_eq!(stub.trap(&mut state).unwrap(), ResumeAction::Continue);

    let expected = Wire::new()
        .packet(b"S05")
        .ack()
        .packet(b"PacketSize=1000;qXfer:features:read+")
        .ack()
        .packet(b"S05")
        .ack()
        .packet(b"l<target/>")
        .ack()
        .bytes();
    assert_eq!(stub.channel().output(), expected.as_slice());
    assert_eq!(stub.channel().unread(), 0);
}

#[test]
fn paging_through_a_ten_byte_blob() {
    let input = Wire::new()
        .ack()
        .packet(b"qXfer:features:read:target.xml:0,4")
        .ack()
        .packet(b"qXfer:features:read:target.xml:8,4")
        .ack()
        .packet(b"qXfer:features:read:target.xml:a,4")
        .ack()
        .packet(b"s")
        .bytes();
    let mut stub = attached_stub(input, b"0123456789", StubOptions::default());
    let mut state = trap_state();

    assert_eq!(stub.trap(&mut state).unwrap(), ResumeAction::SingleStep);
    assert_eq!(state.resume, Some(ResumeAction::SingleStep));

    let expected = Wire::new()
        .packet(b"S05")
        .ack()
        .packet(b"m0123")
        .ack()
        .packet(b"l89")
        .ack()
        .packet(b"l")
        .ack()
        .bytes();
    assert_eq!(stub.channel().output(), expected.as_slice());
}

static LONG_BLOB: [u8; 100] = [b'z'; 100];

#[test]
fn pages_are_clamped_to_packet_size() {
    let options = StubOptions {
        packet_size: 48,
        ..StubOptions::default()
    };
    let input = Wire::new()
        .ack()
        .packet(b"qXfer:features:read:target.xml:0,fff")
        .ack()
        .packet(b"c")
        .bytes();
    let mut stub = attached_stub(input, &LONG_BLOB, options);
    stub.trap(&mut trap_state()).unwrap();

    // One byte of the buffer goes to the `m` marker.
    let mut page = vec![b'm'];
    page.extend_from_slice(&LONG_BLOB[..47]);
    let expected = Wire::new()
        .packet(b"S05")
        .ack()
        .packet(&page)
        .ack()
        .bytes();
    assert_eq!(stub.channel().output(), expected.as_slice());
}

#[test]
fn unknown_and_malformed_commands_get_empty_replies() {
    let input = Wire::new()
        .ack()
        .packet(b"Z0,0,0")
        .ack()
        .packet(b"qXfer:features:read:other.xml:0,10")
        .ack()
        .packet(b"vCont?")
        .ack()
        .packet(b"c")
        .bytes();
    let mut stub = attached_stub(input, b"<target/>", StubOptions::default());
    stub.trap(&mut trap_state()).unwrap();

    let expected = Wire::new()
        .packet(b"S05")
        .ack()
        .raw(b"$#00")
        .ack()
        .raw(b"$#00")
        .ack()
        .raw(b"$#00")
        .ack()
        .bytes();
    assert_eq!(stub.channel().output(), expected.as_slice());
}

#[test]
fn corrupted_command_is_nacked_and_retransmission_served() {
    let input = Wire::new()
        .ack()
        .raw(b"$?#30")
        .packet(b"?")
        .ack()
        .packet(b"c")
        .bytes();
    let mut stub = attached_stub(input, b"", StubOptions::default());
    stub.trap(&mut trap_state()).unwrap();

    let expected = Wire::new()
        .packet(b"S05")
        .raw(b"-+")
        .packet(b"S05")
        .ack()
        .bytes();
    assert_eq!(stub.channel().output(), expected.as_slice());
}

#[test]
fn lost_debugger_ends_session_with_error() {
    let input = Wire::new().ack().packet(b"?").bytes();
    let mut stub = attached_stub(input, b"", StubOptions::default());
    let err = stub.trap(&mut trap_state()).unwrap_err();
    assert!(matches!(err, StubError::RetryLimitExceeded { attempts: 6 }));
}

#[test]
fn channel_close_while_waiting_for_command() {
    let mut stub = attached_stub(Wire::new().ack().bytes(), b"", StubOptions::default());
    let mut state = trap_state();
    let err = stub.trap(&mut state).unwrap_err();
    assert!(matches!(err, StubError::Channel(ChannelError::Closed)));
    assert_eq!(state.resume, None);
}

#[test]
fn oversized_packet_exhausts_buffer() {
    let options = StubOptions {
        packet_size: 16,
        ..StubOptions::default()
    };
    let input = Wire::new().ack().packet(&[b'x'; 32]).bytes();
    let mut stub = attached_stub(input, b"", options);
    let err = stub.trap(&mut trap_state()).unwrap_err();
    assert!(matches!(err, StubError::BufferExhausted { capacity: 16 }));
}
