//! Command dispatch: prefix tables mapping packets to handlers.
//!
//! The top-level table is matched against the start of the payload, first
//! match wins. `q` packets go through a second table keyed by the query
//! name, which runs up to the first `:`.

use trapstub_proto::{ByteChannel, StubError};

use crate::capabilities::{self, StubCapabilities};
use crate::session::Context;
use crate::state::ResumeAction;
use crate::xfer;

/// Top-level commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `?`: report why the target stopped.
    StopReason,
    /// `c`: resume execution.
    Continue,
    /// `s`: execute one instruction.
    Step,
    /// `q`: general query namespace.
    Query,
}

/// Sub-commands of the `q` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// `qSupported`: capability negotiation.
    Supported,
    /// `qXfer`: paged object read.
    Xfer,
}

const COMMANDS: &[(&str, Command)] = &[
    ("?", Command::StopReason),
    ("c", Command::Continue),
    ("s", Command::Step),
    ("q", Command::Query),
];

const QUERIES: &[(&str, Query)] = &[("Supported", Query::Supported), ("Xfer", Query::Xfer)];

/// Find the command `payload` starts with, returning it with the rest of
/// the payload.
pub fn lookup_command(payload: &[u8]) -> Option<(Command, &[u8])> {
    COMMANDS.iter().find_map(|&(prefix, command)| {
        payload
            .strip_prefix(prefix.as_bytes())
            .map(|rest| (command, rest))
    })
}

/// Find the query named by `text` (the payload after `q`), returning it with
/// the arguments after the `:` separator.
pub fn lookup_query(text: &[u8]) -> Option<(Query, &[u8])> {
    let (name, args) = match text.iter().position(|&b| b == b':') {
        Some(colon) => (&text[..colon], &text[colon + 1..]),
        None => (text, &[][..]),
    };
    QUERIES
        .iter()
        .find_map(|&(query_name, query)| (name == query_name.as_bytes()).then_some((query, args)))
}

/// Run the handler for `payload`.
///
/// Returns the resume action when the command ends the session. Unknown
/// commands and malformed arguments are answered with an empty packet.
pub fn dispatch<C: ByteChannel, const N: usize>(
    ctx: &mut Context<'_, C, N>,
    payload: &[u8],
) -> Result<Option<ResumeAction>, StubError> {
    let Some((command, args)) = lookup_command(payload) else {
        return unsupported(ctx, payload);
    };

    let outcome = match command {
        Command::StopReason => ctx.send_stop_reply().map(|()| None),
        Command::Continue => Ok(Some(ResumeAction::Continue)),
        Command::Step => Ok(Some(ResumeAction::SingleStep)),
        Command::Query => handle_query(ctx, args),
    };

    match outcome {
        Err(err) if err.is_recoverable() => {
            tracing::warn!(
                packet = %String::from_utf8_lossy(payload),
                %err,
                "malformed command"
            );
            ctx.reply_empty()?;
            Ok(None)
        }
        other => other,
    }
}

fn unsupported<C: ByteChannel, const N: usize>(
    ctx: &mut Context<'_, C, N>,
    payload: &[u8],
) -> Result<Option<ResumeAction>, StubError> {
    tracing::debug!(packet = %String::from_utf8_lossy(payload), "unsupported command");
    ctx.reply_empty()?;
    Ok(None)
}

fn handle_query<C: ByteChannel, const N: usize>(
    ctx: &mut Context<'_, C, N>,
    text: &[u8],
) -> Result<Option<ResumeAction>, StubError> {
    let Some((query, args)) = lookup_query(text) else {
        return unsupported(ctx, text);
    };

    match query {
        Query::Supported => handle_supported(ctx, args)?,
        Query::Xfer => handle_xfer(ctx, args)?,
    }
    Ok(None)
}

fn handle_supported<C: ByteChannel, const N: usize>(
    ctx: &mut Context<'_, C, N>,
    args: &[u8],
) -> Result<(), StubError> {
    for feature in capabilities::parse_client_features(args)? {
        tracing::debug!(name = feature.name, support = ?feature.support, "debugger feature");
    }

    let caps = StubCapabilities {
        packet_size: ctx.options.packet_size,
    };
    ctx.reply(caps.reply().as_bytes())
}

fn handle_xfer<C: ByteChannel, const N: usize>(
    ctx: &mut Context<'_, C, N>,
    args: &[u8],
) -> Result<(), StubError> {
    let request = xfer::parse_features_read(args)?;
    let marker = xfer::read_page(
        ctx.target.as_bytes(),
        request,
        ctx.options.xfer_encoding,
        ctx.tx,
    )?;
    tracing::debug!(
        offset = request.offset,
        length = request.length,
        ?marker,
        sent = ctx.tx.len() - 1,
        "target description page"
    );
    ctx.send_staged()
}

#[cfg(test)]
mod tests {
    use trapstub_proto::{PacketBuffer, PacketTransport, ScriptedChannel};

    use super::*;
    use crate::state::{DebugState, RegisterFile, Signal};
    use crate::stub::StubOptions;
    use crate::target::TargetDescription;
    use crate::xfer::XferEncoding;

    /// Dispatch one payload with every reply acknowledged, returning the
    /// outcome and the bytes written.
    fn run(payload: &[u8], blob: &'static [u8], tx_capacity: usize) -> (Option<ResumeAction>, Vec<u8>) {
        let mut transport = PacketTransport::new(ScriptedChannel::new(b"++++"), 5);
        let mut tx = PacketBuffer::new(tx_capacity);
        let mut state = DebugState::new(RegisterFile::<1>::new(), Signal::TRAP);
        let target = TargetDescription::from_static(blob);
        let options = StubOptions::default();
        let mut ctx = Context {
            transport: &mut transport,
            tx: &mut tx,
            state: &mut state,
            target: &target,
            options: &options,
        };
        let outcome = dispatch(&mut ctx, payload).unwrap();
        (outcome, transport.channel().output().to_vec())
    }

    #[test]
    fn lookup_first_match_wins() {
        assert_eq!(lookup_command(b"?"), Some((Command::StopReason, &b""[..])));
        assert_eq!(lookup_command(b"c1000"), Some((Command::Continue, &b"1000"[..])));
        assert_eq!(lookup_command(b"qC"), Some((Command::Query, &b"C"[..])));
        assert_eq!(lookup_command(b"Z0,0,0"), None);
        assert_eq!(lookup_command(b""), None);
    }

    #[test]
    fn lookup_query_requires_exact_name() {
        assert_eq!(lookup_query(b"Supported"), Some((Query::Supported, &b""[..])));
        assert_eq!(
            lookup_query(b"Supported:swbreak+"),
            Some((Query::Supported, &b"swbreak+"[..]))
        );
        assert_eq!(lookup_query(b"SupportedX"), None);
        assert_eq!(lookup_query(b"Xfer:features"), Some((Query::Xfer, &b"features"[..])));
        assert_eq!(lookup_query(b"Attached"), None);
    }

    #[test]
    fn dispatch_stop_reason_replies_signal() {
        let (outcome, out) = run(b"?", b"", 64);
        assert_eq!(outcome, None);
        assert_eq!(out, b"$S05#b8");
    }

    #[test]
    fn dispatch_continue_and_step_send_nothing() {
        assert_eq!(run(b"c", b"", 64), (Some(ResumeAction::Continue), Vec::new()));
        assert_eq!(run(b"s", b"", 64), (Some(ResumeAction::SingleStep), Vec::new()));
    }

    #[test]
    fn dispatch_unknown_command_replies_empty() {
        let (outcome, out) = run(b"Z0,0,0", b"", 64);
        assert_eq!(outcome, None);
        assert_eq!(out, b"$#00");
    }

    #[test]
    fn dispatch_unknown_query_replies_empty() {
        let (_, out) = run(b"qAttached", b"", 64);
        assert_eq!(out, b"$#00");
    }

    #[test]
    fn dispatch_supported_advertises_features_read() {
        let (outcome, out) = run(b"qSupported:multiprocess+;swbreak+", b"<target/>", 4096);
        assert_eq!(outcome, None);
        let payload = b"PacketSize=1000;qXfer:features:read+";
        let mut expected = vec![b'$'];
        expected.extend_from_slice(payload);
        expected.extend_from_slice(b"#");
        expected.extend_from_slice(&trapstub_proto::codec::checksum_digits(
            trapstub_proto::codec::checksum(payload),
        ));
        assert_eq!(out, expected);
    }

    #[test]
    fn dispatch_supported_advertises_features_read_for_empty_description() {
        let (_, out) = run(b"qSupported", b"", 4096);
        let payload = b"PacketSize=1000;qXfer:features:read+";
        assert!(out.starts_with(b"$PacketSize=1000;qXfer:features:read+#"));
        assert_eq!(
            &out[out.len() - 2..],
            &trapstub_proto::codec::checksum_digits(trapstub_proto::codec::checksum(payload))
        );

        let (_, out) = run(b"qXfer:features:read:target.xml:0,10", b"", 4096);
        assert_eq!(out, b"$l#6c");
    }

    #[test]
    fn dispatch_xfer_pages_through_blob() {
        let request = |off: &str| format!("qXfer:features:read:target.xml:{off},4");
        assert_eq!(run(request("0").as_bytes(), b"0123456789", 64).1, b"$m0123#33");
        assert_eq!(run(request("8").as_bytes(), b"0123456789", 64).1, b"$l89#dd");
        assert_eq!(run(request("a").as_bytes(), b"0123456789", 64).1, b"$l#6c");
    }

    #[test]
    fn dispatch_malformed_xfer_replies_empty() {
        let (outcome, out) = run(b"qXfer:features:read:target.xml:0;4", b"0123456789", 64);
        assert_eq!(outcome, None);
        assert_eq!(out, b"$#00");
    }

    #[test]
    fn dispatch_xfer_respects_escaped_encoding() {
        let mut transport = PacketTransport::new(ScriptedChannel::new(b"+"), 5);
        let mut tx = PacketBuffer::new(64);
        let mut state = DebugState::new(RegisterFile::<1>::new(), Signal::TRAP);
        let target = TargetDescription::from_static(b"#");
        let options = StubOptions {
            xfer_encoding: XferEncoding::Escaped,
            ..StubOptions::default()
        };
        let mut ctx = Context {
            transport: &mut transport,
            tx: &mut tx,
            state: &mut state,
            target: &target,
            options: &options,
        };
        dispatch(&mut ctx, b"qXfer:features:read:target.xml:0,10").unwrap();
        assert!(transport.channel().output().starts_with(b"$l}\x03#"));
    }
}
