//! Paged `qXfer:features:read` transfer of the target description.

use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, hex_digit1};
use nom::combinator::{all_consuming, map_res};
use nom::sequence::{preceded, separated_pair};
use nom::{IResult, Parser};
use trapstub_proto::codec;
use trapstub_proto::{PacketBuffer, StubError};

/// The only annex served: the target description document.
pub const TARGET_XML_ANNEX: &str = "target.xml";

/// How page data is placed in the reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XferEncoding {
    /// Bytes copied verbatim.
    #[default]
    Raw,
    /// `$`, `#`, `}` and `*` escaped as RSP binary data.
    Escaped,
}

/// A parsed `features:read:target.xml:<offset>,<length>` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XferRequest {
    /// Byte offset into the document.
    pub offset: u64,
    /// Maximum number of bytes the debugger wants.
    pub length: u64,
}

/// Marker opening a reply page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    /// `m`: more data follows.
    More,
    /// `l`: this page ends the document.
    Last,
}

impl PageMarker {
    fn byte(self) -> u8 {
        match self {
            PageMarker::More => b'm',
            PageMarker::Last => b'l',
        }
    }
}

/// Parse the text after `qXfer:`.
pub fn parse_features_read(args: &[u8]) -> Result<XferRequest, StubError> {
    let (_, (annex, (offset, length))) = features_read(args).map_err(|_| {
        StubError::Syntax(format!(
            "malformed qXfer request: {}",
            String::from_utf8_lossy(args)
        ))
    })?;

    if annex != TARGET_XML_ANNEX.as_bytes() {
        return Err(StubError::Syntax(format!(
            "unknown qXfer annex: {}",
            String::from_utf8_lossy(annex)
        )));
    }

    Ok(XferRequest { offset, length })
}

fn features_read(input: &[u8]) -> IResult<&[u8], (&[u8], (u64, u64))> {
    all_consuming((
        preceded(tag(&b"features:read:"[..]), take_while1(|c: u8| c != b':')),
        preceded(char(':'), separated_pair(hex_u64, char(','), hex_u64)),
    ))
    .parse(input)
}

fn hex_u64(input: &[u8]) -> IResult<&[u8], u64> {
    map_res(hex_digit1, |digits: &[u8]| {
        u64::from_str_radix(std::str::from_utf8(digits).unwrap_or_default(), 16)
    })
    .parse(input)
}

/// Fill `out` with the reply page for `request` over `blob`.
///
/// The page carries at most `out.capacity() - 1` data bytes so that the
/// marker always fits.
pub fn read_page(
    blob: &[u8],
    request: XferRequest,
    encoding: XferEncoding,
    out: &mut PacketBuffer,
) -> Result<PageMarker, StubError> {
    out.clear();

    let start = match usize::try_from(request.offset) {
        Ok(start) if start < blob.len() => start,
        _ => {
            out.push(PageMarker::Last.byte())?;
            return Ok(PageMarker::Last);
        }
    };

    let budget = usize::try_from(request.length)
        .unwrap_or(usize::MAX)
        .min(out.capacity().saturating_sub(1));
    let tail = &blob[start..];

    match encoding {
        XferEncoding::Raw => {
            let (marker, data) = if tail.len() <= budget {
                (PageMarker::Last, tail)
            } else {
                (PageMarker::More, &tail[..budget])
            };
            out.push(marker.byte())?;
            out.extend_from_slice(data)?;
            Ok(marker)
        }
        XferEncoding::Escaped => {
            let mut used = 0;
            let taken = tail
                .iter()
                .take_while(|&&byte| {
                    used += codec::escaped_len(byte);
                    used <= budget
                })
                .count();
            let marker = if taken == tail.len() {
                PageMarker::Last
            } else {
                PageMarker::More
            };
            out.push(marker.byte())?;
            for &byte in &tail[..taken] {
                codec::escape_into(byte, out)?;
            }
            Ok(marker)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &[u8] = b"0123456789";

    fn page(offset: u64, length: u64, capacity: usize) -> (PageMarker, Vec<u8>) {
        let mut out = PacketBuffer::new(capacity);
        let marker = read_page(
            BLOB,
            XferRequest { offset, length },
            XferEncoding::Raw,
            &mut out,
        )
        .unwrap();
        (marker, out.as_slice().to_vec())
    }

    #[test]
    fn parse_valid_request() {
        let req = parse_features_read(b"features:read:target.xml:1a,FF").unwrap();
        assert_eq!(
            req,
            XferRequest {
                offset: 0x1a,
                length: 0xff
            }
        );
    }

    #[test]
    fn parse_rejects_other_annex() {
        let err = parse_features_read(b"features:read:i386.xml:0,10").unwrap_err();
        assert!(err.to_string().contains("unknown qXfer annex"), "got: {err}");
    }

    #[test]
    fn parse_rejects_other_object() {
        assert!(parse_features_read(b"libraries:read::0,10").is_err());
        assert!(parse_features_read(b"features:write:target.xml:0,10").is_err());
    }

    #[test]
    fn parse_rejects_malformed_numbers() {
        assert!(parse_features_read(b"features:read:target.xml:0;10").is_err());
        assert!(parse_features_read(b"features:read:target.xml:0,").is_err());
        assert!(parse_features_read(b"features:read:target.xml:zz,10").is_err());
        assert!(parse_features_read(b"features:read:target.xml:0,10junk").is_err());
        assert!(parse_features_read(b"features:read:target.xml").is_err());
    }

    #[test]
    fn parse_rejects_overflowing_offset() {
        let err = parse_features_read(b"features:read:target.xml:10000000000000000,1").unwrap_err();
        assert!(matches!(err, StubError::Syntax(_)));
    }

    #[test]
    fn page_first_chunk_has_more_marker() {
        assert_eq!(page(0, 4, 64), (PageMarker::More, b"m0123".to_vec()));
    }

    #[test]
    fn page_tail_chunk_is_last() {
        assert_eq!(page(8, 4, 64), (PageMarker::Last, b"l89".to_vec()));
    }

    #[test]
    fn page_past_end_is_empty_last() {
        assert_eq!(page(10, 4, 64), (PageMarker::Last, b"l".to_vec()));
        assert_eq!(page(u64::MAX, 4, 64), (PageMarker::Last, b"l".to_vec()));
    }

    #[test]
    fn page_exact_fit_is_last() {
        assert_eq!(page(6, 4, 64), (PageMarker::Last, b"l6789".to_vec()));
    }

    #[test]
    fn page_clamped_to_buffer_capacity() {
        // Capacity 4 leaves room for the marker plus three bytes.
        assert_eq!(page(0, 0x1000, 4), (PageMarker::More, b"m012".to_vec()));
        assert_eq!(page(7, 0x1000, 4), (PageMarker::Last, b"l789".to_vec()));
    }

    #[test]
    fn escaped_page_escapes_framing_bytes() {
        let blob = b"a#b$c";
        let mut out = PacketBuffer::new(64);
        let marker = read_page(
            blob,
            XferRequest {
                offset: 0,
                length: 100,
            },
            XferEncoding::Escaped,
            &mut out,
        )
        .unwrap();
        assert_eq!(marker, PageMarker::Last);
        assert_eq!(out.as_slice(), b"la}\x03b}\x04c");
    }

    #[test]
    fn escaped_page_counts_encoded_length() {
        let blob = b"a#b";
        let mut out = PacketBuffer::new(64);
        // Budget of 2 fits "a" but not the two-byte escape that follows.
        let marker = read_page(
            blob,
            XferRequest {
                offset: 0,
                length: 2,
            },
            XferEncoding::Escaped,
            &mut out,
        )
        .unwrap();
        assert_eq!(marker, PageMarker::More);
        assert_eq!(out.as_slice(), b"ma");
    }
}
