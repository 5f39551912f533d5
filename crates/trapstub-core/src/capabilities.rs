//! `qSupported` capability negotiation.

use trapstub_proto::StubError;

/// What the stub advertises in its `qSupported` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubCapabilities {
    /// Largest packet the stub accepts, in bytes.
    pub packet_size: usize,
}

impl StubCapabilities {
    /// Render the reply payload, e.g. `PacketSize=1000;qXfer:features:read+`.
    ///
    /// The target description read is always advertised; an empty
    /// document is served as a single `l` page.
    pub fn reply(&self) -> String {
        format!("PacketSize={:x};qXfer:features:read+", self.packet_size)
    }
}

/// How the debugger declared one of its own features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSupport<'a> {
    /// `name+`
    Supported,
    /// `name-`
    Unsupported,
    /// `name?`
    Query,
    /// `name=value`
    Value(&'a str),
}

/// One entry of the feature list sent with `qSupported:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientFeature<'a> {
    /// Feature name.
    pub name: &'a str,
    /// Declared support.
    pub support: FeatureSupport<'a>,
}

/// Parse the `;`-separated feature list the debugger sends after
/// `qSupported:`. Entries without a recognised suffix are treated as
/// supported.
pub fn parse_client_features(text: &[u8]) -> Result<Vec<ClientFeature<'_>>, StubError> {
    let text = std::str::from_utf8(text)
        .map_err(|e| StubError::Syntax(format!("qSupported features are not UTF-8: {e}")))?;

    Ok(text
        .split(';')
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            if let Some((name, value)) = entry.split_once('=') {
                return ClientFeature {
                    name,
                    support: FeatureSupport::Value(value),
                };
            }
            let (name, support) = match entry.as_bytes()[entry.len() - 1] {
                b'+' => (&entry[..entry.len() - 1], FeatureSupport::Supported),
                b'-' => (&entry[..entry.len() - 1], FeatureSupport::Unsupported),
                b'?' => (&entry[..entry.len() - 1], FeatureSupport::Query),
                _ => (entry, FeatureSupport::Supported),
            };
            ClientFeature { name, support }
        })
        .collect())
}
