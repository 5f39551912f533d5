//! Target description document served over `qXfer`.

use std::borrow::Cow;

/// Read-only bytes of the target description (`target.xml`).
///
/// Usually a blob linked into the image, or a file loaded on a host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetDescription {
    bytes: Cow<'static, [u8]>,
}

impl TargetDescription {
    /// Wrap a blob that lives for the whole program.
    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self {
            bytes: Cow::Borrowed(bytes),
        }
    }

    /// Take ownership of loaded bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Cow::Owned(bytes),
        }
    }

    /// The document contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Document length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether there is no document to serve.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_and_owned_descriptions_compare_by_content() {
        let a = TargetDescription::from_static(b"<target/>");
        let b = TargetDescription::from_vec(b"<target/>".to_vec());
        assert_eq!(a, b);
        assert_eq!(a.len(), 9);
        assert!(!a.is_empty());
        assert!(TargetDescription::default().is_empty());
    }
}
