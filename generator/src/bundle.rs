use std::fmt;

pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// The generated multi-document YAML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestBundle {
    text: String,
    documents: Vec<String>,
}

impl ManifestBundle {
    pub(crate) fn from_documents(documents: Vec<String>) -> Self {
        let text = documents.join(DOCUMENT_SEPARATOR);
        Self { text, documents }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Individual documents, in bundle order.
    pub fn documents(&self) -> impl ExactSizeIterator<Item = &str> {
        self.documents.iter().map(String::as_str)
    }
}

impl fmt::Display for ManifestBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
