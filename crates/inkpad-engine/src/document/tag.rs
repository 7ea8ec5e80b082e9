use std::fmt;

/// Element names understood by the editor.
///
/// Anything outside the known set is kept verbatim in [`Tag::Other`] so that
/// markup supplied by the initial-content collaborator survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Synthetic root of an editable document. Never serialized.
    Root,
    Strong,
    B,
    Em,
    I,
    U,
    Code,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Blockquote,
    P,
    Div,
    Span,
    Br,
    Hr,
    Ul,
    Ol,
    Li,
    A,
    Pre,
    Other(String),
}

impl Tag {
    /// Case-insensitive lookup of an element name.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "strong" => Tag::Strong,
            "b" => Tag::B,
            "em" => Tag::Em,
            "i" => Tag::I,
            "u" => Tag::U,
            "code" => Tag::Code,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "h5" => Tag::H5,
            "h6" => Tag::H6,
            "blockquote" => Tag::Blockquote,
            "p" => Tag::P,
            "div" => Tag::Div,
            "span" => Tag::Span,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "a" => Tag::A,
            "pre" => Tag::Pre,
            other => Tag::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Root => "#root",
            Tag::Strong => "strong",
            Tag::B => "b",
            Tag::Em => "em",
            Tag::I => "i",
            Tag::U => "u",
            Tag::Code => "code",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::Blockquote => "blockquote",
            Tag::P => "p",
            Tag::Div => "div",
            Tag::Span => "span",
            Tag::Br => "br",
            Tag::Hr => "hr",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::A => "a",
            Tag::Pre => "pre",
            Tag::Other(name) => name,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Tag::Root
                | Tag::H1
                | Tag::H2
                | Tag::H3
                | Tag::H4
                | Tag::H5
                | Tag::H6
                | Tag::Blockquote
                | Tag::P
                | Tag::Div
                | Tag::Hr
                | Tag::Ul
                | Tag::Ol
                | Tag::Li
                | Tag::Pre
        )
    }

    /// Elements that never have children or an end tag.
    pub fn is_void(&self) -> bool {
        match self {
            Tag::Br | Tag::Hr => true,
            Tag::Other(name) => matches!(name.as_str(), "img" | "input" | "meta" | "link" | "wbr"),
            _ => false,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
