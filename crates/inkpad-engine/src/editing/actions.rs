use std::fmt;
use std::str::FromStr;

use crate::document::Tag;
use crate::editing::EditError;

/// Annotations the toolbar can apply around a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapTag {
    Strong,
    Em,
    U,
    Code,
    H1,
    H2,
    Blockquote,
}

impl WrapTag {
    pub fn tag_name(&self) -> &'static str {
        match self {
            WrapTag::Strong => "strong",
            WrapTag::Em => "em",
            WrapTag::U => "u",
            WrapTag::Code => "code",
            WrapTag::H1 => "h1",
            WrapTag::H2 => "h2",
            WrapTag::Blockquote => "blockquote",
        }
    }

    /// The element created when wrapping.
    pub fn tag(&self) -> Tag {
        match self {
            WrapTag::Strong => Tag::Strong,
            WrapTag::Em => Tag::Em,
            WrapTag::U => Tag::U,
            WrapTag::Code => Tag::Code,
            WrapTag::H1 => Tag::H1,
            WrapTag::H2 => Tag::H2,
            WrapTag::Blockquote => Tag::Blockquote,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, WrapTag::H1 | WrapTag::H2 | WrapTag::Blockquote)
    }

    /// Whether an existing element already applies this annotation. The
    /// presentational spellings `<b>` and `<i>` count as strong and em.
    pub fn matches(&self, tag: &Tag) -> bool {
        match self {
            WrapTag::Strong => matches!(tag, Tag::Strong | Tag::B),
            WrapTag::Em => matches!(tag, Tag::Em | Tag::I),
            other => *tag == other.tag(),
        }
    }
}

impl FromStr for WrapTag {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strong" | "b" | "bold" => Ok(WrapTag::Strong),
            "em" | "i" | "italic" => Ok(WrapTag::Em),
            "u" | "underline" => Ok(WrapTag::U),
            "code" => Ok(WrapTag::Code),
            "h1" => Ok(WrapTag::H1),
            "h2" => Ok(WrapTag::H2),
            "blockquote" | "quote" => Ok(WrapTag::Blockquote),
            _ => Err(EditError::InvalidArgument(format!("unknown tag '{s}'"))),
        }
    }
}

impl fmt::Display for WrapTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// A toolbar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapAction {
    pub tag: WrapTag,
    pub label: &'static str,
    /// Material Symbols icon name.
    pub icon: &'static str,
}

pub static WRAP_ACTIONS: [WrapAction; 7] = [
    WrapAction {
        tag: WrapTag::Strong,
        label: "Bold",
        icon: "format_bold",
    },
    WrapAction {
        tag: WrapTag::Em,
        label: "Italic",
        icon: "format_italic",
    },
    WrapAction {
        tag: WrapTag::U,
        label: "Underline",
        icon: "format_underlined",
    },
    WrapAction {
        tag: WrapTag::Code,
        label: "Code",
        icon: "code",
    },
    WrapAction {
        tag: WrapTag::H1,
        label: "Heading 1",
        icon: "format_h1",
    },
    WrapAction {
        tag: WrapTag::H2,
        label: "Heading 2",
        icon: "format_h2",
    },
    WrapAction {
        tag: WrapTag::Blockquote,
        label: "Quote",
        icon: "format_quote",
    },
];

pub fn action_for(tag: WrapTag) -> &'static WrapAction {
    // Every WrapTag has exactly one entry, in declaration order
    &WRAP_ACTIONS[tag as usize]
}
