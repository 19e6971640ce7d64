//! Lexical rich-text trees, reduced to the node types pages actually use.

use serde::Deserialize;

use super::document::DocumentRef;
use super::link::{Link, LinkTarget};

const FORMAT_BOLD: u32 = 1;
const FORMAT_ITALIC: u32 = 1 << 1;
const FORMAT_STRIKETHROUGH: u32 = 1 << 2;
const FORMAT_UNDERLINE: u32 = 1 << 3;
const FORMAT_CODE: u32 = 1 << 4;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RichText {
    pub root: RichTextNode,
}

impl RichText {
    /// Concatenated text content, paragraphs separated by a space.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.root.collect_text(&mut out);
        out.trim().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    #[default]
    Bullet,
    Number,
    Check,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RichTextNode {
    Root {
        #[serde(default)]
        children: Vec<RichTextNode>,
    },
    Paragraph {
        #[serde(default)]
        children: Vec<RichTextNode>,
    },
    Heading {
        #[serde(default = "default_heading_tag")]
        tag: String,
        #[serde(default)]
        children: Vec<RichTextNode>,
    },
    Text {
        #[serde(default)]
        text: String,
        #[serde(default)]
        format: u32,
    },
    Linebreak,
    Link {
        #[serde(default)]
        fields: LinkFields,
        #[serde(default)]
        children: Vec<RichTextNode>,
    },
    Autolink {
        #[serde(default)]
        fields: LinkFields,
        #[serde(default)]
        children: Vec<RichTextNode>,
    },
    List {
        #[serde(default, rename = "listType")]
        list_type: ListType,
        #[serde(default)]
        children: Vec<RichTextNode>,
    },
    Listitem {
        #[serde(default)]
        children: Vec<RichTextNode>,
    },
    Quote {
        #[serde(default)]
        children: Vec<RichTextNode>,
    },
    #[serde(other)]
    Unknown,
}

fn default_heading_tag() -> String {
    "h2".to_string()
}

impl RichTextNode {
    pub fn children(&self) -> &[RichTextNode] {
        match self {
            RichTextNode::Root { children }
            | RichTextNode::Paragraph { children }
            | RichTextNode::Heading { children, .. }
            | RichTextNode::Link { children, .. }
            | RichTextNode::Autolink { children, .. }
            | RichTextNode::List { children, .. }
            | RichTextNode::Listitem { children }
            | RichTextNode::Quote { children } => children,
            RichTextNode::Text { .. } | RichTextNode::Linebreak | RichTextNode::Unknown => &[],
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            RichTextNode::Text { text, .. } => out.push_str(text),
            RichTextNode::Linebreak => out.push(' '),
            RichTextNode::Unknown => {}
            node => {
                let block = matches!(
                    node,
                    RichTextNode::Paragraph { .. }
                        | RichTextNode::Heading { .. }
                        | RichTextNode::Listitem { .. }
                        | RichTextNode::Quote { .. }
                );
                if block && !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
                for child in node.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Plain text of this node's subtree.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }
}

/// Formatting marks encoded in a text node's bitmask.
pub fn text_marks(format: u32) -> Vec<&'static str> {
    [
        (FORMAT_BOLD, "bold"),
        (FORMAT_ITALIC, "italic"),
        (FORMAT_STRIKETHROUGH, "strikethrough"),
        (FORMAT_UNDERLINE, "underline"),
        (FORMAT_CODE, "code"),
    ]
    .into_iter()
    .filter(|(bit, _)| format & bit != 0)
    .map(|(_, mark)| mark)
    .collect()
}

/// Fields carried by inline link nodes.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkFields {
    pub link_type: Option<String>,
    pub url: Option<String>,
    pub doc: Option<DocumentRef>,
    pub new_tab: bool,
}

impl LinkFields {
    /// Convert to a [`Link`] so inline links resolve like link fields.
    pub fn to_link(&self, label: Option<String>) -> Link {
        let target = match (self.link_type.as_deref(), &self.doc) {
            (Some("internal"), Some(doc)) => LinkTarget::Reference(doc.clone()),
            _ => LinkTarget::Custom {
                url: self.url.clone(),
            },
        };
        Link {
            target,
            label,
            new_tab: self.new_tab,
            appearance: None,
        }
    }
}
