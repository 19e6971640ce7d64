use crate::domain::rich_text::{ListType, RichText, RichTextNode, text_marks};

use super::context::RenderContext;
use super::link::render_link_with_children;
use super::tree::RenderNode;

/// Render a rich-text field; empty documents render nothing.
pub fn render_rich_text(text: &RichText, ctx: &RenderContext<'_>) -> Option<RenderNode> {
    if text.is_empty() {
        return None;
    }
    let children = render_children(text.root.children(), ctx);
    (!children.is_empty()).then(|| RenderNode::element("richText").children_from(children))
}

pub fn render_optional(text: Option<&RichText>, ctx: &RenderContext<'_>) -> Option<RenderNode> {
    text.and_then(|text| render_rich_text(text, ctx))
}

fn render_children(nodes: &[RichTextNode], ctx: &RenderContext<'_>) -> Vec<RenderNode> {
    nodes
        .iter()
        .flat_map(|node| render_node(node, ctx))
        .collect()
}

fn render_node(node: &RichTextNode, ctx: &RenderContext<'_>) -> Vec<RenderNode> {
    match node {
        RichTextNode::Root { children } => render_children(children, ctx),
        RichTextNode::Paragraph { children } => {
            vec![RenderNode::element("paragraph").children_from(render_children(children, ctx))]
        }
        RichTextNode::Heading { tag, children } => vec![
            RenderNode::element("heading")
                .prop("level", heading_level(tag))
                .children_from(render_children(children, ctx)),
        ],
        RichTextNode::Text { text, .. } if text.is_empty() => Vec::new(),
        RichTextNode::Text { text, format } => {
            vec![RenderNode::marked_text(text.clone(), &text_marks(*format))]
        }
        RichTextNode::Linebreak => vec![RenderNode::element("linebreak")],
        RichTextNode::Link { fields, children } | RichTextNode::Autolink { fields, children } => {
            let link = fields.to_link(None);
            render_link_with_children(&link, render_children(children, ctx), ctx)
        }
        RichTextNode::List {
            list_type,
            children,
        } => vec![
            RenderNode::element("list")
                .prop("ordered", matches!(list_type, ListType::Number))
                .prop("checklist", matches!(list_type, ListType::Check))
                .children_from(render_children(children, ctx)),
        ],
        RichTextNode::Listitem { children } => {
            vec![RenderNode::element("listItem").children_from(render_children(children, ctx))]
        }
        RichTextNode::Quote { children } => {
            vec![RenderNode::element("quote").children_from(render_children(children, ctx))]
        }
        RichTextNode::Unknown => Vec::new(),
    }
}

fn heading_level(tag: &str) -> u8 {
    tag.strip_prefix('h')
        .and_then(|level| level.parse::<u8>().ok())
        .filter(|level| (1..=6).contains(level))
        .unwrap_or(2)
}
