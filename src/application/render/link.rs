//! Link and media leaves shared by every renderer.

use tracing::debug;

use crate::domain::document::MediaRef;
use crate::domain::link::{Link, LinkRow};

use super::context::RenderContext;
use super::tree::RenderNode;

const UNSAFE_SCHEMES: [&str; 3] = ["javascript:", "data:", "vbscript:"];

/// Whether `href` would execute or inline content when followed.
pub fn is_unsafe_href(href: &str) -> bool {
    let normalized: String = href
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    UNSAFE_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

/// Render `link` with its own label, or `fallback_label` when it has none.
///
/// Links that do not resolve, or resolve to an unsafe scheme, become the
/// label as plain text; without a label they render nothing.
pub fn render_link(
    link: &Link,
    fallback_label: Option<&str>,
    ctx: &RenderContext<'_>,
) -> Option<RenderNode> {
    let label = link
        .label
        .as_deref()
        .or(fallback_label)
        .map(str::trim)
        .filter(|label| !label.is_empty());

    let href = match link.resolve_path(ctx.locale) {
        Some(href) if is_unsafe_href(&href) => {
            debug!(href = %href, "Refusing unsafe link; rendering label only");
            None
        }
        other => other,
    };

    let Some(href) = href else {
        return label.map(RenderNode::text);
    };

    Some(
        RenderNode::element("link")
            .prop("href", ctx.localize(&href))
            .prop("newTab", link.new_tab)
            .opt_prop("appearance", link.appearance.clone())
            .opt_child(label.map(RenderNode::text)),
    )
}

/// Render a link wrapping already-rendered children (rich-text links).
pub fn render_link_with_children(
    link: &Link,
    children: Vec<RenderNode>,
    ctx: &RenderContext<'_>,
) -> Vec<RenderNode> {
    let href = link
        .resolve_path(ctx.locale)
        .filter(|href| !is_unsafe_href(href));
    match href {
        Some(href) => vec![
            RenderNode::element("link")
                .prop("href", ctx.localize(&href))
                .prop("newTab", link.new_tab)
                .children_from(children),
        ],
        None => children,
    }
}

/// Render a group of link rows, dropping rows that render nothing.
pub fn render_link_rows(rows: &[LinkRow], ctx: &RenderContext<'_>) -> Option<RenderNode> {
    let links: Vec<RenderNode> = rows
        .iter()
        .filter_map(|row| render_link(&row.link, None, ctx))
        .collect();
    (!links.is_empty()).then(|| RenderNode::element("links").children_from(links))
}

/// Expanded media with a URL; bare ids render nothing.
pub fn render_media(media: Option<&MediaRef>) -> Option<RenderNode> {
    let media = media?.resolved()?;
    Some(
        RenderNode::element("media")
            .opt_prop("url", media.url.clone())
            .opt_prop("alt", media.alt.clone())
            .opt_prop("width", media.width)
            .opt_prop("height", media.height)
            .opt_prop("mimeType", media.mime_type.clone()),
    )
}
