//! Layout rendering.
//!
//! Rendering is pure: a [`PageLayout`] plus a [`RenderContext`] yields a
//! [`RenderTree`] with no I/O and no shared mutable state. Blocks and
//! heroes are dispatched by kind through the registries in the context;
//! kinds without a renderer are left out of the tree.

mod blocks;
mod context;
mod heroes;
mod link;
mod registry;
mod rich_text;
mod tree;

pub use blocks::{
    AboutUsRenderer, ArchiveRenderer, CtaBackgroundRenderer, CtaEmailRenderer, FaqRenderer,
    FormRenderer, ImageCardRenderer, ImageTextRenderer, InfoCardRenderer, MediaRenderer,
    ProgramGridRenderer, RoadmapRenderer, TabsRenderer, TestimonialsRenderer, ValuesRenderer,
    VideoRenderer,
};
pub use context::RenderContext;
pub use heroes::{AboutHeroRenderer, HomeHeroRenderer, ImpactHeroRenderer, PostHeroRenderer};
pub use link::{is_unsafe_href, render_link, render_media};
pub use registry::{BlockRegistry, BlockRenderer, HeroRegistry, HeroRenderer};
pub use rich_text::render_rich_text;
pub use tree::{RenderNode, RenderTree};

use crate::domain::blocks::PageLayout;

/// Render the hero (first, when it yields a node) followed by the blocks.
pub fn render(layout: &PageLayout, ctx: &RenderContext<'_>) -> RenderTree {
    let hero = layout.hero.as_ref().and_then(|hero| ctx.render_hero(hero));
    let nodes = hero
        .into_iter()
        .chain(ctx.render_blocks(&layout.blocks))
        .collect();
    RenderTree {
        locale: ctx.locale.clone(),
        preview: ctx.authenticated,
        nodes,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::blocks::Block;
    use crate::domain::hero::Hero;
    use crate::domain::locale::LocaleSet;

    fn layout() -> PageLayout {
        PageLayout {
            hero: Some(Hero::from_value(json!({
                "type": "lowImpact",
                "richText": {"root": {"type": "root", "children": [
                    {"type": "heading", "tag": "h1",
                     "children": [{"type": "text", "text": "About"}]}
                ]}}
            }))),
            blocks: vec![
                Block::from_value(json!({
                    "blockType": "faqSection",
                    "items": [{"question": "Open?"}]
                })),
                Block::from_value(json!({"blockType": "carousel"})),
                Block::from_value(json!({"blockType": "infoCard", "heading": "Hours"})),
            ],
        }
    }

    #[test]
    fn hero_first_then_known_blocks_in_order() {
        let locales = LocaleSet::new(["sl", "en"], "sl").expect("valid locales");
        let blocks = BlockRegistry::standard();
        let heroes = HeroRegistry::standard();
        let ctx = RenderContext::new(locales.default_locale(), &locales, &blocks, &heroes);

        let tree = render(&layout(), &ctx);
        insta::assert_snapshot!(tree.outline(), @r#"
        <hero impact="low">
          <richText>
            <heading level=1>
              "About"
        <faq>
          <faqItem question="Open?">
        <infoCard heading="Hours">
        "#);
    }

    #[test]
    fn rendering_is_repeatable() {
        let locales = LocaleSet::new(["sl", "en"], "sl").expect("valid locales");
        let blocks = BlockRegistry::standard();
        let heroes = HeroRegistry::standard();
        let ctx = RenderContext::new(locales.default_locale(), &locales, &blocks, &heroes)
            .authenticated(true);

        let first = render(&layout(), &ctx);
        assert_eq!(first, render(&layout(), &ctx));
        assert!(first.preview);
    }

    #[test]
    fn missing_renderer_omits_block() {
        let locales = LocaleSet::new(["en"], "en").expect("valid locales");
        let blocks = BlockRegistry::standard().without(crate::domain::blocks::BlockKind::Faq);
        let heroes = HeroRegistry::new();
        let ctx = RenderContext::new(locales.default_locale(), &locales, &blocks, &heroes);

        let tree = render(&layout(), &ctx);
        let names: Vec<_> = tree.nodes.iter().filter_map(RenderNode::name).collect();
        assert_eq!(names, vec!["infoCard"]);
    }
}
