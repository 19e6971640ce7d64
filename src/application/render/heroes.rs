use crate::domain::hero::{AboutHero, Hero, HomeHero, ImpactHero, PostHero};

use super::context::RenderContext;
use super::link::{render_link_rows, render_media};
use super::registry::HeroRenderer;
use super::rich_text::render_optional;
use super::tree::RenderNode;

/// High, medium and low impact heroes share fields and differ in layout.
pub struct ImpactHeroRenderer;

impl HeroRenderer for ImpactHeroRenderer {
    fn render(&self, hero: &Hero, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let (impact, ImpactHero { rich_text, links, media }) = match hero {
            Hero::HighImpact(fields) => ("high", fields),
            Hero::MediumImpact(fields) => ("medium", fields),
            Hero::LowImpact(fields) => ("low", fields),
            _ => return None,
        };
        let text = render_optional(rich_text.as_ref(), ctx);
        let links = render_link_rows(links, ctx);
        let media = render_media(media.as_ref());
        if text.is_none() && links.is_none() && media.is_none() {
            return None;
        }
        Some(
            RenderNode::element("hero")
                .prop("impact", impact)
                .opt_child(media)
                .opt_child(text)
                .opt_child(links),
        )
    }
}

/// Text and buttons on the left, columns of cards on the right. Cards are
/// blocks and go through the block registry.
pub struct HomeHeroRenderer;

impl HeroRenderer for HomeHeroRenderer {
    fn render(&self, hero: &Hero, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Hero::Home(HomeHero { left, right }) = hero else {
            return None;
        };
        let title = trimmed(left.title.as_deref());
        let columns: Vec<RenderNode> = right
            .columns
            .iter()
            .map(|column| ctx.render_blocks(&column.cards))
            .filter(|cards| !cards.is_empty())
            .map(|cards| RenderNode::element("column").children_from(cards))
            .collect();
        if title.is_none() && columns.is_empty() {
            return None;
        }
        let stars = left.stars();
        Some(
            RenderNode::element("homeHero")
                .opt_prop("title", title)
                .opt_prop("tagline", trimmed(left.tagline.as_deref()))
                .opt_prop("stars", (stars > 0).then_some(stars))
                .opt_prop("description", trimmed(left.description.as_deref()))
                .opt_child(render_link_rows(&left.links, ctx))
                .opt_child(
                    (!columns.is_empty())
                        .then(|| RenderNode::element("columns").children_from(columns)),
                ),
        )
    }
}

/// Title, rich text and buttons beside a portrait photo.
pub struct AboutHeroRenderer;

impl HeroRenderer for AboutHeroRenderer {
    fn render(&self, hero: &Hero, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Hero::About(AboutHero { about }) = hero else {
            return None;
        };
        let title = trimmed(about.title.as_deref());
        let text = render_optional(about.rich_text.as_ref(), ctx);
        if title.is_none() && text.is_none() {
            return None;
        }
        Some(
            RenderNode::element("aboutHero")
                .opt_prop("title", title)
                .opt_child(text)
                .opt_child(render_link_rows(&about.links, ctx))
                .opt_child(render_media(about.photo.as_ref())),
        )
    }
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub struct PostHeroRenderer;

impl HeroRenderer for PostHeroRenderer {
    fn render(&self, hero: &Hero, _ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Hero::Post(PostHero {
            title,
            media,
            categories,
            published_at,
        }) = hero
        else {
            return None;
        };
        let categories: Vec<&str> = categories
            .iter()
            .map(|category| category.trim())
            .filter(|category| !category.is_empty())
            .collect();
        Some(
            RenderNode::element("postHero")
                .prop("title", title.as_str())
                .opt_prop("publishedAt", published_at.clone())
                .opt_prop(
                    "categories",
                    (!categories.is_empty()).then(|| categories.join(", ")),
                )
                .opt_child(render_media(media.as_ref())),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::render::{BlockRegistry, HeroRegistry, RenderTree};
    use crate::domain::locale::{Locale, LocaleSet};

    fn render(value: serde_json::Value) -> Option<RenderNode> {
        let locales = LocaleSet::new(["sl", "en"], "sl").expect("valid locales");
        let blocks = BlockRegistry::standard();
        let heroes = HeroRegistry::standard();
        let ctx = RenderContext::new(locales.default_locale(), &locales, &blocks, &heroes);
        ctx.render_hero(&Hero::from_value(value))
    }

    #[test]
    fn none_and_unknown_render_nothing() {
        assert_eq!(render(json!({"type": "none"})), None);
        assert_eq!(render(json!({"type": "servicesHero"})), None);
    }

    #[test]
    fn impact_level_follows_kind() {
        let node = render(json!({
            "type": "mediumImpact",
            "links": [{"link": {"type": "custom", "url": "/contact", "label": "Contact"}}]
        }))
        .expect("renders");
        assert_eq!(node.get_prop("impact"), Some(&json!("medium")));
        assert_eq!(node.text_content(), "Contact");
    }

    #[test]
    fn empty_impact_hero_declines() {
        assert_eq!(render(json!({"type": "highImpact", "links": []})), None);
    }

    #[test]
    fn home_hero_renders_cards_through_registry() {
        let node = render(json!({
            "type": "homeHero",
            "left": {"title": "Welcome", "stars": 4,
                     "links": [{"link": {
                         "type": "custom", "url": "/programi", "label": "Programi"
                     }}]},
            "right": {"columns": [
                {"cards": [
                    {"blockType": "infoCard", "heading": "Classes", "href": "/programs"},
                    {"blockType": "unknownCard"}
                ]},
                {"cards": [{"blockType": "imageCard", "media": 9}]},
                {"cards": [{"blockType": "imageCard", "badge": "Novo", "media": {"url": "/m.jpg"}}]}
            ]}
        }))
        .expect("renders");
        assert_eq!(node.get_prop("stars"), Some(&json!(4)));

        let parts = RenderTree {
            locale: Locale::parse("sl").expect("valid locale"),
            preview: false,
            nodes: node.children().to_vec(),
        };
        insta::assert_snapshot!(parts.outline(), @r#"
        <links>
          <link href="/sl/programi" newTab=false>
            "Programi"
        <columns>
          <column>
            <infoCard heading="Classes" href="/sl/programs">
          <column>
            <imageCard badge="Novo">
              <media url="/m.jpg">
        "#);
    }

    #[test]
    fn about_hero_renders_group_fields() {
        let node = render(json!({
            "type": "aboutHero",
            "O meni": {
                "title": "Sem Ana",
                "photo": {"url": "/media/ana.jpg", "alt": "Ana"}
            }
        }))
        .expect("renders");
        assert_eq!(node.name(), Some("aboutHero"));
        assert_eq!(node.get_prop("title"), Some(&json!("Sem Ana")));
        assert_eq!(node.children()[0].name(), Some("media"));

        assert_eq!(render(json!({"type": "aboutHero", "O meni": {}})), None);
    }
}
