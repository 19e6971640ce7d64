//! Rendering whole stored documents through the registries.

use serde_json::json;

use vellum::{
    application::render::{BlockRegistry, HeroRegistry, RenderContext, RenderNode, render},
    domain::{
        blocks::{Block, BlockKind, PageLayout},
        document::Document,
        locale::LocaleSet,
    },
};

fn document() -> Document {
    serde_json::from_value(json!({
        "id": 5,
        "slug": "o-nas",
        "title": "O nas",
        "hero": {
            "type": "mediumImpact",
            "richText": {"root": {"type": "root", "children": [
                {"type": "paragraph", "children": [
                    {"type": "text", "text": "Dobrodošli ", "format": 0},
                    {"type": "text", "text": "doma", "format": 1}
                ]}
            ]}},
            "links": [
                {"link": {
                    "type": "custom", "url": "https://example.org/",
                    "label": "Zunaj", "newTab": true
                }}
            ]
        },
        "layout": [
            {
                "blockType": "aboutUsSection",
                "heading": "Kdo smo",
                "description": {"root": {"type": "root", "children": [
                    {"type": "paragraph", "children": [
                        {"type": "text", "text": "Studio za mamice", "format": 0}
                    ]}
                ]}},
                "links": [{"link": {
                    "type": "reference", "label": "Kontakt",
                    "reference": {"relationTo": "pages", "value": {"id": 6, "slug": "kontakt"}}
                }}]
            },
            {"blockType": "carousel", "slides": [1, 2]},
            {"blockType": "mediaBlock", "media": {"url": "/media/a.png", "alt": "A"}},
            {"blockType": "faqSection", "items": [{"question": "Odprto?"}]}
        ]
    }))
    .expect("document decodes")
}

fn layout(document: &Document) -> PageLayout {
    PageLayout {
        hero: document.hero.clone(),
        blocks: document.layout.clone(),
    }
}

#[test]
fn stored_page_renders_in_layout_order() {
    let locales = LocaleSet::new(["sl", "en"], "sl").expect("valid locales");
    let blocks = BlockRegistry::standard();
    let heroes = HeroRegistry::standard();
    let ctx = RenderContext::new(locales.default_locale(), &locales, &blocks, &heroes);

    let tree = render(&layout(&document()), &ctx);

    insta::assert_snapshot!(tree.outline(), @r#"
    <hero impact="medium">
      <richText>
        <paragraph>
          "Dobrodošli "
          "doma" [bold]
      <links>
        <link href="https://example.org/" newTab=true>
          "Zunaj"
    <aboutUs heading="Kdo smo">
      <richText>
        <paragraph>
          "Studio za mamice"
      <links>
        <link href="/sl/kontakt" newTab=false>
          "Kontakt"
    <mediaBlock>
      <media alt="A" url="/media/a.png">
    <faq>
      <faqItem question="Odprto?">
    "#);
}

#[test]
fn replacing_a_renderer_changes_only_its_blocks() {
    let locales = LocaleSet::new(["sl", "en"], "sl").expect("valid locales");
    let blocks = BlockRegistry::standard().with(
        BlockKind::Faq,
        |block: &Block, _: &RenderContext<'_>| match block {
            Block::Faq(faq) => {
                Some(RenderNode::element("accordion").prop("items", faq.items.len()))
            }
            _ => None,
        },
    );
    let heroes = HeroRegistry::new();
    let locale = locales.get("en").expect("configured");
    let ctx = RenderContext::new(locale, &locales, &blocks, &heroes);

    let tree = render(&layout(&document()), &ctx);
    let names: Vec<&str> = tree.nodes.iter().filter_map(RenderNode::name).collect();

    assert_eq!(names, vec!["aboutUs", "mediaBlock", "accordion"]);
    assert_eq!(
        tree.nodes[2].get_prop("items"),
        Some(&serde_json::Value::from(1))
    );
    let links = &tree.nodes[0].children()[1];
    assert_eq!(
        links.children()[0].get_prop("href"),
        Some(&serde_json::Value::from("/en/kontakt"))
    );
}
