//! Standard block renderers, one per [`BlockKind`](crate::domain::blocks::BlockKind).
//!
//! Each renderer declines with `None` when its block has nothing visible,
//! so empty sections leave no trace in the tree.

use serde_json::Value;

use crate::domain::blocks::{
    AboutUsBlock, ArchiveBlock, Block, CtaBackgroundBlock, CtaEmailBlock, FaqBlock, FormBlock,
    ImageCardBlock, ImageTextBlock, InfoCardBlock, ProgramGridBlock, RoadmapBlock, TabsBlock,
    TestimonialsBlock, ValuesBlock, VideoBlock,
};
use crate::domain::document::{DocumentRef, MediaRef};

use super::context::RenderContext;
use super::link::{is_unsafe_href, render_link_rows, render_media};
use super::registry::BlockRenderer;
use super::rich_text::render_optional;
use super::tree::RenderNode;

pub struct MediaRenderer;

impl BlockRenderer for MediaRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::Media(media) = block else {
            return None;
        };
        let image = render_media(media.media.as_ref())?;
        let caption = media
            .media
            .as_ref()
            .and_then(MediaRef::resolved)
            .and_then(|media| render_optional(media.caption.as_ref(), ctx));
        Some(
            RenderNode::element("mediaBlock")
                .child(image)
                .opt_child(caption),
        )
    }
}

/// Cards for embedded documents; bare ids were not expanded and are skipped.
pub struct ArchiveRenderer;

impl BlockRenderer for ArchiveRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::Archive(archive) = block else {
            return None;
        };
        let cards: Vec<RenderNode> = archive
            .documents()
            .iter()
            .filter_map(|reference| archive_card(archive, reference, ctx))
            .collect();
        if cards.is_empty() {
            return None;
        }
        Some(
            RenderNode::element("archive")
                .opt_prop(
                    "collection",
                    archive.relation_to.as_ref().map(|c| c.to_string()),
                )
                .opt_child(render_optional(archive.intro_content.as_ref(), ctx))
                .children_from(cards),
        )
    }
}

fn archive_card(
    archive: &ArchiveBlock,
    reference: &DocumentRef,
    ctx: &RenderContext<'_>,
) -> Option<RenderNode> {
    let document = reference.value.embedded()?;
    let collection = archive
        .relation_to
        .as_ref()
        .unwrap_or(&reference.collection);
    let href = document
        .slug
        .as_ref()
        .and_then(|slug| slug.for_locale(ctx.locale))
        .map(|slug| ctx.localize(&format!("/{collection}/{slug}")));
    let meta = document.meta.as_ref();
    let image = meta
        .and_then(|meta| meta.image.as_ref())
        .filter(|image| image.resolved().is_some())
        .or(document.hero_image.as_ref());
    let description = meta
        .and_then(|meta| meta.description.as_deref())
        .map(|description| description.split_whitespace().collect::<Vec<_>>().join(" "));

    Some(
        RenderNode::element("card")
            .opt_prop("title", document.title.clone())
            .opt_prop("description", description)
            .opt_prop("href", href)
            .opt_child(render_media(image)),
    )
}

pub struct FaqRenderer;

impl BlockRenderer for FaqRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::Faq(FaqBlock {
            heading,
            intro,
            items,
        }) = block
        else {
            return None;
        };
        let items: Vec<RenderNode> = items
            .iter()
            .filter(|item| !item.question.trim().is_empty())
            .map(|item| {
                RenderNode::element("faqItem")
                    .prop("question", item.question.trim())
                    .opt_child(render_optional(item.answer.as_ref(), ctx))
            })
            .collect();
        if items.is_empty() {
            return None;
        }
        Some(
            RenderNode::element("faq")
                .opt_prop("heading", non_blank(heading))
                .opt_child(render_optional(intro.as_ref(), ctx))
                .children_from(items),
        )
    }
}

pub struct TabsRenderer;

impl BlockRenderer for TabsRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::Tabs(TabsBlock {
            heading,
            intro,
            items,
        }) = block
        else {
            return None;
        };
        let tabs: Vec<RenderNode> = items
            .iter()
            .map(|item| {
                RenderNode::element("tab")
                    .prop("title", item.title.as_str())
                    .opt_prop("label", non_blank(&item.vertical_label))
                    .opt_prop("mobileLabel", non_blank(&item.horizontal_label))
                    .opt_prop("color", item.color.clone())
                    .opt_child(render_optional(item.description.as_ref(), ctx))
                    .opt_child(render_media(item.image.as_ref()))
            })
            .collect();
        if tabs.is_empty() {
            return None;
        }
        Some(
            RenderNode::element("tabs")
                .opt_prop("heading", non_blank(heading))
                .opt_child(render_optional(intro.as_ref(), ctx))
                .children_from(tabs),
        )
    }
}

/// Call to action over a full-bleed background image.
pub struct CtaBackgroundRenderer;

impl BlockRenderer for CtaBackgroundRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::CtaBackground(CtaBackgroundBlock {
            heading,
            description,
            links,
            background_image,
        }) = block
        else {
            return None;
        };
        let heading = non_blank(heading);
        let description = render_optional(description.as_ref(), ctx);
        let links = render_link_rows(links, ctx);
        if heading.is_none() && description.is_none() && links.is_none() {
            return None;
        }
        Some(
            RenderNode::element("ctaBackground")
                .opt_prop("heading", heading)
                .opt_child(role(render_media(background_image.as_ref()), "background"))
                .opt_child(description)
                .opt_child(links),
        )
    }
}

pub struct CtaEmailRenderer;

impl BlockRenderer for CtaEmailRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::CtaEmail(CtaEmailBlock {
            image,
            heading,
            description,
            input_placeholder,
            button_label,
            legal_note,
            show_decoration,
            action,
            success_redirect,
            honeypot_name,
        }) = block
        else {
            return None;
        };
        let heading = non_blank(heading)?;
        Some(
            RenderNode::element("ctaEmail")
                .prop("heading", heading)
                .opt_prop("description", non_blank(description))
                .opt_prop("placeholder", non_blank(input_placeholder))
                .opt_prop("buttonLabel", non_blank(button_label))
                .opt_prop("legalNote", non_blank(legal_note))
                .prop("decoration", *show_decoration)
                .opt_prop("action", safe_href(action, ctx))
                .opt_prop("successRedirect", safe_href(success_redirect, ctx))
                .opt_prop("honeypot", non_blank(honeypot_name))
                .opt_child(render_media(image.as_ref())),
        )
    }
}

pub struct RoadmapRenderer;

impl BlockRenderer for RoadmapRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::Roadmap(RoadmapBlock {
            heading,
            description,
            items,
        }) = block
        else {
            return None;
        };
        let steps: Vec<RenderNode> = items
            .iter()
            .filter(|item| !item.title.trim().is_empty())
            .enumerate()
            .map(|(index, item)| {
                RenderNode::element("step")
                    .prop("number", index + 1)
                    .prop("title", item.title.trim())
                    .opt_prop("color", item.color.clone())
                    .opt_child(render_media(item.image.as_ref()))
                    .opt_child(render_optional(item.description.as_ref(), ctx))
            })
            .collect();
        if steps.is_empty() {
            return None;
        }
        Some(
            RenderNode::element("roadmap")
                .opt_prop("heading", non_blank(heading))
                .opt_child(render_optional(description.as_ref(), ctx))
                .children_from(steps),
        )
    }
}

pub struct VideoRenderer;

impl BlockRenderer for VideoRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::Video(VideoBlock {
            heading,
            description,
            links,
            background_color,
            media_title,
            browser_url,
            media,
        }) = block
        else {
            return None;
        };
        let media = render_media(media.as_ref())?;
        Some(
            RenderNode::element("video")
                .opt_prop("heading", non_blank(heading))
                .opt_prop("color", background_color.clone())
                .opt_prop("mediaTitle", non_blank(media_title))
                .opt_prop("browserUrl", non_blank(browser_url))
                .child(media)
                .opt_child(render_optional(description.as_ref(), ctx))
                .opt_child(render_link_rows(links, ctx)),
        )
    }
}

pub struct AboutUsRenderer;

impl BlockRenderer for AboutUsRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::AboutUs(AboutUsBlock {
            heading,
            description,
            links,
            media,
        }) = block
        else {
            return None;
        };
        let heading = non_blank(heading);
        let description = render_optional(description.as_ref(), ctx);
        if heading.is_none() && description.is_none() {
            return None;
        }
        Some(
            RenderNode::element("aboutUs")
                .opt_prop("heading", heading)
                .opt_child(render_media(media.as_ref()))
                .opt_child(description)
                .opt_child(render_link_rows(links, ctx)),
        )
    }
}

pub struct ProgramGridRenderer;

impl BlockRenderer for ProgramGridRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::ProgramGrid(ProgramGridBlock { programs }) = block else {
            return None;
        };
        let cards: Vec<RenderNode> = programs
            .iter()
            .filter(|program| !program.title.trim().is_empty())
            .map(|program| {
                RenderNode::element("program")
                    .prop("title", program.title.trim())
                    .opt_prop("color", program.background_color.clone())
                    .opt_child(render_media(program.media.as_ref()))
                    .opt_child(render_optional(program.description.as_ref(), ctx))
                    .opt_child(render_link_rows(&program.links, ctx))
            })
            .collect();
        (!cards.is_empty()).then(|| RenderNode::element("programGrid").children_from(cards))
    }
}

pub struct ImageTextRenderer;

impl BlockRenderer for ImageTextRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::ImageText(ImageTextBlock {
            alignment,
            heading,
            description,
            background_color,
            media,
        }) = block
        else {
            return None;
        };
        let heading = non_blank(heading);
        let description = render_optional(description.as_ref(), ctx);
        let media = render_media(media.as_ref());
        if heading.is_none() && description.is_none() && media.is_none() {
            return None;
        }
        Some(
            RenderNode::element("imageText")
                .prop("alignment", alignment.as_str())
                .opt_prop("heading", heading)
                .opt_prop("color", background_color.clone())
                .opt_child(media)
                .opt_child(description),
        )
    }
}

pub struct ValuesRenderer;

impl BlockRenderer for ValuesRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::Values(ValuesBlock {
            heading,
            description,
            values,
        }) = block
        else {
            return None;
        };
        let values: Vec<RenderNode> = values
            .iter()
            .filter(|value| !value.title.trim().is_empty())
            .map(|value| {
                RenderNode::element("value")
                    .prop("title", value.title.trim())
                    .opt_prop("color", value.color.clone())
                    .opt_child(role(render_media(value.icon.as_ref()), "icon"))
                    .opt_child(render_optional(value.description.as_ref(), ctx))
            })
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(
            RenderNode::element("values")
                .opt_prop("heading", non_blank(heading))
                .opt_child(render_optional(description.as_ref(), ctx))
                .children_from(values),
        )
    }
}

pub struct TestimonialsRenderer;

impl BlockRenderer for TestimonialsRenderer {
    fn render(&self, block: &Block, _ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::Testimonials(TestimonialsBlock {
            heading,
            description,
            items,
        }) = block
        else {
            return None;
        };
        let quotes: Vec<RenderNode> = items
            .iter()
            .filter(|item| !item.quote.trim().is_empty())
            .map(|item| {
                RenderNode::element("testimonial")
                    .prop("name", item.name.trim())
                    .prop("stars", item.stars())
                    .opt_prop("subtitle", non_blank(&item.subtitle))
                    .opt_child(role(render_media(item.avatar.as_ref()), "avatar"))
                    .child(RenderNode::text(item.quote.trim()))
            })
            .collect();
        if quotes.is_empty() {
            return None;
        }
        Some(
            RenderNode::element("testimonials")
                .opt_prop("heading", non_blank(heading))
                .opt_prop("description", non_blank(description))
                .children_from(quotes),
        )
    }
}

/// Contact form; needs the form relationship to be set.
pub struct FormRenderer;

impl BlockRenderer for FormRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::Form(FormBlock {
            form,
            title,
            description,
            contact_info,
        }) = block
        else {
            return None;
        };
        let form_id = form.as_ref()?.id().to_string();

        let mut contacts = Vec::new();
        if let Some(email) = non_blank(&contact_info.email) {
            contacts.push(contact("email", format!("mailto:{email}"), email));
        }
        if let Some(phone) = non_blank(&contact_info.phone) {
            let dial: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
            contacts.push(contact("phone", format!("tel:{dial}"), phone));
        }
        let socials = [
            ("facebook", &contact_info.facebook_url, &contact_info.facebook_label, "Facebook"),
            ("instagram", &contact_info.instagram_url, &contact_info.instagram_label, "Instagram"),
        ];
        for (kind, url, label, fallback) in socials {
            if let Some(url) = safe_href(url, ctx) {
                let label = non_blank(label).unwrap_or_else(|| fallback.to_string());
                contacts.push(contact(kind, url, label));
            }
        }

        Some(
            RenderNode::element("form")
                .prop("formId", form_id)
                .opt_prop("title", non_blank(title))
                .opt_child(render_optional(description.as_ref(), ctx))
                .children_from(contacts),
        )
    }
}

fn contact(kind: &str, href: String, label: String) -> RenderNode {
    RenderNode::element("contact")
        .prop("kind", kind)
        .prop("href", href)
        .child(RenderNode::text(label))
}

pub struct ImageCardRenderer;

impl BlockRenderer for ImageCardRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::ImageCard(ImageCardBlock {
            media,
            badge,
            badge_icon,
            href,
        }) = block
        else {
            return None;
        };
        let image = render_media(media.as_ref())?;
        Some(
            RenderNode::element("imageCard")
                .opt_prop("badge", non_blank(badge))
                .opt_prop("href", safe_href(href, ctx))
                .child(image)
                .opt_child(role(render_media(badge_icon.as_ref()), "badge")),
        )
    }
}

pub struct InfoCardRenderer;

impl BlockRenderer for InfoCardRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        let Block::InfoCard(InfoCardBlock {
            icon,
            heading,
            body,
            color,
            href,
        }) = block
        else {
            return None;
        };
        let heading = non_blank(heading);
        let body = non_blank(body);
        if heading.is_none() && body.is_none() {
            return None;
        }
        Some(
            RenderNode::element("infoCard")
                .opt_prop("heading", heading)
                .opt_prop("body", body)
                .opt_prop("color", color.clone())
                .opt_prop("href", safe_href(href, ctx))
                .opt_child(role(render_media(icon.as_ref()), "icon")),
        )
    }
}

/// Tag a media node with the part it plays in its block.
fn role(media: Option<RenderNode>, role: &str) -> Option<RenderNode> {
    media.map(|media| media.prop("role", Value::from(role)))
}

/// A trimmed, non-scripting href; site-relative ones get the locale prefix.
fn safe_href(href: &Option<String>, ctx: &RenderContext<'_>) -> Option<String> {
    href.as_deref()
        .map(str::trim)
        .filter(|href| !href.is_empty() && !is_unsafe_href(href))
        .map(|href| ctx.localize(href))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::render::{BlockRegistry, HeroRegistry};
    use crate::domain::locale::LocaleSet;

    fn block(value: Value) -> Block {
        serde_json::from_value(value).expect("block decodes")
    }

    fn render_one(value: Value) -> Option<RenderNode> {
        let locales = LocaleSet::new(["sl", "en"], "sl").expect("valid locales");
        let en = locales.get("en").expect("en configured").clone();
        let blocks = BlockRegistry::standard();
        let heroes = HeroRegistry::standard();
        let ctx = RenderContext::new(&en, &locales, &blocks, &heroes);
        ctx.render_block(&block(value))
    }

    fn rich(text: &str) -> Value {
        json!({"root": {"type": "root", "children": [
            {"type": "paragraph", "children": [{"type": "text", "text": text}]}
        ]}})
    }

    #[test]
    fn empty_blocks_decline() {
        assert_eq!(render_one(json!({"blockType": "faqSection", "items": []})), None);
        assert_eq!(render_one(json!({"blockType": "mediaBlock", "media": 4})), None);
        assert_eq!(render_one(json!({"blockType": "infoCard", "heading": " "})), None);
        assert_eq!(render_one(json!({"blockType": "programGridSection", "programs": []})), None);
        assert_eq!(render_one(json!({"blockType": "ctaEmail", "heading": ""})), None);
        assert_eq!(render_one(json!({"blockType": "videoSection", "heading": "No media"})), None);
        assert_eq!(render_one(json!({"blockType": "formBlock", "title": "Contact"})), None);
    }

    #[test]
    fn media_block_takes_caption_from_media() {
        let node = render_one(json!({
            "blockType": "mediaBlock",
            "media": {"url": "/media/a.png", "alt": "A", "caption": rich("Taken in May")}
        }))
        .expect("renders");
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.text_content(), "Taken in May");
    }

    #[test]
    fn archive_cards_link_into_collection() {
        let node = render_one(json!({
            "blockType": "archive",
            "relationTo": "posts",
            "populatedDocs": [
                {"relationTo": "posts", "value": {"id": 1, "slug": "hello", "title": "Hello",
                 "meta": {"description": "Short\n  intro"}}},
                {"relationTo": "posts", "value": 2}
            ]
        }))
        .expect("renders");
        assert_eq!(node.children().len(), 1);
        let card = &node.children()[0];
        assert_eq!(card.get_prop("href"), Some(&json!("/en/posts/hello")));
        assert_eq!(card.get_prop("description"), Some(&json!("Short intro")));
    }

    #[test]
    fn faq_skips_blank_questions() {
        let node = render_one(json!({
            "blockType": "faqSection",
            "heading": "FAQ",
            "intro": rich("Common questions"),
            "items": [{"question": "  "}, {"question": "Parking?", "answer": rich("Yes")}]
        }))
        .expect("renders");
        let names: Vec<_> = node.children().iter().filter_map(RenderNode::name).collect();
        assert_eq!(names, vec!["richText", "faqItem"]);
        assert_eq!(node.children()[1].get_prop("question"), Some(&json!("Parking?")));
    }

    #[test]
    fn roadmap_numbers_visible_steps() {
        let node = render_one(json!({
            "blockType": "roadmapSection",
            "heading": "How it works",
            "items": [
                {"title": "Sign up", "color": "roza"},
                {"title": " "},
                {"title": "Come to class", "color": "modra"}
            ]
        }))
        .expect("renders");
        let numbers: Vec<_> = node
            .children()
            .iter()
            .filter_map(|step| step.get_prop("number"))
            .collect();
        assert_eq!(numbers, vec![&json!(1), &json!(2)]);
    }

    #[test]
    fn section_links_are_localized() {
        let node = render_one(json!({
            "blockType": "ctaBackgroundSection",
            "heading": "Join us",
            "links": [{"link": {"type": "custom", "url": "/programi", "label": "Programs"}}],
            "backgroundImage": {"url": "/media/bg.jpg"}
        }))
        .expect("renders");
        let media = &node.children()[0];
        assert_eq!(media.get_prop("role"), Some(&json!("background")));
        let links = &node.children()[1];
        assert_eq!(links.children()[0].get_prop("href"), Some(&json!("/en/programi")));
    }

    #[test]
    fn cta_email_drops_unsafe_action() {
        let node = render_one(json!({
            "blockType": "ctaEmail",
            "heading": "Newsletter",
            "action": "javascript:alert(1)",
            "successRedirect": "/hvala"
        }))
        .expect("renders");
        assert_eq!(node.get_prop("action"), None);
        assert_eq!(node.get_prop("successRedirect"), Some(&json!("/en/hvala")));
        assert_eq!(node.get_prop("decoration"), Some(&json!(true)));
    }

    #[test]
    fn image_text_keeps_alignment() {
        let node = render_one(json!({
            "blockType": "imageTextSection",
            "alignment": "imageLeft",
            "heading": "Our studio",
            "backgroundColor": "mint"
        }))
        .expect("renders");
        assert_eq!(node.get_prop("alignment"), Some(&json!("imageLeft")));
        assert_eq!(node.get_prop("color"), Some(&json!("mint")));
    }

    #[test]
    fn testimonials_clamp_stars() {
        let node = render_one(json!({
            "blockType": "testimonials",
            "heading": "Kind words",
            "items": [{"quote": "Wonderful", "name": "Ana", "numberOfStars": 12}]
        }))
        .expect("renders");
        let quote = &node.children()[0];
        assert_eq!(quote.get_prop("stars"), Some(&json!(5)));
        assert_eq!(quote.text_content(), "Wonderful");
    }

    #[test]
    fn form_lists_contact_channels() {
        let node = render_one(json!({
            "blockType": "formBlock",
            "form": {"id": 4, "title": "Contact"},
            "title": "Write to us",
            "contactInfo": {
                "email": "info@example.si",
                "phone": "041 123 456",
                "instagramUrl": "https://instagram.com/studio"
            }
        }))
        .expect("renders");
        assert_eq!(node.get_prop("formId"), Some(&json!("4")));
        let hrefs: Vec<_> = node
            .children()
            .iter()
            .filter_map(|contact| contact.get_prop("href"))
            .collect();
        assert_eq!(
            hrefs,
            vec![
                &json!("mailto:info@example.si"),
                &json!("tel:041123456"),
                &json!("https://instagram.com/studio")
            ]
        );
        assert_eq!(node.children()[2].text_content(), "Instagram");
    }

    #[test]
    fn program_grid_renders_programs_with_buttons() {
        let node = render_one(json!({
            "blockType": "programGridSection",
            "programs": [{
                "title": "Nosečniška vadba",
                "backgroundColor": "rumena",
                "media": {"url": "/media/p.jpg"},
                "links": [{"link": {
                    "type": "custom", "url": "/programi/nosecnice", "label": "Več"
                }}]
            }]
        }))
        .expect("renders");
        let program = &node.children()[0];
        assert_eq!(program.get_prop("color"), Some(&json!("rumena")));
        assert_eq!(program.children().len(), 2);
    }
}
