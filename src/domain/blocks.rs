//! Layout blocks.
//!
//! A page layout is an ordered list of [`Block`]s discriminated by their
//! `blockType`. Kinds this crate does not know, and known kinds whose fields
//! do not decode, become [`Block::Unknown`] so a single bad block never
//! fails the whole page.

use std::fmt;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::document::{CollectionName, DocumentRef, DocumentValue, MediaRef};
use super::hero::Hero;
use super::link::LinkRow;
use super::rich_text::RichText;

const DISCRIMINATOR: &str = "blockType";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Media,
    Archive,
    Faq,
    Tabs,
    CtaBackground,
    CtaEmail,
    Roadmap,
    Video,
    AboutUs,
    ProgramGrid,
    ImageText,
    Values,
    Testimonials,
    Form,
    ImageCard,
    InfoCard,
}

impl BlockKind {
    pub const ALL: [BlockKind; 16] = [
        BlockKind::Media,
        BlockKind::Archive,
        BlockKind::Faq,
        BlockKind::Tabs,
        BlockKind::CtaBackground,
        BlockKind::CtaEmail,
        BlockKind::Roadmap,
        BlockKind::Video,
        BlockKind::AboutUs,
        BlockKind::ProgramGrid,
        BlockKind::ImageText,
        BlockKind::Values,
        BlockKind::Testimonials,
        BlockKind::Form,
        BlockKind::ImageCard,
        BlockKind::InfoCard,
    ];

    /// The `blockType` value stored in the CMS.
    pub fn discriminator(self) -> &'static str {
        match self {
            BlockKind::Media => "mediaBlock",
            BlockKind::Archive => "archive",
            BlockKind::Faq => "faqSection",
            BlockKind::Tabs => "tabsSection",
            BlockKind::CtaBackground => "ctaBackgroundSection",
            BlockKind::CtaEmail => "ctaEmail",
            BlockKind::Roadmap => "roadmapSection",
            BlockKind::Video => "videoSection",
            BlockKind::AboutUs => "aboutUsSection",
            BlockKind::ProgramGrid => "programGridSection",
            BlockKind::ImageText => "imageTextSection",
            BlockKind::Values => "valuesSection",
            BlockKind::Testimonials => "testimonials",
            BlockKind::Form => "formBlock",
            BlockKind::ImageCard => "imageCard",
            BlockKind::InfoCard => "infoCard",
        }
    }

    pub fn from_discriminator(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.discriminator() == value)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.discriminator())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Media(MediaBlock),
    Archive(ArchiveBlock),
    Faq(FaqBlock),
    Tabs(TabsBlock),
    CtaBackground(CtaBackgroundBlock),
    CtaEmail(CtaEmailBlock),
    Roadmap(RoadmapBlock),
    Video(VideoBlock),
    AboutUs(AboutUsBlock),
    ProgramGrid(ProgramGridBlock),
    ImageText(ImageTextBlock),
    Values(ValuesBlock),
    Testimonials(TestimonialsBlock),
    Form(FormBlock),
    ImageCard(ImageCardBlock),
    InfoCard(InfoCardBlock),
    Unknown { kind: String, fields: Value },
}

impl Block {
    /// `None` for blocks this crate cannot render.
    pub fn kind(&self) -> Option<BlockKind> {
        Some(match self {
            Block::Media(_) => BlockKind::Media,
            Block::Archive(_) => BlockKind::Archive,
            Block::Faq(_) => BlockKind::Faq,
            Block::Tabs(_) => BlockKind::Tabs,
            Block::CtaBackground(_) => BlockKind::CtaBackground,
            Block::CtaEmail(_) => BlockKind::CtaEmail,
            Block::Roadmap(_) => BlockKind::Roadmap,
            Block::Video(_) => BlockKind::Video,
            Block::AboutUs(_) => BlockKind::AboutUs,
            Block::ProgramGrid(_) => BlockKind::ProgramGrid,
            Block::ImageText(_) => BlockKind::ImageText,
            Block::Values(_) => BlockKind::Values,
            Block::Testimonials(_) => BlockKind::Testimonials,
            Block::Form(_) => BlockKind::Form,
            Block::ImageCard(_) => BlockKind::ImageCard,
            Block::InfoCard(_) => BlockKind::InfoCard,
            Block::Unknown { .. } => return None,
        })
    }

    /// The discriminator as stored, including for unknown blocks.
    pub fn discriminator(&self) -> &str {
        match self {
            Block::Unknown { kind, .. } => kind,
            block => block
                .kind()
                .map(BlockKind::discriminator)
                .unwrap_or_default(),
        }
    }

    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get(DISCRIMINATOR)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let Some(known) = BlockKind::from_discriminator(&kind) else {
            return Block::Unknown {
                kind,
                fields: value,
            };
        };

        let decoded = match known {
            BlockKind::Media => decode(&value).map(Block::Media),
            BlockKind::Archive => decode(&value).map(Block::Archive),
            BlockKind::Faq => decode(&value).map(Block::Faq),
            BlockKind::Tabs => decode(&value).map(Block::Tabs),
            BlockKind::CtaBackground => decode(&value).map(Block::CtaBackground),
            BlockKind::CtaEmail => decode(&value).map(Block::CtaEmail),
            BlockKind::Roadmap => decode(&value).map(Block::Roadmap),
            BlockKind::Video => decode(&value).map(Block::Video),
            BlockKind::AboutUs => decode(&value).map(Block::AboutUs),
            BlockKind::ProgramGrid => decode(&value).map(Block::ProgramGrid),
            BlockKind::ImageText => decode(&value).map(Block::ImageText),
            BlockKind::Values => decode(&value).map(Block::Values),
            BlockKind::Testimonials => decode(&value).map(Block::Testimonials),
            BlockKind::Form => decode(&value).map(Block::Form),
            BlockKind::ImageCard => decode(&value).map(Block::ImageCard),
            BlockKind::InfoCard => decode(&value).map(Block::InfoCard),
        };

        decoded.unwrap_or_else(|err| {
            warn!(
                block_type = %kind,
                block_id = value.get("id").and_then(serde_json::Value::as_str).unwrap_or(""),
                error = %err,
                "Block fields failed to decode; treating as unknown"
            );
            Block::Unknown {
                kind,
                fields: value,
            }
        })
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(value)
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Block::from_value)
    }
}

/// Hero plus ordered blocks: everything the dispatcher renders for a page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub hero: Option<Hero>,
    pub blocks: Vec<Block>,
}

/// Image position in an image-and-text section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    #[default]
    ImageRight,
    ImageLeft,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::ImageRight => "imageRight",
            Alignment::ImageLeft => "imageLeft",
        }
    }
}

/// Caption comes from the media record itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaBlock {
    #[serde(default)]
    pub media: Option<MediaRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PopulateBy {
    #[default]
    Collection,
    Selection,
}

/// A list of documents. Documents are embedded by the store before
/// rendering: `populatedDocs` for collection queries, `selectedDocs` for
/// hand-picked ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveBlock {
    #[serde(default)]
    pub intro_content: Option<RichText>,
    #[serde(default)]
    pub populate_by: PopulateBy,
    #[serde(default)]
    pub relation_to: Option<CollectionName>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub populated_docs: Vec<DocumentRef>,
    #[serde(default)]
    pub selected_docs: Vec<DocumentRef>,
}

impl ArchiveBlock {
    pub const DEFAULT_LIMIT: u32 = 3;

    /// Documents to show, capped at `limit` for collection queries.
    pub fn documents(&self) -> &[DocumentRef] {
        match self.populate_by {
            PopulateBy::Collection => {
                let limit = self.limit.filter(|limit| *limit > 0).unwrap_or(Self::DEFAULT_LIMIT);
                let end = self.populated_docs.len().min(limit as usize);
                &self.populated_docs[..end]
            }
            PopulateBy::Selection => &self.selected_docs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaqItem {
    pub question: String,
    #[serde(default)]
    pub answer: Option<RichText>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaqBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub intro: Option<RichText>,
    #[serde(default)]
    pub items: Vec<FaqItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabItem {
    pub title: String,
    #[serde(default)]
    pub vertical_label: Option<String>,
    #[serde(default)]
    pub horizontal_label: Option<String>,
    #[serde(default)]
    pub description: Option<RichText>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TabsBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub intro: Option<RichText>,
    #[serde(default)]
    pub items: Vec<TabItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaBackgroundBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub description: Option<RichText>,
    #[serde(default)]
    pub links: Vec<LinkRow>,
    #[serde(default)]
    pub background_image: Option<MediaRef>,
}

/// Newsletter signup. The form posts to `action` when set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaEmailBlock {
    #[serde(default)]
    pub image: Option<MediaRef>,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_placeholder: Option<String>,
    #[serde(default)]
    pub button_label: Option<String>,
    #[serde(default)]
    pub legal_note: Option<String>,
    #[serde(default = "default_true")]
    pub show_decoration: bool,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub success_redirect: Option<String>,
    #[serde(default)]
    pub honeypot_name: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoadmapItem {
    pub title: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<RichText>,
    #[serde(default)]
    pub image: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoadmapBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub description: Option<RichText>,
    #[serde(default)]
    pub items: Vec<RoadmapItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub description: Option<RichText>,
    #[serde(default)]
    pub links: Vec<LinkRow>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub media_title: Option<String>,
    #[serde(default)]
    pub browser_url: Option<String>,
    #[serde(default)]
    pub media: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AboutUsBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub description: Option<RichText>,
    #[serde(default)]
    pub links: Vec<LinkRow>,
    #[serde(default)]
    pub media: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub title: String,
    #[serde(default)]
    pub media: Option<MediaRef>,
    #[serde(default)]
    pub description: Option<RichText>,
    #[serde(default)]
    pub links: Vec<LinkRow>,
    #[serde(default)]
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgramGridBlock {
    #[serde(default)]
    pub programs: Vec<Program>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTextBlock {
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub description: Option<RichText>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub media: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValueItem {
    pub title: String,
    #[serde(default)]
    pub icon: Option<MediaRef>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<RichText>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValuesBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub description: Option<RichText>,
    #[serde(default)]
    pub values: Vec<ValueItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub quote: String,
    pub name: String,
    #[serde(default = "Testimonial::default_stars")]
    pub number_of_stars: u8,
    #[serde(default)]
    pub avatar: Option<MediaRef>,
    #[serde(default)]
    pub subtitle: Option<String>,
}

impl Testimonial {
    pub const MAX_STARS: u8 = 5;

    fn default_stars() -> u8 {
        Self::MAX_STARS
    }

    pub fn stars(&self) -> u8 {
        self.number_of_stars.min(Self::MAX_STARS)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestimonialsBlock {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<Testimonial>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub facebook_label: Option<String>,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub instagram_label: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
}

/// Contact form. The form definition itself is submitted client-side; only
/// its id is carried into the tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormBlock {
    #[serde(default)]
    pub form: Option<DocumentValue>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<RichText>,
    #[serde(default)]
    pub contact_info: ContactInfo,
}

/// Home hero card: an image with an optional badge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCardBlock {
    #[serde(default)]
    pub media: Option<MediaRef>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub badge_icon: Option<MediaRef>,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InfoCardBlock {
    #[serde(default)]
    pub icon: Option<MediaRef>,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn discriminators_round_trip() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_discriminator(kind.discriminator()), Some(kind));
        }
        assert_eq!(BlockKind::from_discriminator("carousel"), None);
        assert_eq!(BlockKind::from_discriminator("faq"), None);
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let block: Block = serde_json::from_value(json!({"blockType": "carousel", "slides": []}))
            .expect("decodes");
        assert_eq!(block.kind(), None);
        assert_eq!(block.discriminator(), "carousel");
    }

    #[test]
    fn malformed_known_kind_degrades_to_unknown() {
        let block: Block =
            serde_json::from_value(json!({"blockType": "faqSection", "items": "not a list"}))
                .expect("decodes");
        assert!(matches!(block, Block::Unknown { ref kind, .. } if kind == "faqSection"));
    }

    #[test]
    fn missing_discriminator_is_unknown() {
        let block: Block = serde_json::from_value(json!({"heading": "Orphan"})).expect("decodes");
        assert!(matches!(block, Block::Unknown { ref kind, .. } if kind.is_empty()));
    }

    #[test]
    fn section_blocks_decode_by_cms_slug() {
        let cases = [
            json!({"blockType": "faqSection", "heading": "FAQ", "items": [{"question": "Q?"}]}),
            json!({"blockType": "tabsSection", "items": [
                {"title": "Open", "verticalLabel": "Tab", "color": "roza"}
            ]}),
            json!({"blockType": "ctaBackgroundSection", "heading": "Join", "backgroundImage": 3}),
            json!({"blockType": "ctaEmail", "heading": "News", "image": 4}),
            json!({"blockType": "roadmapSection", "items": [{"title": "Step", "image": 5}]}),
            json!({"blockType": "videoSection", "heading": "Watch", "browserUrl": "site.si"}),
            json!({"blockType": "aboutUsSection", "heading": "Us", "media": 6}),
            json!({"blockType": "programGridSection", "programs": [{"title": "Yoga"}]}),
            json!({"blockType": "imageTextSection", "alignment": "imageLeft", "heading": "Hi"}),
            json!({"blockType": "valuesSection", "values": [{"title": "Care", "icon": 7}]}),
            json!({"blockType": "testimonials", "items": [{"quote": "Great", "name": "Ana"}]}),
            json!({"blockType": "formBlock", "form": 2, "title": "Contact"}),
            json!({"blockType": "imageCard", "badge": "New", "href": "/programi"}),
            json!({"blockType": "infoCard", "heading": "Hours"}),
        ];
        for value in cases {
            let expected = value["blockType"].as_str().map(str::to_string);
            let block = Block::from_value(value);
            assert!(block.kind().is_some(), "{expected:?} fell back to unknown");
            assert_eq!(Some(block.discriminator().to_string()), expected);
        }
    }

    #[test]
    fn cms_defaults_apply() {
        let Block::CtaEmail(cta) = Block::from_value(json!({"blockType": "ctaEmail"})) else {
            panic!("expected cta email");
        };
        assert!(cta.show_decoration);

        let Block::ImageText(section) =
            Block::from_value(json!({"blockType": "imageTextSection"}))
        else {
            panic!("expected image text section");
        };
        assert_eq!(section.alignment, Alignment::ImageRight);

        let Block::Testimonials(block) = Block::from_value(json!({
            "blockType": "testimonials",
            "items": [
                {"quote": "Lovely", "name": "Maja"},
                {"quote": "Fine", "name": "Eva", "numberOfStars": 9}
            ]
        })) else {
            panic!("expected testimonials");
        };
        assert_eq!(block.items[0].stars(), 5);
        assert_eq!(block.items[1].stars(), 5);
    }

    #[test]
    fn archive_picks_documents_by_population_mode() {
        let block: ArchiveBlock = serde_json::from_value(json!({
            "populateBy": "selection",
            "relationTo": "posts",
            "populatedDocs": [{"relationTo": "posts", "value": 1}],
            "selectedDocs": [
                {"relationTo": "posts", "value": 2},
                {"relationTo": "posts", "value": 3}
            ]
        }))
        .expect("decodes");
        assert_eq!(block.documents().len(), 2);
    }

    #[test]
    fn archive_collection_query_is_capped() {
        let docs: Vec<_> = (1..=5).map(|id| json!({"relationTo": "posts", "value": id})).collect();
        let block: ArchiveBlock =
            serde_json::from_value(json!({"populatedDocs": docs})).expect("decodes");
        assert_eq!(block.documents().len(), ArchiveBlock::DEFAULT_LIMIT as usize);
    }
}
