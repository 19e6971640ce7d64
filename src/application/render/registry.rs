//! Renderer registries.
//!
//! Built once at startup and shared read-only; a kind without a renderer
//! is simply not rendered.

use std::collections::HashMap;

use crate::domain::blocks::{Block, BlockKind};
use crate::domain::hero::{Hero, HeroKind};

use super::blocks;
use super::context::RenderContext;
use super::heroes;
use super::tree::RenderNode;

pub trait BlockRenderer: Send + Sync {
    /// Render `block`, or decline with `None` when it has nothing to show.
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode>;
}

pub trait HeroRenderer: Send + Sync {
    fn render(&self, hero: &Hero, ctx: &RenderContext<'_>) -> Option<RenderNode>;
}

impl<F> BlockRenderer for F
where
    F: Fn(&Block, &RenderContext<'_>) -> Option<RenderNode> + Send + Sync,
{
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        self(block, ctx)
    }
}

impl<F> HeroRenderer for F
where
    F: Fn(&Hero, &RenderContext<'_>) -> Option<RenderNode> + Send + Sync,
{
    fn render(&self, hero: &Hero, ctx: &RenderContext<'_>) -> Option<RenderNode> {
        self(hero, ctx)
    }
}

#[derive(Default)]
pub struct BlockRegistry {
    renderers: HashMap<BlockKind, Box<dyn BlockRenderer>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every block kind with its standard renderer.
    pub fn standard() -> Self {
        Self::new()
            .with(BlockKind::Media, blocks::MediaRenderer)
            .with(BlockKind::Archive, blocks::ArchiveRenderer)
            .with(BlockKind::Faq, blocks::FaqRenderer)
            .with(BlockKind::Tabs, blocks::TabsRenderer)
            .with(BlockKind::CtaBackground, blocks::CtaBackgroundRenderer)
            .with(BlockKind::CtaEmail, blocks::CtaEmailRenderer)
            .with(BlockKind::Roadmap, blocks::RoadmapRenderer)
            .with(BlockKind::Video, blocks::VideoRenderer)
            .with(BlockKind::AboutUs, blocks::AboutUsRenderer)
            .with(BlockKind::ProgramGrid, blocks::ProgramGridRenderer)
            .with(BlockKind::ImageText, blocks::ImageTextRenderer)
            .with(BlockKind::Values, blocks::ValuesRenderer)
            .with(BlockKind::Testimonials, blocks::TestimonialsRenderer)
            .with(BlockKind::Form, blocks::FormRenderer)
            .with(BlockKind::ImageCard, blocks::ImageCardRenderer)
            .with(BlockKind::InfoCard, blocks::InfoCardRenderer)
    }

    /// Register (or replace) the renderer for `kind`.
    pub fn with(mut self, kind: BlockKind, renderer: impl BlockRenderer + 'static) -> Self {
        self.renderers.insert(kind, Box::new(renderer));
        self
    }

    pub fn without(mut self, kind: BlockKind) -> Self {
        self.renderers.remove(&kind);
        self
    }

    pub fn get(&self, kind: BlockKind) -> Option<&dyn BlockRenderer> {
        self.renderers.get(&kind).map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

#[derive(Default)]
pub struct HeroRegistry {
    renderers: HashMap<HeroKind, Box<dyn HeroRenderer>>,
}

impl HeroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self::new()
            .with(HeroKind::HighImpact, heroes::ImpactHeroRenderer)
            .with(HeroKind::MediumImpact, heroes::ImpactHeroRenderer)
            .with(HeroKind::LowImpact, heroes::ImpactHeroRenderer)
            .with(HeroKind::Home, heroes::HomeHeroRenderer)
            .with(HeroKind::About, heroes::AboutHeroRenderer)
            .with(HeroKind::Post, heroes::PostHeroRenderer)
    }

    pub fn with(mut self, kind: HeroKind, renderer: impl HeroRenderer + 'static) -> Self {
        self.renderers.insert(kind, Box::new(renderer));
        self
    }

    pub fn get(&self, kind: HeroKind) -> Option<&dyn HeroRenderer> {
        self.renderers.get(&kind).map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}
