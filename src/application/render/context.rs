use tracing::debug;

use crate::domain::blocks::Block;
use crate::domain::hero::Hero;
use crate::domain::locale::{Locale, LocaleSet};

use super::registry::{BlockRegistry, HeroRegistry};
use super::tree::RenderNode;

/// Everything a renderer may depend on, passed explicitly.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub locale: &'a Locale,
    pub locales: &'a LocaleSet,
    /// Request comes from a signed-in editor.
    pub authenticated: bool,
    pub blocks: &'a BlockRegistry,
    pub heroes: &'a HeroRegistry,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        locale: &'a Locale,
        locales: &'a LocaleSet,
        blocks: &'a BlockRegistry,
        heroes: &'a HeroRegistry,
    ) -> Self {
        Self {
            locale,
            locales,
            authenticated: false,
            blocks,
            heroes,
        }
    }

    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    /// Render blocks in order, skipping unknown or declined ones.
    pub fn render_blocks(&self, blocks: &[Block]) -> Vec<RenderNode> {
        blocks
            .iter()
            .filter_map(|block| self.render_block(block))
            .collect()
    }

    pub fn render_block(&self, block: &Block) -> Option<RenderNode> {
        let Some(kind) = block.kind() else {
            debug!(block_type = block.discriminator(), "Skipping unknown block");
            return None;
        };
        let Some(renderer) = self.blocks.get(kind) else {
            debug!(block_type = %kind, "No renderer registered; block omitted");
            return None;
        };
        renderer.render(block, self)
    }

    pub fn render_hero(&self, hero: &Hero) -> Option<RenderNode> {
        let kind = match hero {
            Hero::None => return None,
            Hero::Unknown { kind } => {
                debug!(hero_type = %kind, "Skipping unknown hero");
                return None;
            }
            hero => hero.kind()?,
        };
        let Some(renderer) = self.heroes.get(kind) else {
            debug!(hero_type = %kind, "No renderer registered; hero omitted");
            return None;
        };
        renderer.render(hero, self)
    }

    /// Prefix a site-relative href with the current locale.
    pub fn localize(&self, href: &str) -> String {
        self.locales.localize(href, self.locale)
    }
}
