//! Pooled tile content owned by the board.

use tile_defence_core::{FactoryId, TileContent};
use tile_defence_system_pool::{Factory, Origin, Recyclable};

use crate::adaptation::Adaptation;

/// Identity of the factory that produces every tile content of a board.
pub(crate) const CONTENT_FACTORY: FactoryId = FactoryId::new(1);

/// Content instance placed on exactly one tile.
#[derive(Clone, Debug)]
pub struct PlacedContent {
    content: TileContent,
    origin: Origin,
    adaptation: Adaptation,
}

impl PlacedContent {
    /// Content carried by the instance.
    #[must_use]
    pub const fn content(&self) -> TileContent {
        self.content
    }

    /// Adaptation computed during the last path recomputation.
    #[must_use]
    pub const fn adaptation(&self) -> Adaptation {
        self.adaptation
    }

    pub(crate) fn adapt(&mut self, adaptation: Adaptation) {
        self.adaptation = adaptation;
    }
}

impl Recyclable for PlacedContent {
    type Key = (u8, u8);

    fn key(&self) -> Self::Key {
        key_of(self.content)
    }

    fn origin(&self) -> &Origin {
        &self.origin
    }

    fn origin_mut(&mut self) -> &mut Origin {
        &mut self.origin
    }

    fn recycle(&mut self) {
        self.adaptation = Adaptation::None;
    }
}

fn key_of(content: TileContent) -> (u8, u8) {
    (content.content_type().id(), content.variation())
}

/// Hands out content instances keyed by type and variation.
#[derive(Debug)]
pub(crate) struct ContentFactory {
    pool: Factory<PlacedContent>,
}

impl ContentFactory {
    pub(crate) fn new() -> Self {
        Self {
            pool: Factory::new(CONTENT_FACTORY),
        }
    }

    pub(crate) fn get(&mut self, content: TileContent) -> PlacedContent {
        self.pool.get_with(key_of(content), || PlacedContent {
            content,
            origin: Origin::default(),
            adaptation: Adaptation::None,
        })
    }

    pub(crate) fn reclaim(&mut self, instance: PlacedContent) {
        self.pool.reclaim(instance);
    }

    pub(crate) fn created(&self) -> u64 {
        self.pool.created()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_defence_core::TowerKind;

    #[test]
    fn reclaimed_content_is_reused() {
        let mut factory = ContentFactory::new();
        let tower = factory.get(TileContent::Tower(TowerKind::Laser));
        assert_eq!(tower.origin().get(), Some(CONTENT_FACTORY));
        factory.reclaim(tower);

        let again = factory.get(TileContent::Tower(TowerKind::Laser));
        assert_eq!(again.content(), TileContent::Tower(TowerKind::Laser));
        assert_eq!(factory.created(), 1, "second request must reuse the pooled tower");

        let archer = factory.get(TileContent::Tower(TowerKind::Archer));
        assert_eq!(archer.content(), TileContent::Tower(TowerKind::Archer));
        assert_eq!(factory.created(), 2, "variations are pooled separately");
    }
}
