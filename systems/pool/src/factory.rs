use std::{collections::BTreeMap, fmt::Debug};

use tile_defence_core::FactoryId;
use tracing::trace;

/// Back-reference from an instance to the factory that created it.
///
/// The slot may be written exactly once; assigning a second factory is a
/// programming error and panics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Origin {
    factory: Option<FactoryId>,
}

impl Origin {
    /// Creates an origin that is already bound to `factory`.
    ///
    /// Used when restoring instances from persisted state.
    #[must_use]
    pub const fn bound(factory: FactoryId) -> Self {
        Self {
            factory: Some(factory),
        }
    }

    /// Binds the slot to the provided factory.
    ///
    /// # Panics
    ///
    /// Panics if the slot was already bound.
    pub fn assign(&mut self, factory: FactoryId) {
        assert!(
            self.factory.is_none(),
            "redefined origin factory: {:?} -> {factory:?}",
            self.factory
        );
        self.factory = Some(factory);
    }

    /// Factory the instance belongs to, if bound.
    #[must_use]
    pub const fn get(&self) -> Option<FactoryId> {
        self.factory
    }
}

/// Behaviour required from values managed by a [`Factory`].
pub trait Recyclable {
    /// Identity used to match pooled instances with requests.
    type Key: Copy + Ord + Debug;

    /// Key the instance was created for.
    fn key(&self) -> Self::Key;

    /// Factory the instance originated from.
    fn origin(&self) -> &Origin;

    /// Mutable access to the origin slot.
    fn origin_mut(&mut self) -> &mut Origin;

    /// Resets transient state before the instance re-enters the pool.
    fn recycle(&mut self);
}

/// Free-list of dead instances keyed by type and variation.
#[derive(Debug)]
pub struct Factory<T: Recyclable> {
    id: FactoryId,
    pool: BTreeMap<T::Key, Vec<T>>,
    created: u64,
}

impl<T: Recyclable> Factory<T> {
    /// Creates an empty factory with the provided identity.
    #[must_use]
    pub fn new(id: FactoryId) -> Self {
        Self {
            id,
            pool: BTreeMap::new(),
            created: 0,
        }
    }

    /// Identity stamped onto every instance the factory creates.
    #[must_use]
    pub const fn id(&self) -> FactoryId {
        self.id
    }

    /// Number of instances constructed since the factory was created.
    #[must_use]
    pub const fn created(&self) -> u64 {
        self.created
    }

    /// Number of dead instances waiting for reuse under `key`.
    #[must_use]
    pub fn pooled(&self, key: T::Key) -> usize {
        self.pool.get(&key).map_or(0, Vec::len)
    }

    /// Returns a pooled instance for `key`, or builds one with `create`.
    ///
    /// Freshly built instances are bound to this factory.
    pub fn get_with<F>(&mut self, key: T::Key, create: F) -> T
    where
        F: FnOnce() -> T,
    {
        if let Some(instance) = self.pool.get_mut(&key).and_then(Vec::pop) {
            trace!(factory = self.id.get(), ?key, "reusing pooled instance");
            return instance;
        }

        let mut instance = create();
        debug_assert_eq!(instance.key(), key, "factory built an instance for another key");
        instance.origin_mut().assign(self.id);
        self.created = self.created.saturating_add(1);
        instance
    }

    /// Returns a dead instance to the pool after resetting it.
    ///
    /// # Panics
    ///
    /// Panics if the instance originated from another factory.
    pub fn reclaim(&mut self, mut instance: T) {
        assert_eq!(
            instance.origin().get(),
            Some(self.id),
            "instance reclaimed by the wrong factory"
        );
        instance.recycle();
        self.pool.entry(instance.key()).or_default().push(instance);
    }
}
