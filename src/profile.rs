use crate::tables::TableCache;

/// Game profile flags that change record layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Profile {
    /// Enhanced Edition layouts carry extra fields in items, projectiles and area effects.
    pub enhanced_edition: bool,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enhanced_edition(mut self, enhanced_edition: bool) -> Self {
        self.enhanced_edition = enhanced_edition;
        self
    }
}

/// Everything a schema may consult while resolving its layout.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub profile: Profile,
    pub tables: &'a TableCache,
}

impl<'a> Context<'a> {
    pub fn new(tables: &'a TableCache) -> Self {
        Context {
            profile: Profile::default(),
            tables,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn is_enhanced_edition(&self) -> bool {
        self.profile.enhanced_edition
    }

    /// Whether the game data contains `name`, e.g. `KIT.IDS`.
    pub fn resource_exists(&self, name: &str) -> bool {
        self.tables.resource_exists(name)
    }
}

impl Context<'static> {
    /// Default profile over the process-wide table cache.
    pub fn global() -> Self {
        Context::new(TableCache::global())
    }
}
