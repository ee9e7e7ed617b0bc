//! Symbolic lookup tables and the reference lists derived from them.
//!
//! Tables are loaded from a [`TableSource`] on first use and cached in a [`TableCache`]. Each
//! table is built at most once per cache generation, even when several threads ask for it at the
//! same time. A missing table is cached as missing so the source is not probed again.

use crate::parsers::ids;
use lazy_static::lazy_static;
use linked_hash_map::LinkedHashMap;
use log::{debug, info};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    iter::FromIterator,
    sync::{Arc, PoisonError, RwLock},
};

/// An ordered `value -> symbol` map. When a value is defined twice the first definition wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdsTable {
    entries: LinkedHashMap<i64, String>,
}

impl IdsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        ids::entries(text).into_iter().collect()
    }

    pub fn insert<S: Into<String>>(&mut self, id: i64, symbol: S) {
        if !self.entries.contains_key(&id) {
            self.entries.insert(id, symbol.into());
        }
    }

    pub fn contains_key(&self, id: i64) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: i64) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// The symbol for `id`, or `default` when the table has no such entry.
    pub fn get_or_default<'a>(&'a self, id: i64, default: &'a str) -> &'a str {
        self.get(id).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn sorted_keys(&self) -> Vec<i64> {
        let mut keys: Vec<i64> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl<S: Into<String>> FromIterator<(i64, S)> for IdsTable {
    fn from_iter<I: IntoIterator<Item = (i64, S)>>(iter: I) -> Self {
        let mut table = IdsTable::new();
        for (id, symbol) in iter {
            table.insert(id, symbol);
        }
        table
    }
}

/// Where table text and resource existence come from. Names are passed upper-cased with their
/// extension, e.g. `MISSILE.IDS` or `FIREBALL.PRO`.
pub trait TableSource: Send + Sync {
    fn load(&self, name: &str) -> Option<IdsTable>;
    fn contains(&self, name: &str) -> bool;
}

/// A [`TableSource`] backed by strings held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, String>,
    resources: HashSet<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table in IDS text form. The table also counts as an existing resource.
    pub fn with_table<N: AsRef<str>, T: Into<String>>(mut self, name: N, text: T) -> Self {
        let name = name.as_ref().to_uppercase();
        self.resources.insert(name.clone());
        self.tables.insert(name, text.into());
        self
    }

    pub fn with_resource<N: AsRef<str>>(mut self, name: N) -> Self {
        self.resources.insert(name.as_ref().to_uppercase());
        self
    }
}

impl TableSource for MemorySource {
    fn load(&self, name: &str) -> Option<IdsTable> {
        self.tables
            .get(&name.to_uppercase())
            .map(|text| IdsTable::parse(text))
    }

    fn contains(&self, name: &str) -> bool {
        self.resources.contains(&name.to_uppercase())
    }
}

/// One entry of a derived reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub id: i64,
    pub primary: String,
    pub secondary: Option<String>,
}

impl RefEntry {
    fn new<P: Into<String>>(id: i64, primary: P, secondary: Option<String>) -> Self {
        RefEntry {
            id,
            primary: primary.into(),
            secondary,
        }
    }
}

impl fmt::Display for RefEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.secondary {
            Some(secondary) => write!(f, "{} ({}) - {}", self.primary, secondary, self.id),
            None => write!(f, "{} - {}", self.primary, self.id),
        }
    }
}

/// The derived lists projectile reference fields are labelled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefList {
    /// Keyed by MISSILE.IDS. Missile value `k` names projectile file `PROJECTL[k - 1]`.
    Missile,
    /// Keyed by PROJECTL.IDS.
    Projectile,
}

impl RefList {
    fn build(self, missiles: &IdsTable, projectiles: &IdsTable) -> Vec<RefEntry> {
        match self {
            RefList::Missile => missile_refs(missiles, projectiles),
            RefList::Projectile => projectile_refs(projectiles),
        }
    }
}

fn projectile_file(symbol: &str) -> String {
    format!("{}.PRO", symbol.to_uppercase())
}

/// Builds the missile reference list.
pub fn missile_refs(missiles: &IdsTable, projectiles: &IdsTable) -> Vec<RefEntry> {
    let mut list = Vec::with_capacity(missiles.len() + 2);
    if !missiles.contains_key(0) {
        list.push(RefEntry::new(0, "None", Some("Default".to_owned())));
    }
    if !missiles.contains_key(1) {
        list.push(RefEntry::new(1, "None", Some("None".to_owned())));
    }
    for key in missiles.sorted_keys() {
        let primary = projectiles
            .get(key - 1)
            .map(projectile_file)
            .unwrap_or_else(|| "None".to_owned());
        let label = missiles.get(key).map(str::to_owned);
        list.push(RefEntry::new(key, primary, label));
    }
    list
}

/// Builds the projectile reference list.
pub fn projectile_refs(projectiles: &IdsTable) -> Vec<RefEntry> {
    let mut list = Vec::with_capacity(projectiles.len() + 1);
    if !projectiles.contains_key(0) {
        list.push(RefEntry::new(0, "None", None));
    }
    for key in projectiles.sorted_keys() {
        if let Some(symbol) = projectiles.get(key) {
            list.push(RefEntry::new(key, projectile_file(symbol), None));
        }
    }
    list
}

struct Registry {
    source: Option<Arc<dyn TableSource>>,
    tables: HashMap<String, Option<Arc<IdsTable>>>,
    ref_lists: HashMap<RefList, Arc<Vec<RefEntry>>>,
    generation: u64,
}

impl Registry {
    fn reset(&mut self) {
        self.tables.clear();
        self.ref_lists.clear();
        self.generation += 1;
    }

    fn table(&mut self, name: &str) -> Option<Arc<IdsTable>> {
        if let Some(cached) = self.tables.get(name) {
            return cached.clone();
        }
        let built = self
            .source
            .as_ref()
            .and_then(|source| source.load(name))
            .map(Arc::new);
        debug!(
            "built table {} ({} entries)",
            name,
            built.as_ref().map_or(0, |t| t.len())
        );
        self.tables.insert(name.to_owned(), built.clone());
        built
    }
}

/// A thread-safe cache of [`IdsTable`]s and derived reference lists.
pub struct TableCache {
    inner: RwLock<Registry>,
}

impl Default for TableCache {
    fn default() -> Self {
        TableCache::new()
    }
}

impl fmt::Debug for TableCache {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let registry = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("TableCache")
            .field("has_source", &registry.source.is_some())
            .field("tables", &registry.tables.len())
            .field("generation", &registry.generation)
            .finish()
    }
}

lazy_static! {
    static ref GLOBAL: TableCache = TableCache::new();
}

impl TableCache {
    /// A cache without a source. Every lookup misses.
    pub fn new() -> Self {
        TableCache {
            inner: RwLock::new(Registry {
                source: None,
                tables: HashMap::new(),
                ref_lists: HashMap::new(),
                generation: 0,
            }),
        }
    }

    pub fn with_source<S: TableSource + 'static>(source: S) -> Self {
        let cache = TableCache::new();
        cache.set_source(source);
        cache
    }

    /// The process-wide cache.
    pub fn global() -> &'static TableCache {
        &GLOBAL
    }

    /// Replaces the source and drops everything built from the previous one.
    pub fn set_source<S: TableSource + 'static>(&self, source: S) {
        let mut registry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        registry.source = Some(Arc::new(source));
        registry.reset();
        info!("table source replaced (generation {})", registry.generation);
    }

    /// Drops every cached table and list. The next lookup rebuilds from the source.
    pub fn clear(&self) {
        let mut registry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        registry.reset();
        info!("table cache cleared (generation {})", registry.generation);
    }

    pub fn generation(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    pub fn resource_exists(&self, name: &str) -> bool {
        let registry = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        registry
            .source
            .as_ref()
            .map_or(false, |source| source.contains(name))
    }

    /// The table called `name` (e.g. `MISSILE.IDS`), built on first use.
    pub fn get(&self, name: &str) -> Option<Arc<IdsTable>> {
        let name = name.to_uppercase();
        {
            let registry = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = registry.tables.get(&name) {
                return cached.clone();
            }
        }
        let mut registry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        registry.table(&name)
    }

    pub fn ref_list(&self, list: RefList) -> Arc<Vec<RefEntry>> {
        {
            let registry = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = registry.ref_lists.get(&list) {
                return cached.clone();
            }
        }
        let mut registry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = registry.ref_lists.get(&list) {
            return cached.clone();
        }
        let missiles = registry.table("MISSILE.IDS").unwrap_or_default();
        let projectiles = registry.table("PROJECTL.IDS").unwrap_or_default();
        let built = Arc::new(list.build(&missiles, &projectiles));
        debug!("built {:?} reference list ({} entries)", list, built.len());
        registry.ref_lists.insert(list, built.clone());
        built
    }

    pub fn lookup_ref(&self, list: RefList, id: i64) -> Option<RefEntry> {
        self.ref_list(list).iter().find(|e| e.id == id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    fn table(pairs: &[(i64, &str)]) -> IdsTable {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn first_definition_wins() {
        let t = IdsTable::parse("1 ONE\n1 UNO\n2 TWO");
        assert_eq!(t.get(1), Some("ONE"));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get_or_default(9, "?"), "?");
    }

    #[test]
    fn missile_list_gets_both_sentinels() {
        let missiles = table(&[(2, "Arrow"), (3, "Bolt")]);
        let projectiles = table(&[(1, "arrow"), (2, "bolt")]);
        let list = missile_refs(&missiles, &projectiles);

        assert_eq!(list[0], RefEntry::new(0, "None", Some("Default".into())));
        assert_eq!(list[1], RefEntry::new(1, "None", Some("None".into())));
        assert_eq!(list[2], RefEntry::new(2, "ARROW.PRO", Some("Arrow".into())));
        assert_eq!(list[3], RefEntry::new(3, "BOLT.PRO", Some("Bolt".into())));
        assert_eq!(list[2].to_string(), "ARROW.PRO (Arrow) - 2");
    }

    #[test]
    fn missile_list_keeps_defined_sentinels() {
        let missiles = table(&[(0, "Default"), (1, "None"), (5, "Fireball")]);
        let projectiles = table(&[(0, "none")]);
        let list = missile_refs(&missiles, &projectiles);

        assert_eq!(list.len(), 3);
        assert_eq!(list[0], RefEntry::new(0, "None", Some("Default".into())));
        assert_eq!(list[1], RefEntry::new(1, "NONE.PRO", Some("None".into())));
        assert_eq!(list[2], RefEntry::new(5, "None", Some("Fireball".into())));
    }

    #[test]
    fn projectile_list_adds_zero() {
        let list = projectile_refs(&table(&[(3, "fireball"), (1, "arrow")]));
        let ids: Vec<i64> = list.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 3]);
        assert_eq!(list[2].to_string(), "FIREBALL.PRO - 3");
    }

    struct CountingSource {
        loads: Arc<AtomicUsize>,
    }

    impl TableSource for CountingSource {
        fn load(&self, name: &str) -> Option<IdsTable> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if name == "MISSILE.IDS" {
                Some(table(&[(2, "Arrow")]))
            } else {
                None
            }
        }

        fn contains(&self, name: &str) -> bool {
            name == "MISSILE.IDS"
        }
    }

    #[test]
    fn concurrent_lookups_build_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(TableCache::with_source(CountingSource {
            loads: loads.clone(),
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || {
                    assert!(cache.get("missile.ids").is_some());
                    assert!(cache.get("PROJECTL.IDS").is_none());
                    cache.ref_list(RefList::Missile).len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clear_invalidates() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = TableCache::with_source(CountingSource {
            loads: loads.clone(),
        });
        let generation = cache.generation();

        cache.get("MISSILE.IDS");
        cache.clear();
        assert!(cache.generation() > generation);
        cache.get("MISSILE.IDS");
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert!(cache.resource_exists("MISSILE.IDS"));
    }
}
