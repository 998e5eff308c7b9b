//! Persisted, ordered palette collections.
//!
//! A `PaletteStore` is identified by its name, which also keys its record in
//! the settings backend (`"PaletteStore:" + name`). The palette list is never
//! empty: any change that would empty it is ignored. The cursor is stored in
//! range and re-normalized on read, so it stays valid as the list shrinks.

use crate::observe::{Subject, SubscriptionId};
use crate::palette::Palette;
use crate::settings::SettingsStore;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// What changed in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteStoreChange {
    Palettes,
    Cursor,
}

pub struct PaletteStore {
    name: String,
    settings: Rc<dyn SettingsStore>,
    palettes: Vec<Palette>,
    cursor: usize,
    changes: Subject<PaletteStoreChange>,
}

impl PaletteStore {
    /// Open the store `name`, seeding it with the built-in palettes if the
    /// backend has nothing (or nothing readable) under its key.
    pub fn named(name: impl Into<String>, settings: Rc<dyn SettingsStore>) -> Self {
        let name = name.into();
        let palettes = load_palettes(settings.as_ref(), &settings_key(&name));
        let mut store = Self {
            name,
            settings,
            palettes,
            cursor: 0,
            changes: Subject::new(),
        };
        if store.palettes.is_empty() {
            let mut seed = Palette::builtins();
            if seed.is_empty() {
                seed = vec![Palette::warning()];
            }
            log::debug!("seeding palette store {:?} with {} palettes", store.name, seed.len());
            store.set_palettes(seed);
        }
        store
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings_key(&self) -> String {
        settings_key(&self.name)
    }

    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    /// Always `false` once constructed; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.palettes.iter().position(|p| p.id == id)
    }

    // ─── Cursor ──────────────────────────────────────────────────────────

    pub fn cursor_index(&self) -> usize {
        self.cursor % self.palettes.len()
    }

    /// Accepts any integer; negative values wrap from the end.
    pub fn set_cursor_index(&mut self, index: isize) {
        self.cursor = self.bounds_checked(index);
        self.changes.emit(&PaletteStoreChange::Cursor);
    }

    pub fn advance_cursor(&mut self, delta: isize) {
        let current = self.cursor_index() as isize;
        self.set_cursor_index(current.wrapping_add(delta));
    }

    /// The palette under the cursor.
    pub fn current(&self) -> &Palette {
        &self.palettes[self.cursor_index()]
    }

    fn bounds_checked(&self, index: isize) -> usize {
        index.rem_euclid(self.palettes.len() as isize) as usize
    }

    // ─── Palette list ────────────────────────────────────────────────────

    /// Replace the whole list. Empty lists are rejected; returns whether the
    /// change was applied.
    pub fn set_palettes(&mut self, palettes: Vec<Palette>) -> bool {
        if palettes.is_empty() {
            log::warn!("ignoring attempt to empty palette store {:?}", self.name);
            return false;
        }
        self.palettes = palettes;
        self.persist();
        self.changes.emit(&PaletteStoreChange::Palettes);
        true
    }

    /// Insert `palette` at `at` (default: the cursor). A palette with the same
    /// id already in the store is moved there and replaced, never duplicated.
    pub fn insert(&mut self, palette: Palette, at: Option<isize>) {
        let target = self.bounds_checked(at.unwrap_or(self.cursor_index() as isize));
        let mut next = self.palettes.clone();
        if let Some(existing) = next.iter().position(|p| p.id == palette.id) {
            next.remove(existing);
        }
        let target = target.min(next.len());
        next.insert(target, palette);
        self.set_palettes(next);
    }

    pub fn insert_named(&mut self, name: &str, emojis: &str, at: Option<isize>) {
        self.insert(Palette::new(name, emojis), at);
    }

    /// Put `palette` at the end, replacing any palette with the same id.
    pub fn append(&mut self, palette: Palette) {
        let mut next = self.palettes.clone();
        match next.iter().position(|p| p.id == palette.id) {
            Some(_) if next.len() == 1 => next = vec![palette],
            Some(existing) => {
                next.remove(existing);
                next.push(palette);
            }
            None => next.push(palette),
        }
        self.set_palettes(next);
    }

    pub fn append_named(&mut self, name: &str, emojis: &str) {
        self.append(Palette::new(name, emojis));
    }

    /// Remove the palette at `index` (wrapped). Refused for the last palette.
    pub fn remove(&mut self, index: isize) -> Option<Palette> {
        if self.palettes.len() <= 1 {
            log::warn!("refusing to remove the last palette of {:?}", self.name);
            return None;
        }
        let index = self.bounds_checked(index);
        let mut next = self.palettes.clone();
        let removed = next.remove(index);
        self.set_palettes(next);
        Some(removed)
    }

    /// Edit the palette under the cursor in place. Its id is preserved.
    pub fn edit_current(&mut self, edit: impl FnOnce(&mut Palette)) {
        let index = self.cursor_index();
        let mut next = self.palettes.clone();
        let id = next[index].id.clone();
        edit(&mut next[index]);
        next[index].id = id;
        self.set_palettes(next);
    }

    // ─── Observation ─────────────────────────────────────────────────────

    pub fn subscribe(&mut self, observer: impl FnMut(&PaletteStoreChange) + 'static) -> SubscriptionId {
        self.changes.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.changes.unsubscribe(id)
    }

    fn persist(&self) {
        let key = self.settings_key();
        match serde_json::to_vec(&self.palettes) {
            Ok(bytes) => {
                if let Err(err) = self.settings.set(&key, bytes) {
                    log::error!("failed to persist {key}: {err}");
                }
            }
            Err(err) => log::error!("failed to encode {key}: {err}"),
        }
    }
}

fn settings_key(name: &str) -> String {
    format!("PaletteStore:{name}")
}

fn load_palettes(settings: &dyn SettingsStore, key: &str) -> Vec<Palette> {
    let Some(bytes) = settings.get(key) else {
        return Vec::new();
    };
    match serde_json::from_slice(&bytes) {
        Ok(palettes) => palettes,
        Err(err) => {
            log::warn!("discarding unreadable palettes under {key}: {err}");
            Vec::new()
        }
    }
}

impl PartialEq for PaletteStore {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PaletteStore {}

/// Hashes by name only, matching `PartialEq`.
impl Hash for PaletteStore {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for PaletteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaletteStore")
            .field("name", &self.name)
            .field("palettes", &self.palettes.len())
            .field("cursor", &self.cursor_index())
            .finish()
    }
}
