//! Loading and saving the whole catalog set.
//!
//! Catalogs load in dependency order (foods, menu items, meals) so every
//! record can be resolved against the catalogs before it. A file that fails
//! to decode is quarantined and its catalog starts empty; the catalogs after
//! it then resolve against that empty catalog.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::codec;
use crate::error::{CodecError, StoreError};
use crate::recovery::{self, CatalogKind, RecoveryNotice};
use crate::store::{Catalog, CatalogStore};

pub const FOOD_FILE: &str = "FoodItems.csv";
pub const MENU_FILE: &str = "MenuItems.csv";
pub const MEAL_FILE: &str = "MealItems.csv";

/// Locations of the three catalog files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFiles {
    pub food: PathBuf,
    pub menu: PathBuf,
    pub meal: PathBuf,
}

impl CatalogFiles {
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            food: dir.join(FOOD_FILE),
            menu: dir.join(MENU_FILE),
            meal: dir.join(MEAL_FILE),
        }
    }
}

#[derive(Debug)]
pub struct LoadReport {
    pub store: CatalogStore,
    /// One entry per catalog that was reset because its file was corrupted.
    pub notices: Vec<RecoveryNotice>,
}

/// Load every catalog. Only I/O failures other than a missing file are
/// errors; corrupted files are quarantined and reported in the notices.
pub fn load_all(files: &CatalogFiles) -> Result<LoadReport, StoreError> {
    let mut notices = Vec::new();

    let foods = load_catalog(CatalogKind::Food, &files.food, &mut notices, |text| {
        codec::decode_foods(text)
    })?;
    let menu_items = load_catalog(CatalogKind::MenuItem, &files.menu, &mut notices, |text| {
        codec::decode_menu_items(text, &foods)
    })?;
    let meals = load_catalog(CatalogKind::Meal, &files.meal, &mut notices, |text| {
        codec::decode_meals(text, &menu_items)
    })?;

    info!(
        foods = foods.len(),
        menu_items = menu_items.len(),
        meals = meals.len(),
        corrupted = notices.len(),
        "loaded catalogs"
    );

    Ok(LoadReport {
        store: CatalogStore::new(
            Catalog::from(foods),
            Catalog::from(menu_items),
            Catalog::from(meals),
        ),
        notices,
    })
}

fn load_catalog<T>(
    kind: CatalogKind,
    path: &Path,
    notices: &mut Vec<RecoveryNotice>,
    decode: impl FnOnce(&str) -> Result<Vec<T>, CodecError>,
) -> Result<Vec<T>, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(catalog = %kind, path = %path.display(), "no catalog file yet");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let decoded = match std::str::from_utf8(&bytes) {
        Ok(text) => decode(text),
        Err(e) => Err(CodecError::malformed(
            text_line_of(&bytes, e.valid_up_to()),
            "file is not valid UTF-8",
        )),
    };

    match decoded {
        Ok(entities) => Ok(entities),
        Err(reason) => {
            notices.push(recovery::recover(kind, path, reason));
            Ok(Vec::new())
        }
    }
}

/// 1-based line number of the byte at `offset`.
fn text_line_of(bytes: &[u8], offset: usize) -> u64 {
    let before = &bytes[..offset];
    // A `\r\n` pair counts once.
    let breaks = before
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'\n' || (b == b'\r' && before.get(i + 1) != Some(&b'\n')))
        .count();
    breaks as u64 + 1
}

/// Sort every catalog and write all three files, replacing their contents.
pub fn save_all(store: &mut CatalogStore, files: &CatalogFiles) -> Result<(), StoreError> {
    store.sort_for_persistence();
    write_catalog(&files.food, &codec::encode_foods(store.foods().as_slice()))?;
    write_catalog(
        &files.menu,
        &codec::encode_menu_items(store.menu_items().as_slice()),
    )?;
    write_catalog(&files.meal, &codec::encode_meals(store.meals().as_slice()))?;
    info!(
        foods = store.foods().len(),
        menu_items = store.menu_items().len(),
        meals = store.meals().len(),
        "saved catalogs"
    );
    Ok(())
}

/// Write through a sibling temporary file so a failed write never leaves a
/// truncated catalog behind.
fn write_catalog(path: &Path, contents: &str) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = std::fs::write(&tmp, contents).and_then(|()| std::fs::rename(&tmp, path));
    if let Err(source) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(StoreError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    debug!(path = %path.display(), bytes = contents.len(), "wrote catalog file");
    Ok(())
}
