use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::{
    Food, FoodUpdate, Ingredient, Meal, MenuItem, Named, NewFood, NewMeal, ensure_finite_total,
    same_name, validate_name, validate_weight,
};

/// Ordered in-memory collection of one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog<T> {
    items: Vec<T>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> From<Vec<T>> for Catalog<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> Catalog<T> {
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Stable sort, so equal keys keep their insertion order.
    pub fn sort_by_key<K: Ord>(&mut self, key: impl FnMut(&T) -> K) {
        self.items.sort_by_key(key);
    }
}

impl<T: Named> Catalog<T> {
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&T> {
        self.items.iter().find(|item| same_name(item.name(), name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| same_name(item.name(), name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        let idx = self
            .items
            .iter()
            .position(|item| same_name(item.name(), name))?;
        Some(self.items.remove(idx))
    }

    /// Case-insensitive ascending by name.
    pub fn sort_by_name(&mut self) {
        self.items.sort_by_cached_key(|item| item.name().to_lowercase());
    }
}

impl<'a, T> IntoIterator for &'a Catalog<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

pub type FoodCatalog = Catalog<Food>;
pub type MenuItemCatalog = Catalog<MenuItem>;
pub type MealCatalog = Catalog<Meal>;

/// Result of [`CatalogStore::set_ingredient`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum IngredientChange {
    Added,
    Updated { previous_g: f64 },
}

/// Result of [`CatalogStore::remove_ingredient`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngredientRemoval {
    Removed { menu_item: MenuItem },
    /// The last ingredient went, so the menu item was deleted with it.
    MenuItemDeleted { name: String },
}

/// Owns the three catalogs for the lifetime of a session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CatalogStore {
    foods: FoodCatalog,
    menu_items: MenuItemCatalog,
    meals: MealCatalog,
}

impl CatalogStore {
    #[must_use]
    pub fn new(foods: FoodCatalog, menu_items: MenuItemCatalog, meals: MealCatalog) -> Self {
        Self {
            foods,
            menu_items,
            meals,
        }
    }

    #[must_use]
    pub fn foods(&self) -> &FoodCatalog {
        &self.foods
    }

    #[must_use]
    pub fn menu_items(&self) -> &MenuItemCatalog {
        &self.menu_items
    }

    #[must_use]
    pub fn meals(&self) -> &MealCatalog {
        &self.meals
    }

    #[must_use]
    pub fn find_food(&self, name: &str) -> Option<&Food> {
        self.foods.find(name)
    }

    #[must_use]
    pub fn find_menu_item(&self, name: &str) -> Option<&MenuItem> {
        self.menu_items.find(name)
    }

    pub fn meals_on(&self, date: NaiveDate) -> impl Iterator<Item = &Meal> {
        self.meals.iter().filter(move |m| m.date == date)
    }

    // --- Foods ---

    pub fn add_food(&mut self, new: &NewFood) -> Result<Food> {
        let food = Food::from_new(new)?;
        if self.foods.contains(&food.name) {
            bail!("Food '{}' already exists", food.name);
        }
        self.foods.push(food.clone());
        Ok(food)
    }

    /// Edit a food's nutrition. Menu items using it get their totals
    /// recomputed; logged meals keep their snapshot.
    pub fn edit_food(&mut self, name: &str, update: &FoodUpdate) -> Result<Food> {
        if update.is_empty() {
            bail!("Nothing to update for '{name}'");
        }
        let Some(food) = self.foods.find_mut(name) else {
            bail!("Food '{name}' not found");
        };
        let previous = food.clone();
        food.apply(update)?;
        let food = food.clone();
        for item in &self.menu_items {
            if !item.uses_food(&food.name) {
                continue;
            }
            let total = item.recompute_total(self.foods.as_slice());
            if let Err(e) = ensure_finite_total(item.name(), total) {
                if let Some(slot) = self.foods.find_mut(&food.name) {
                    *slot = previous;
                }
                return Err(e);
            }
        }
        self.refresh_menu_items_using(&food.name);
        Ok(food)
    }

    /// Delete a food. Returns the names of menu items that still reference
    /// it; their totals no longer count it.
    pub fn delete_food(&mut self, name: &str) -> Result<Vec<String>> {
        let Some(food) = self.foods.remove(name) else {
            bail!("Food '{name}' not found");
        };
        let referrers = self.refresh_menu_items_using(&food.name);
        if !referrers.is_empty() {
            warn!(
                food = %food.name,
                menu_items = ?referrers,
                "deleted food is still referenced by menu items"
            );
        }
        Ok(referrers)
    }

    fn refresh_menu_items_using(&mut self, food_name: &str) -> Vec<String> {
        let mut touched = Vec::new();
        for item in &mut self.menu_items.items {
            if item.uses_food(food_name) {
                item.refresh_total(self.foods.as_slice());
                touched.push(item.name().to_string());
            }
        }
        touched
    }

    // --- Menu items ---

    pub fn create_menu_item(&mut self, name: &str, ingredients: &[Ingredient]) -> Result<MenuItem> {
        let name = validate_name(name)?;
        if self.menu_items.contains(&name) {
            bail!("Menu item '{name}' already exists");
        }
        if ingredients.is_empty() {
            bail!("Menu item '{name}' needs at least one ingredient");
        }

        let mut item = MenuItem::new(&name, Vec::new(), &[]);
        for ingredient in ingredients {
            validate_weight(ingredient.weight_g)?;
            let Some(food) = self.foods.find(&ingredient.food) else {
                bail!("Food '{}' not found", ingredient.food);
            };
            item.add_ingredient(food, ingredient.weight_g)?;
        }
        self.menu_items.push(item.clone());
        Ok(item)
    }

    /// Add `food` to a menu item, or change its weight if already present.
    pub fn set_ingredient(
        &mut self,
        item_name: &str,
        food_name: &str,
        weight_g: f64,
    ) -> Result<IngredientChange> {
        let Some(food) = self.foods.find(food_name) else {
            bail!("Food '{food_name}' not found");
        };
        let Some(item) = self.menu_items.find_mut(item_name) else {
            bail!("Menu item '{item_name}' not found");
        };
        match item.ingredient(&food.name).map(|i| i.weight_g) {
            Some(previous_g) => {
                item.update_ingredient(&food.name, Some(food), weight_g)?;
                Ok(IngredientChange::Updated { previous_g })
            }
            None => {
                item.add_ingredient(food, weight_g)?;
                Ok(IngredientChange::Added)
            }
        }
    }

    /// Remove an ingredient. A menu item left without ingredients is deleted,
    /// since it could not be saved.
    pub fn remove_ingredient(
        &mut self,
        item_name: &str,
        food_name: &str,
    ) -> Result<IngredientRemoval> {
        let food = self.foods.find(food_name);
        let Some(item) = self.menu_items.find_mut(item_name) else {
            bail!("Menu item '{item_name}' not found");
        };
        if item.remove_ingredient(food_name, food).is_none() {
            bail!("'{food_name}' is not an ingredient of '{}'", item.name());
        }
        if !item.is_empty() {
            return Ok(IngredientRemoval::Removed {
                menu_item: item.clone(),
            });
        }

        let name = item.name().to_string();
        self.menu_items.remove(&name);
        info!(menu_item = %name, "deleted menu item left without ingredients");
        Ok(IngredientRemoval::MenuItemDeleted { name })
    }

    /// Delete a menu item. Returns how many logged meals still reference it.
    pub fn delete_menu_item(&mut self, name: &str) -> Result<usize> {
        let Some(item) = self.menu_items.remove(name) else {
            bail!("Menu item '{name}' not found");
        };
        let referencing = self
            .meals
            .iter()
            .filter(|m| m.items.iter().any(|i| same_name(i, item.name())))
            .count();
        if referencing > 0 {
            warn!(
                menu_item = item.name(),
                meals = referencing,
                "deleted menu item is still referenced by meals"
            );
        }
        Ok(referencing)
    }

    // --- Meals ---

    pub fn log_meal(&mut self, new: &NewMeal) -> Result<Meal> {
        if new.items.is_empty() {
            bail!("A meal needs at least one menu item");
        }
        let mut items = Vec::with_capacity(new.items.len());
        for name in &new.items {
            let Some(item) = self.menu_items.find(name) else {
                bail!("Menu item '{name}' not found");
            };
            items.push(item);
        }
        let meal = Meal::new(new.date, new.meal_type, &items);
        ensure_finite_total(&format!("{} meal", meal.meal_type), meal.total_calories)?;
        self.meals.push(meal.clone());
        Ok(meal)
    }

    /// Order applied before every save: foods and menu items by name, meals
    /// by date and then meal type.
    pub fn sort_for_persistence(&mut self) {
        self.foods.sort_by_name();
        self.menu_items.sort_by_name();
        self.meals.sort_by_key(|m| (m.date, m.meal_type));
    }
}
