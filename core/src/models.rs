use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for meal records and meal dates entered by the caller.
pub const MEAL_DATE_FORMAT: &str = "%m/%d/%Y";

/// Anything kept in a catalog under a unique, case-insensitive name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Case-insensitive name comparison shared by every catalog lookup.
#[must_use]
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Linear case-insensitive scan over a named collection.
pub fn find_by_name<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| same_name(item.name(), name))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub name: String,
    /// Calories per `serving_size_g` grams.
    pub calories: f64,
    pub fat: f64,
    pub carbs: f64,
    pub protein: f64,
    pub serving_size_g: f64,
}

impl Named for Food {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Food {
    /// Build a validated food from caller input. Calories are derived from the
    /// macros when not given explicitly.
    pub fn from_new(new: &NewFood) -> Result<Self> {
        let name = validate_name(&new.name)?;
        let food = Food {
            name,
            calories: new
                .calories
                .unwrap_or_else(|| derive_calories(new.fat, new.carbs, new.protein)),
            fat: new.fat,
            carbs: new.carbs,
            protein: new.protein,
            serving_size_g: new.serving_size_g,
        };
        validate_food_data(&food)?;
        Ok(food)
    }

    /// Apply an edit. Nothing changes if the edited values fail validation.
    pub fn apply(&mut self, update: &FoodUpdate) -> Result<()> {
        let mut edited = self.clone();
        if let Some(fat) = update.fat {
            edited.fat = fat;
        }
        if let Some(carbs) = update.carbs {
            edited.carbs = carbs;
        }
        if let Some(protein) = update.protein {
            edited.protein = protein;
        }
        if let Some(serving) = update.serving_size_g {
            edited.serving_size_g = serving;
        }
        edited.calories = match update.calories {
            Some(calories) => calories,
            None if update.changes_macros() => {
                derive_calories(edited.fat, edited.carbs, edited.protein)
            }
            None => self.calories,
        };
        validate_food_data(&edited)?;
        *self = edited;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewFood {
    pub name: String,
    pub calories: Option<f64>,
    pub fat: f64,
    pub carbs: f64,
    pub protein: f64,
    pub serving_size_g: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FoodUpdate {
    pub calories: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub protein: Option<f64>,
    pub serving_size_g: Option<f64>,
}

impl FoodUpdate {
    fn changes_macros(&self) -> bool {
        self.fat.is_some() || self.carbs.is_some() || self.protein.is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.changes_macros() && self.calories.is_none() && self.serving_size_g.is_none()
    }
}

/// Atwater estimate: 9 kcal per gram of fat, 4 per gram of carbs or protein.
#[must_use]
pub fn derive_calories(fat: f64, carbs: f64, protein: f64) -> f64 {
    9.0 * fat + 4.0 * (carbs + protein)
}

/// Calories contributed by `weight_g` grams of `food`. An unresolved food
/// contributes nothing.
#[must_use]
pub fn calculate_calories(food: Option<&Food>, weight_g: f64) -> f64 {
    match food {
        Some(food) => weight_g / food.serving_size_g * food.calories,
        None => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Name of the referenced food, resolved against the food catalog.
    pub food: String,
    pub weight_g: f64,
}

impl Ingredient {
    pub fn new(food: &str, weight_g: f64) -> Result<Self> {
        validate_weight(weight_g)?;
        Ok(Self {
            food: food.trim().to_string(),
            weight_g,
        })
    }
}

/// A composite item built from foods. `total_calories` is a cache kept equal
/// to the sum of ingredient contributions by every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    name: String,
    ingredients: Vec<Ingredient>,
    total_calories: f64,
}

impl Named for MenuItem {
    fn name(&self) -> &str {
        &self.name
    }
}

impl MenuItem {
    /// Build a menu item, summing each ingredient's contribution once.
    #[must_use]
    pub fn new(name: &str, ingredients: Vec<Ingredient>, foods: &[Food]) -> Self {
        let mut item = Self {
            name: name.trim().to_string(),
            ingredients,
            total_calories: 0.0,
        };
        item.refresh_total(foods);
        item
    }

    /// Rebuild a menu item from a stored record, trusting the stored total.
    pub(crate) fn from_stored(name: String, ingredients: Vec<Ingredient>, total: f64) -> Self {
        Self {
            name,
            ingredients,
            total_calories: total,
        }
    }

    #[must_use]
    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    #[must_use]
    pub fn total_calories(&self) -> f64 {
        self.total_calories
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    #[must_use]
    pub fn ingredient(&self, food_name: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| same_name(&i.food, food_name))
    }

    #[must_use]
    pub fn uses_food(&self, food_name: &str) -> bool {
        self.ingredient(food_name).is_some()
    }

    pub fn add_ingredient(&mut self, food: &Food, weight_g: f64) -> Result<()> {
        let ingredient = Ingredient::new(&food.name, weight_g)?;
        if self.uses_food(&food.name) {
            bail!("'{}' is already an ingredient of '{}'", food.name, self.name);
        }
        let total = self.total_calories + calculate_calories(Some(food), weight_g);
        ensure_finite_total(&self.name, total)?;
        self.total_calories = total;
        self.ingredients.push(ingredient);
        Ok(())
    }

    /// Remove the ingredient referencing `food_name`. `food` is the current
    /// catalog entry for it, used to subtract its contribution.
    pub fn remove_ingredient(&mut self, food_name: &str, food: Option<&Food>) -> Option<Ingredient> {
        let idx = self
            .ingredients
            .iter()
            .position(|i| same_name(&i.food, food_name))?;
        let removed = self.ingredients.remove(idx);
        self.total_calories -= calculate_calories(food, removed.weight_g);
        Some(removed)
    }

    /// Change an ingredient's weight in place, keeping its position.
    pub fn update_ingredient(
        &mut self,
        food_name: &str,
        food: Option<&Food>,
        weight_g: f64,
    ) -> Result<()> {
        validate_weight(weight_g)?;
        let Some(ingredient) = self
            .ingredients
            .iter_mut()
            .find(|i| same_name(&i.food, food_name))
        else {
            bail!("'{food_name}' is not an ingredient of '{}'", self.name);
        };
        let total = self.total_calories - calculate_calories(food, ingredient.weight_g)
            + calculate_calories(food, weight_g);
        ensure_finite_total(&self.name, total)?;
        ingredient.weight_g = weight_g;
        self.total_calories = total;
        Ok(())
    }

    /// Fresh sum over the current ingredients.
    #[must_use]
    pub fn recompute_total(&self, foods: &[Food]) -> f64 {
        self.ingredients
            .iter()
            .map(|i| calculate_calories(find_by_name(foods, &i.food), i.weight_g))
            .sum()
    }

    pub fn refresh_total(&mut self, foods: &[Food]) {
        self.total_calories = self.recompute_total(foods);
    }
}

/// Totals are written to disk and must read back as numbers.
pub fn ensure_finite_total(name: &str, total: f64) -> Result<()> {
    if !total.is_finite() {
        bail!("Calorie total of '{name}' is too large to store");
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Brunch,
    Lunch,
    Dinner,
    Dessert,
    Snack,
}

impl MealType {
    /// All meal types in their fixed order, which is also the save order
    /// for meals sharing a date.
    pub const ALL: [MealType; 6] = [
        MealType::Breakfast,
        MealType::Brunch,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Dessert,
        MealType::Snack,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Brunch => "Brunch",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Dessert => "Dessert",
            MealType::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        MealType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .with_context(|| {
                let names: Vec<&str> = MealType::ALL.iter().map(|t| t.as_str()).collect();
                format!("Invalid meal type '{s}'. Must be one of: {}", names.join(", "))
            })
    }
}

/// A logged meal. `total_calories` is a snapshot taken when the meal was
/// logged and is never recomputed from its menu items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meal {
    pub date: NaiveDate,
    pub meal_type: MealType,
    /// Names of the referenced menu items, in logged order.
    pub items: Vec<String>,
    pub total_calories: f64,
}

impl Meal {
    #[must_use]
    pub fn new(date: NaiveDate, meal_type: MealType, items: &[&MenuItem]) -> Self {
        Self {
            date,
            meal_type,
            items: items.iter().map(|i| i.name.clone()).collect(),
            total_calories: items.iter().map(|i| i.total_calories).sum(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub items: Vec<String>,
}

pub fn parse_meal_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), MEAL_DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}'. Use MM/DD/YYYY", s.trim()))
}

/// Names are record keys in a comma-separated file with no escaping, so they
/// may not contain commas or line breaks. Returns the trimmed name.
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Name must not be empty");
    }
    if name.contains(',') {
        bail!("Name '{name}' must not contain commas");
    }
    if name.contains(['\n', '\r']) {
        bail!("Name must not contain line breaks");
    }
    Ok(name.to_string())
}

pub fn validate_weight(weight_g: f64) -> Result<()> {
    if !weight_g.is_finite() || weight_g <= 0.0 {
        bail!("Ingredient weight must be greater than 0 (got {weight_g})");
    }
    Ok(())
}

/// Macros must be non-negative and the serving size positive.
pub fn validate_food_data(food: &Food) -> Result<()> {
    let checks = [
        ("calories", food.calories),
        ("fat", food.fat),
        ("carbs", food.carbs),
        ("protein", food.protein),
    ];
    for (field, value) in checks {
        if !value.is_finite() || value < 0.0 {
            bail!("{field} must not be negative (got {value})");
        }
    }
    if !food.serving_size_g.is_finite() || food.serving_size_g <= 0.0 {
        bail!(
            "Serving size must be greater than 0 (got {})",
            food.serving_size_g
        );
    }
    Ok(())
}
