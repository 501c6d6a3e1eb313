//! Checks applied inline while decoding records: cross-references against
//! already-loaded catalogs plus the domain rules the in-memory model relies on.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::CodecError;
use crate::models::{
    Food, Ingredient, MEAL_DATE_FORMAT, MealType, MenuItem, find_by_name, validate_food_data,
    validate_weight,
};

pub(crate) fn resolve_food<'a>(
    foods: &'a [Food],
    name: &str,
    line: u64,
) -> Result<&'a Food, CodecError> {
    find_by_name(foods, name).ok_or_else(|| CodecError::UnknownFood {
        line,
        name: name.to_string(),
    })
}

pub(crate) fn resolve_menu_item<'a>(
    items: &'a [MenuItem],
    name: &str,
    line: u64,
) -> Result<&'a MenuItem, CodecError> {
    find_by_name(items, name).ok_or_else(|| CodecError::UnknownMenuItem {
        line,
        name: name.to_string(),
    })
}

pub(crate) fn meal_type(value: &str, line: u64) -> Result<MealType, CodecError> {
    value
        .parse::<MealType>()
        .map_err(|_| CodecError::InvalidMealType {
            line,
            value: value.to_string(),
        })
}

pub(crate) fn meal_date(value: &str, line: u64) -> Result<NaiveDate, CodecError> {
    NaiveDate::parse_from_str(value, MEAL_DATE_FORMAT).map_err(|_| CodecError::InvalidDate {
        line,
        value: value.to_string(),
    })
}

pub(crate) fn require_ingredients(
    name: &str,
    ingredients: &[Ingredient],
    line: u64,
) -> Result<(), CodecError> {
    if ingredients.is_empty() {
        return Err(CodecError::EmptyMenuItem {
            line,
            name: name.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn food_values(food: &Food, line: u64) -> Result<(), CodecError> {
    validate_food_data(food).map_err(|e| CodecError::malformed(line, e.to_string()))
}

pub(crate) fn ingredient_weight(weight_g: f64, line: u64) -> Result<(), CodecError> {
    validate_weight(weight_g).map_err(|e| CodecError::malformed(line, e.to_string()))
}

/// Tracks names already seen in one file or record.
#[derive(Debug, Default)]
pub(crate) struct UniqueNames {
    seen: HashSet<String>,
}

impl UniqueNames {
    pub(crate) fn check(&mut self, name: &str, line: u64) -> Result<(), CodecError> {
        if self.seen.insert(name.trim().to_lowercase()) {
            Ok(())
        } else {
            Err(CodecError::DuplicateName {
                line,
                name: name.to_string(),
            })
        }
    }
}
