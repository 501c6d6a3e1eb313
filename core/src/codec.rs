//! Encoding and decoding of the three catalog files.
//!
//! Every file starts with a fixed header line followed by records. A record
//! starts on a line whose first field is non-blank; lines with a blank first
//! field continue the current record. Composite records end with a trailer
//! line carrying the stored calorie total:
//!
//! ```text
//! Name,Calories,Fat,Carbs,Protein,Serving Size (g)
//! oats,389.0,6.9,66.3,16.9,100.0
//!
//! Name,Ingredients,Servings (g)
//! bowl of oats
//! ,oats,50.0
//! ,,194.5
//!
//! Date,Meal,Items,Total Calories
//! 01/02/2024
//! ,Breakfast
//! ,,bowl of oats
//! ,,,194.5
//! ```
//!
//! An empty line ends the data section. Lines may end in `\n`, `\r\n` or a
//! lone `\r`. Fields are split on commas with no quoting, so names may not
//! contain commas.
//!
//! Encoding then decoding gives back the same catalog. Decoding then encoding
//! gives back the same text only when the text is canonical: `\n` line
//! endings, numbers in the form `format_number` writes, meal types in title
//! case and zero-padded `MM/DD/YYYY` dates. Decoding also accepts meal types
//! and referenced names in any case, dates without zero padding and padded
//! fields. These are rewritten in canonical form on the next save.

use std::fmt::Write;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::warn;

use crate::error::CodecError;
use crate::integrity::{self, UniqueNames};
use crate::models::{Food, Ingredient, MEAL_DATE_FORMAT, Meal, MealType, MenuItem, Named};

pub const FOOD_HEADER: &str = "Name,Calories,Fat,Carbs,Protein,Serving Size (g)";
pub const MENU_HEADER: &str = "Name,Ingredients,Servings (g)";
pub const MEAL_HEADER: &str = "Date,Meal,Items,Total Calories";

pub fn decode_foods(text: &str) -> Result<Vec<Food>, CodecError> {
    decode(FoodFormat::default(), text)
}

/// Decode menu items, resolving every ingredient against `foods`.
pub fn decode_menu_items(text: &str, foods: &[Food]) -> Result<Vec<MenuItem>, CodecError> {
    decode(
        MenuFormat {
            foods,
            names: UniqueNames::default(),
        },
        text,
    )
}

/// Decode meals, resolving every item against `menu_items`.
pub fn decode_meals(text: &str, menu_items: &[MenuItem]) -> Result<Vec<Meal>, CodecError> {
    decode(MealFormat { menu_items }, text)
}

#[must_use]
pub fn encode_foods(foods: &[Food]) -> String {
    encode::<FoodFormat>(foods)
}

/// Encode menu items. Items without ingredients cannot be decoded again and
/// are left out.
#[must_use]
pub fn encode_menu_items(items: &[MenuItem]) -> String {
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        if item.is_empty() {
            warn!(menu_item = item.name(), "skipping menu item without ingredients");
        } else {
            kept.push(item.clone());
        }
    }
    encode::<MenuFormat<'_>>(&kept)
}

#[must_use]
pub fn encode_meals(meals: &[Meal]) -> String {
    encode::<MealFormat<'_>>(meals)
}

/// Shortest round-trip form of `value`, always with a fractional part
/// (`50.0`, `194.5`).
#[allow(clippy::float_cmp)]
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// One non-empty line of a catalog file, split into trimmed fields.
#[derive(Debug)]
struct Row {
    line: u64,
    fields: StringRecord,
}

impl Row {
    fn parse(line: u64, raw: &str) -> Result<Self, CodecError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_reader(raw.as_bytes());
        let mut fields = StringRecord::new();
        reader
            .read_record(&mut fields)
            .map_err(|e| CodecError::malformed(line, e.to_string()))?;
        // One line must yield exactly one record.
        let mut rest = StringRecord::new();
        if reader.read_record(&mut rest).unwrap_or(true) {
            return Err(CodecError::malformed(line, "line holds more than one record"));
        }
        Ok(Self { line, fields })
    }

    fn field(&self, idx: usize) -> &str {
        self.fields.get(idx).unwrap_or("")
    }

    fn is_blank(&self, idx: usize) -> bool {
        self.field(idx).is_empty()
    }

    fn starts_record(&self) -> bool {
        !self.is_blank(0)
    }

    fn number(&self, idx: usize, what: &str) -> Result<f64, CodecError> {
        let raw = self.field(idx);
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(CodecError::malformed(
                self.line,
                format!("{what} '{raw}' is not a number"),
            )),
        }
    }

    /// Fields from `idx` onwards must be blank for this kind of line.
    fn expect_blank_from(&self, idx: usize) -> Result<(), CodecError> {
        match self.fields.iter().skip(idx).find(|f| !f.is_empty()) {
            Some(extra) => Err(CodecError::malformed(
                self.line,
                format!("unexpected value '{extra}' in column {}", idx + 1),
            )),
            None => Ok(()),
        }
    }
}

/// Outcome of feeding one line to a record format.
enum Progress<D, E> {
    Pending(D),
    Complete(E),
}

/// Per-entity record layout.
trait RecordFormat {
    type Entity;
    /// Partially decoded record while continuation lines are consumed.
    type Draft;

    const HEADER: &'static str;

    /// Handle the line that starts a record.
    fn begin(&mut self, row: &Row) -> Result<Progress<Self::Draft, Self::Entity>, CodecError>;

    /// Handle a continuation line of the current record.
    fn extend(
        &mut self,
        draft: Self::Draft,
        row: &Row,
    ) -> Result<Progress<Self::Draft, Self::Entity>, CodecError>;

    fn write(entity: &Self::Entity, out: &mut String);
}

enum ParserState<D> {
    AwaitingRecordStart,
    ConsumingContinuationLines { start: u64, draft: D },
}

/// Whether the parser wants more lines.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    EndOfCatalog,
}

struct RecordParser<F: RecordFormat> {
    format: F,
    state: ParserState<F::Draft>,
    entities: Vec<F::Entity>,
}

impl<F: RecordFormat> RecordParser<F> {
    fn new(format: F) -> Self {
        Self {
            format,
            state: ParserState::AwaitingRecordStart,
            entities: Vec::new(),
        }
    }

    fn feed(&mut self, line: u64, raw: &str) -> Result<Flow, CodecError> {
        let state = std::mem::replace(&mut self.state, ParserState::AwaitingRecordStart);

        if raw.is_empty() {
            return match state {
                ParserState::AwaitingRecordStart => Ok(Flow::EndOfCatalog),
                ParserState::ConsumingContinuationLines { start, .. } => {
                    Err(CodecError::UnterminatedRecord { line: start })
                }
            };
        }

        let row = Row::parse(line, raw)?;
        let (start, progress) = match state {
            ParserState::AwaitingRecordStart => {
                if !row.starts_record() {
                    return Err(CodecError::OrphanContinuation { line });
                }
                (line, self.format.begin(&row)?)
            }
            ParserState::ConsumingContinuationLines { start, draft } => {
                if row.starts_record() {
                    return Err(CodecError::UnterminatedRecord { line: start });
                }
                (start, self.format.extend(draft, &row)?)
            }
        };

        match progress {
            Progress::Pending(draft) => {
                self.state = ParserState::ConsumingContinuationLines { start, draft };
            }
            Progress::Complete(entity) => self.entities.push(entity),
        }
        Ok(Flow::Continue)
    }

    fn finish(self) -> Result<Vec<F::Entity>, CodecError> {
        match self.state {
            ParserState::AwaitingRecordStart => Ok(self.entities),
            ParserState::ConsumingContinuationLines { start, .. } => {
                Err(CodecError::UnterminatedRecord { line: start })
            }
        }
    }
}

/// Split on `\n`, `\r\n` or a lone `\r`. A trailing terminator does not
/// produce an extra empty line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let current = rest;
        if current.is_empty() {
            return None;
        }
        let Some(idx) = current.find(['\r', '\n']) else {
            rest = "";
            return Some(current);
        };
        let terminator = if current[idx..].starts_with("\r\n") { 2 } else { 1 };
        rest = &current[idx + terminator..];
        Some(&current[..idx])
    })
}

fn decode<F: RecordFormat>(format: F, text: &str) -> Result<Vec<F::Entity>, CodecError> {
    let mut lines = split_lines(text);
    // The header is ignored, but an empty first line already ends the data.
    if lines.next().is_none_or(str::is_empty) {
        return Ok(Vec::new());
    }

    let mut parser = RecordParser::new(format);
    for (idx, raw) in lines.enumerate() {
        if parser.feed(idx as u64 + 2, raw)? == Flow::EndOfCatalog {
            break;
        }
    }
    parser.finish()
}

fn encode<F: RecordFormat>(entities: &[F::Entity]) -> String {
    let mut out = String::new();
    out.push_str(F::HEADER);
    out.push('\n');
    for entity in entities {
        F::write(entity, &mut out);
    }
    out
}

#[derive(Default)]
struct FoodFormat {
    names: UniqueNames,
}

impl RecordFormat for FoodFormat {
    type Entity = Food;
    type Draft = std::convert::Infallible;

    const HEADER: &'static str = FOOD_HEADER;

    fn begin(&mut self, row: &Row) -> Result<Progress<Self::Draft, Food>, CodecError> {
        let food = Food {
            name: row.field(0).to_string(),
            calories: row.number(1, "calories")?,
            fat: row.number(2, "fat")?,
            carbs: row.number(3, "carbs")?,
            protein: row.number(4, "protein")?,
            serving_size_g: row.number(5, "serving size")?,
        };
        row.expect_blank_from(6)?;
        integrity::food_values(&food, row.line)?;
        self.names.check(&food.name, row.line)?;
        Ok(Progress::Complete(food))
    }

    fn extend(
        &mut self,
        draft: Self::Draft,
        _row: &Row,
    ) -> Result<Progress<Self::Draft, Food>, CodecError> {
        match draft {}
    }

    fn write(food: &Food, out: &mut String) {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            food.name,
            format_number(food.calories),
            format_number(food.fat),
            format_number(food.carbs),
            format_number(food.protein),
            format_number(food.serving_size_g),
        );
    }
}

struct MenuDraft {
    name: String,
    ingredients: Vec<Ingredient>,
}

struct MenuFormat<'a> {
    foods: &'a [Food],
    names: UniqueNames,
}

impl RecordFormat for MenuFormat<'_> {
    type Entity = MenuItem;
    type Draft = MenuDraft;

    const HEADER: &'static str = MENU_HEADER;

    fn begin(&mut self, row: &Row) -> Result<Progress<MenuDraft, MenuItem>, CodecError> {
        row.expect_blank_from(1)?;
        let name = row.field(0).to_string();
        self.names.check(&name, row.line)?;
        Ok(Progress::Pending(MenuDraft {
            name,
            ingredients: Vec::new(),
        }))
    }

    fn extend(
        &mut self,
        mut draft: MenuDraft,
        row: &Row,
    ) -> Result<Progress<MenuDraft, MenuItem>, CodecError> {
        row.expect_blank_from(3)?;

        if row.is_blank(1) {
            let total = row.number(2, "total calories")?;
            integrity::require_ingredients(&draft.name, &draft.ingredients, row.line)?;
            return Ok(Progress::Complete(MenuItem::from_stored(
                draft.name,
                draft.ingredients,
                total,
            )));
        }

        let food = integrity::resolve_food(self.foods, row.field(1), row.line)?;
        let weight_g = row.number(2, "ingredient weight")?;
        integrity::ingredient_weight(weight_g, row.line)?;
        if draft
            .ingredients
            .iter()
            .any(|i| crate::models::same_name(&i.food, &food.name))
        {
            return Err(CodecError::DuplicateName {
                line: row.line,
                name: food.name.clone(),
            });
        }
        draft.ingredients.push(Ingredient {
            food: food.name.clone(),
            weight_g,
        });
        Ok(Progress::Pending(draft))
    }

    fn write(item: &MenuItem, out: &mut String) {
        let _ = writeln!(out, "{}", item.name());
        for ingredient in item.ingredients() {
            let _ = writeln!(
                out,
                ",{},{}",
                ingredient.food,
                format_number(ingredient.weight_g)
            );
        }
        let _ = writeln!(out, ",,{}", format_number(item.total_calories()));
    }
}

struct MealDraft {
    date: NaiveDate,
    meal_type: Option<MealType>,
    items: Vec<String>,
}

struct MealFormat<'a> {
    menu_items: &'a [MenuItem],
}

impl RecordFormat for MealFormat<'_> {
    type Entity = Meal;
    type Draft = MealDraft;

    const HEADER: &'static str = MEAL_HEADER;

    fn begin(&mut self, row: &Row) -> Result<Progress<MealDraft, Meal>, CodecError> {
        row.expect_blank_from(1)?;
        let date = integrity::meal_date(row.field(0), row.line)?;
        Ok(Progress::Pending(MealDraft {
            date,
            meal_type: None,
            items: Vec::new(),
        }))
    }

    fn extend(
        &mut self,
        mut draft: MealDraft,
        row: &Row,
    ) -> Result<Progress<MealDraft, Meal>, CodecError> {
        let Some(meal_type) = draft.meal_type else {
            if row.is_blank(1) {
                return Err(CodecError::MissingMealType { line: row.line });
            }
            row.expect_blank_from(2)?;
            draft.meal_type = Some(integrity::meal_type(row.field(1), row.line)?);
            return Ok(Progress::Pending(draft));
        };

        if !row.is_blank(1) {
            return Err(CodecError::malformed(
                row.line,
                format!("unexpected second meal type '{}'", row.field(1)),
            ));
        }

        if !row.is_blank(2) {
            row.expect_blank_from(3)?;
            let item = integrity::resolve_menu_item(self.menu_items, row.field(2), row.line)?;
            draft.items.push(item.name().to_string());
            return Ok(Progress::Pending(draft));
        }

        row.expect_blank_from(4)?;
        let total_calories = row.number(3, "total calories")?;
        Ok(Progress::Complete(Meal {
            date: draft.date,
            meal_type,
            items: draft.items,
            total_calories,
        }))
    }

    fn write(meal: &Meal, out: &mut String) {
        let _ = writeln!(out, "{}", meal.date.format(MEAL_DATE_FORMAT));
        let _ = writeln!(out, ",{}", meal.meal_type);
        for item in &meal.items {
            let _ = writeln!(out, ",,{item}");
        }
        let _ = writeln!(out, ",,,{}", format_number(meal.total_calories));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOODS: &str = "\
Name,Calories,Fat,Carbs,Protein,Serving Size (g)
banana,105.0,0.4,27.0,1.3,118.0
oats,389.0,6.9,66.3,16.9,100.0
";

    const MENU: &str = "\
Name,Ingredients,Servings (g)
bowl of oats
,oats,50.0
,,194.5
fruit oats
,oats,40.0
,banana,118.0
,,260.6
";

    const MEALS: &str = "\
Date,Meal,Items,Total Calories
01/02/2024
,Breakfast
,,bowl of oats
,,,194.5
01/02/2024
,Dinner
,,fruit oats
,,bowl of oats
,,,455.1
";

    fn loaded() -> (Vec<Food>, Vec<MenuItem>) {
        let foods = decode_foods(FOODS).unwrap();
        let items = decode_menu_items(MENU, &foods).unwrap();
        (foods, items)
    }

    #[test]
    fn test_decode_foods() {
        let foods = decode_foods(FOODS).unwrap();
        assert_eq!(foods.len(), 2);
        assert_eq!(foods[1].name, "oats");
        assert!((foods[1].calories - 389.0).abs() < f64::EPSILON);
        assert!((foods[1].fat - 6.9).abs() < f64::EPSILON);
        assert!((foods[1].serving_size_g - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_menu_items() {
        let (_, items) = loaded();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name(), "bowl of oats");
        assert_eq!(items[0].ingredients().len(), 1);
        assert!((items[0].total_calories() - 194.5).abs() < f64::EPSILON);
        assert_eq!(items[1].ingredients()[1].food, "banana");
        assert!((items[1].ingredients()[1].weight_g - 118.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_meals() {
        let (_, items) = loaded();
        let meals = decode_meals(MEALS, &items).unwrap();
        assert_eq!(meals.len(), 2);
        assert_eq!(meals[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(meals[0].meal_type, MealType::Breakfast);
        assert_eq!(meals[1].items, vec!["fruit oats", "bowl of oats"]);
        assert!((meals[1].total_calories - 455.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_encode_decode_is_byte_identical() {
        let (foods, items) = loaded();
        let meals = decode_meals(MEALS, &items).unwrap();
        assert_eq!(encode_foods(&foods), FOODS);
        assert_eq!(encode_menu_items(&items), MENU);
        assert_eq!(encode_meals(&meals), MEALS);
    }

    #[test]
    fn test_decode_encode_preserves_catalog() {
        let foods = vec![Food {
            name: "rice".to_string(),
            calories: 130.0,
            fat: 0.3,
            carbs: 28.2,
            protein: 2.7,
            serving_size_g: 100.0,
        }];
        let item = MenuItem::new(
            "rice bowl",
            vec![Ingredient::new("rice", 175.5).unwrap()],
            &foods,
        );
        let items = vec![item];
        let meals = vec![Meal::new(
            NaiveDate::from_ymd_opt(2023, 11, 5).unwrap(),
            MealType::Snack,
            &[&items[0]],
        )];

        let decoded_foods = decode_foods(&encode_foods(&foods)).unwrap();
        let decoded_items = decode_menu_items(&encode_menu_items(&items), &decoded_foods).unwrap();
        let decoded_meals = decode_meals(&encode_meals(&meals), &decoded_items).unwrap();
        assert_eq!(decoded_foods, foods);
        assert_eq!(decoded_items, items);
        assert_eq!(decoded_meals, meals);
    }

    #[test]
    fn test_stored_total_is_trusted() {
        let foods = decode_foods(FOODS).unwrap();
        let text = "Name,Ingredients,Servings (g)\nbowl of oats\n,oats,50.0\n,,200.0\n";
        let items = decode_menu_items(text, &foods).unwrap();
        assert!((items[0].total_calories() - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_and_header_only() {
        assert!(decode_foods("").unwrap().is_empty());
        assert!(decode_foods("\n").unwrap().is_empty());
        assert!(decode_foods(FOOD_HEADER).unwrap().is_empty());
        assert!(decode_meals("Date,Meal,Items,Total Calories\n", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_blank_line_ends_catalog() {
        let text = "\
Name,Calories,Fat,Carbs,Protein,Serving Size (g)
banana,105.0,0.4,27.0,1.3,118.0

oats,389.0,6.9,66.3,16.9,100.0
";
        let foods = decode_foods(text).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "banana");
    }

    #[test]
    fn test_blank_line_inside_record_is_corrupt() {
        let foods = decode_foods(FOODS).unwrap();
        let text = "Name,Ingredients,Servings (g)\nbowl of oats\n,oats,50.0\n\n,,194.5\n";
        assert_eq!(
            decode_menu_items(text, &foods).unwrap_err(),
            CodecError::UnterminatedRecord { line: 2 }
        );
    }

    #[test]
    fn test_missing_trailer_at_end_of_file() {
        let foods = decode_foods(FOODS).unwrap();
        let text = "Name,Ingredients,Servings (g)\nbowl of oats\n,oats,50.0\n";
        assert_eq!(
            decode_menu_items(text, &foods).unwrap_err(),
            CodecError::UnterminatedRecord { line: 2 }
        );
    }

    #[test]
    fn test_new_record_before_trailer() {
        let foods = decode_foods(FOODS).unwrap();
        let text = "Name,Ingredients,Servings (g)\nbowl of oats\n,oats,50.0\nbanana bowl\n,banana,100.0\n,,89.0\n";
        assert_eq!(
            decode_menu_items(text, &foods).unwrap_err(),
            CodecError::UnterminatedRecord { line: 2 }
        );
    }

    #[test]
    fn test_orphan_continuation_line() {
        let foods = decode_foods(FOODS).unwrap();
        let text = "Name,Ingredients,Servings (g)\n,oats,50.0\n,,194.5\n";
        assert_eq!(
            decode_menu_items(text, &foods).unwrap_err(),
            CodecError::OrphanContinuation { line: 2 }
        );
    }

    #[test]
    fn test_unknown_food() {
        let foods = decode_foods(FOODS).unwrap();
        let text = "Name,Ingredients,Servings (g)\nbowl of rice\n,rice,50.0\n,,65.0\n";
        assert_eq!(
            decode_menu_items(text, &foods).unwrap_err(),
            CodecError::UnknownFood {
                line: 3,
                name: "rice".to_string()
            }
        );
    }

    #[test]
    fn test_ingredient_resolves_case_insensitively() {
        let foods = decode_foods(FOODS).unwrap();
        let text = "Name,Ingredients,Servings (g)\nbowl of oats\n,OATS,50.0\n,,194.5\n";
        let items = decode_menu_items(text, &foods).unwrap();
        assert_eq!(items[0].ingredients()[0].food, "oats");
    }

    #[test]
    fn test_menu_item_without_ingredients() {
        let text = "Name,Ingredients,Servings (g)\nnothing\n,,0.0\n";
        assert!(matches!(
            decode_menu_items(text, &[]),
            Err(CodecError::EmptyMenuItem { line: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let text = "\
Name,Calories,Fat,Carbs,Protein,Serving Size (g)
oats,389.0,6.9,66.3,16.9,100.0
Oats,389.0,6.9,66.3,16.9,100.0
";
        assert!(matches!(
            decode_foods(text),
            Err(CodecError::DuplicateName { line: 3, .. })
        ));

        let foods = decode_foods(FOODS).unwrap();
        let text = "Name,Ingredients,Servings (g)\ndouble oats\n,oats,50.0\n,oats,10.0\n,,233.4\n";
        assert!(matches!(
            decode_menu_items(text, &foods),
            Err(CodecError::DuplicateName { line: 4, .. })
        ));
    }

    #[test]
    fn test_malformed_numbers() {
        let text = "Name,Calories,Fat,Carbs,Protein,Serving Size (g)\noats,lots,6.9,66.3,16.9,100.0\n";
        assert!(matches!(
            decode_foods(text),
            Err(CodecError::Malformed { line: 2, .. })
        ));

        let text = "Name,Calories,Fat,Carbs,Protein,Serving Size (g)\noats,NaN,6.9,66.3,16.9,100.0\n";
        assert!(matches!(
            decode_foods(text),
            Err(CodecError::Malformed { line: 2, .. })
        ));

        let text = "Name,Calories,Fat,Carbs,Protein,Serving Size (g)\noats,389.0,6.9\n";
        assert!(matches!(
            decode_foods(text),
            Err(CodecError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_food_with_zero_serving_size() {
        let text = "Name,Calories,Fat,Carbs,Protein,Serving Size (g)\noats,389.0,6.9,66.3,16.9,0.0\n";
        assert!(matches!(
            decode_foods(text),
            Err(CodecError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_non_positive_ingredient_weight() {
        let foods = decode_foods(FOODS).unwrap();
        let text = "Name,Ingredients,Servings (g)\nbowl of oats\n,oats,0.0\n,,0.0\n";
        assert!(matches!(
            decode_menu_items(text, &foods),
            Err(CodecError::Malformed { line: 3, .. })
        ));
    }

    #[test]
    fn test_meal_invalid_date() {
        let (_, items) = loaded();
        let text = "Date,Meal,Items,Total Calories\n2024-01-02\n,Lunch\n,,bowl of oats\n,,,194.5\n";
        assert!(matches!(
            decode_meals(text, &items),
            Err(CodecError::InvalidDate { line: 2, .. })
        ));
    }

    #[test]
    fn test_meal_invalid_meal_type() {
        let (_, items) = loaded();
        let text = "Date,Meal,Items,Total Calories\n01/02/2024\n,Supper\n,,bowl of oats\n,,,194.5\n";
        assert!(matches!(
            decode_meals(text, &items),
            Err(CodecError::InvalidMealType { line: 3, .. })
        ));
    }

    #[test]
    fn test_meal_missing_meal_type() {
        let (_, items) = loaded();
        let text = "Date,Meal,Items,Total Calories\n01/02/2024\n,,bowl of oats\n,,,194.5\n";
        assert_eq!(
            decode_meals(text, &items).unwrap_err(),
            CodecError::MissingMealType { line: 3 }
        );
    }

    #[test]
    fn test_meal_unknown_menu_item() {
        let (_, items) = loaded();
        let text = "Date,Meal,Items,Total Calories\n01/02/2024\n,Lunch\n,,toast\n,,,80.0\n";
        assert_eq!(
            decode_meals(text, &items).unwrap_err(),
            CodecError::UnknownMenuItem {
                line: 4,
                name: "toast".to_string()
            }
        );
    }

    #[test]
    fn test_meal_without_items() {
        let text = "Date,Meal,Items,Total Calories\n03/04/2024\n,Snack\n,,,0.0\n";
        let meals = decode_meals(text, &[]).unwrap();
        assert_eq!(meals.len(), 1);
        assert!(meals[0].items.is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = FOODS.replace('\n', "\r\n");
        assert_eq!(decode_foods(&text).unwrap().len(), 2);
    }

    #[test]
    fn test_cr_only_line_endings() {
        let text = FOODS.replace('\n', "\r");
        let foods = decode_foods(&text).unwrap();
        assert_eq!(foods.len(), 2);
        assert_eq!(encode_foods(&foods), FOODS);

        let (foods, _) = loaded();
        let items = decode_menu_items(&MENU.replace('\n', "\r"), &foods).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_embedded_carriage_return_starts_new_line() {
        let text = "H\nbanana,105.0,0.4,27.0,1.3,118.0\rjunk,xx\n";
        assert!(matches!(
            decode_foods(text),
            Err(CodecError::Malformed { line: 3, .. })
        ));
    }

    #[test]
    fn test_row_holds_a_single_record() {
        assert!(Row::parse(2, "banana,105.0").is_ok());
        assert!(matches!(
            Row::parse(2, "banana,105.0\rjunk,xx"),
            Err(CodecError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_split_lines() {
        let lines: Vec<_> = split_lines("a\r\nb\rc\n\nd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "", "d"]);
        assert_eq!(split_lines("a\n").count(), 1);
        assert_eq!(split_lines("").count(), 0);
    }

    #[test]
    fn test_lenient_meal_fields_are_rewritten_canonically() {
        let (_, items) = loaded();
        let text = "Date,Meal,Items,Total Calories\n1/2/2024\n,breakfast\n,,Bowl Of Oats\n,,,194.5\n";
        let meals = decode_meals(text, &items).unwrap();
        assert_eq!(meals[0].meal_type, MealType::Breakfast);
        assert_eq!(meals[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        let canonical = "Date,Meal,Items,Total Calories\n01/02/2024\n,Breakfast\n,,bowl of oats\n,,,194.5\n";
        assert_eq!(encode_meals(&meals), canonical);
    }

    #[test]
    fn test_encode_skips_empty_menu_items() {
        let foods = decode_foods(FOODS).unwrap();
        let empty = MenuItem::new("nothing", Vec::new(), &foods);
        let full = MenuItem::new(
            "bowl of oats",
            vec![Ingredient::new("oats", 50.0).unwrap()],
            &foods,
        );
        let text = encode_menu_items(&[empty, full]);
        assert!(!text.contains("nothing"));
        assert_eq!(decode_menu_items(&text, &foods).unwrap().len(), 1);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(50.0), "50.0");
        assert_eq!(format_number(194.5), "194.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(0.0), "0.0");
    }

    mod round_trip {
        use super::*;
        use chrono::Duration;
        use proptest::prelude::*;
        use proptest::sample::Index;

        type FoodValues = (f64, f64, f64, f64, f64);
        type MealChoice = (i64, usize, Vec<Index>);

        fn food_values() -> impl Strategy<Value = FoodValues> {
            (
                0.0..1e6f64,
                0.0..500.0f64,
                0.0..500.0f64,
                0.0..500.0f64,
                0.1..1e4f64,
            )
        }

        fn ingredient() -> impl Strategy<Value = (Index, f64)> {
            (any::<Index>(), 0.5..2000.0f64)
        }

        fn meal() -> impl Strategy<Value = MealChoice> {
            (
                0..3650i64,
                0..MealType::ALL.len(),
                prop::collection::vec(any::<Index>(), 1..4),
            )
        }

        fn build(
            food_values: &[FoodValues],
            recipes: &[Vec<(Index, f64)>],
            meals: &[MealChoice],
        ) -> (Vec<Food>, Vec<MenuItem>, Vec<Meal>) {
            let foods: Vec<Food> = food_values
                .iter()
                .enumerate()
                .map(|(i, &(calories, fat, carbs, protein, serving_size_g))| Food {
                    name: format!("food {i}"),
                    calories,
                    fat,
                    carbs,
                    protein,
                    serving_size_g,
                })
                .collect();

            let items: Vec<MenuItem> = recipes
                .iter()
                .enumerate()
                .map(|(j, recipe)| {
                    let mut ingredients: Vec<Ingredient> = Vec::new();
                    for (pick, weight_g) in recipe {
                        let food = &foods[pick.index(foods.len())];
                        if ingredients.iter().all(|i| i.food != food.name) {
                            ingredients.push(Ingredient::new(&food.name, *weight_g).unwrap());
                        }
                    }
                    MenuItem::new(&format!("dish {j}"), ingredients, &foods)
                })
                .collect();

            let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
            let meals = meals
                .iter()
                .map(|(days, type_idx, picks)| {
                    let eaten: Vec<&MenuItem> =
                        picks.iter().map(|p| &items[p.index(items.len())]).collect();
                    Meal::new(base + Duration::days(*days), MealType::ALL[*type_idx], &eaten)
                })
                .collect();
            (foods, items, meals)
        }

        proptest! {
            #[test]
            fn proptest_encode_decode_round_trip(
                food_values in prop::collection::vec(food_values(), 1..6),
                recipes in prop::collection::vec(prop::collection::vec(ingredient(), 1..4), 1..5),
                meal_choices in prop::collection::vec(meal(), 0..6),
            ) {
                let (foods, items, meals) = build(&food_values, &recipes, &meal_choices);

                let food_text = encode_foods(&foods);
                let menu_text = encode_menu_items(&items);
                let meal_text = encode_meals(&meals);

                let decoded_foods = decode_foods(&food_text).unwrap();
                let decoded_items = decode_menu_items(&menu_text, &decoded_foods).unwrap();
                let decoded_meals = decode_meals(&meal_text, &decoded_items).unwrap();
                prop_assert_eq!(&decoded_foods, &foods);
                prop_assert_eq!(&decoded_items, &items);
                prop_assert_eq!(&decoded_meals, &meals);

                prop_assert_eq!(encode_foods(&decoded_foods), food_text);
                prop_assert_eq!(encode_menu_items(&decoded_items), menu_text);
                prop_assert_eq!(encode_meals(&decoded_meals), meal_text);
            }
        }
    }
}
