use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use forkful_core::models::{Food, Ingredient, MEAL_DATE_FORMAT, Meal, parse_meal_date};
use forkful_core::recovery::RecoveryNotice;

/// Parse a weight like "50", "50g" or "50.5 g" into grams.
pub(crate) fn parse_grams(s: &str) -> Result<f64> {
    let trimmed = s.trim().trim_end_matches('g').trim();
    let value: f64 = trimmed
        .parse()
        .with_context(|| format!("Invalid weight: '{s}'. Use a number like '50' or '50g'"))?;
    if !value.is_finite() || value <= 0.0 {
        bail!("Weight must be greater than 0");
    }
    Ok(value)
}

/// Parse a `food:weight` ingredient argument. The last colon separates the
/// weight, so food names may contain colons.
pub(crate) fn parse_ingredient(s: &str) -> Result<Ingredient> {
    let Some((food, weight)) = s.rsplit_once(':') else {
        bail!("Invalid ingredient '{s}'. Use 'food:weight' (e.g. 'oats:50g')");
    };
    if food.trim().is_empty() {
        bail!("Invalid ingredient '{s}'. Food name is empty");
    }
    Ingredient::new(food, parse_grams(weight)?)
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => parse_meal_date(&s).context("Use MM/DD/YYYY or today/yesterday/tomorrow"),
        },
    }
}

/// Report catalogs that were reset during load.
pub(crate) fn print_notices(notices: &[RecoveryNotice]) {
    for notice in notices {
        eprintln!("Warning: {notice}");
    }
}

pub(crate) fn print_food_table(foods: &[&Food]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Serving (g)")]
        serving: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .map(|f| FoodRow {
            name: truncate(&f.name, 35),
            calories: format!("{:.0}", no_neg_zero(f.calories)),
            fat: format!("{:.1}", f.fat),
            carbs: format!("{:.1}", f.carbs),
            protein: format!("{:.1}", f.protein),
            serving: format!("{:.0}", f.serving_size_g),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_meal_table(meals: &[&Meal]) {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Items")]
        items: String,
        #[tabled(rename = "Calories")]
        calories: String,
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .map(|m| MealRow {
            date: m.date.format(MEAL_DATE_FORMAT).to_string(),
            meal: m.meal_type.to_string(),
            items: truncate(&m.items.join(", "), 50),
            calories: format!("{:.0}", no_neg_zero(m.total_calories)),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Incremental updates can leave a total at `-0.0`.
pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
