use anyhow::Result;
use chrono::NaiveDate;
use std::process;

use forkful_core::models::{MEAL_DATE_FORMAT, Meal, MealType, NewMeal};
use forkful_core::store::CatalogStore;

use super::helpers::{no_neg_zero, print_meal_table};

pub(crate) fn cmd_meal_log(
    store: &mut CatalogStore,
    meal_type: MealType,
    items: Vec<String>,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let meal = store.log_meal(&NewMeal {
        date,
        meal_type,
        items,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let date = meal.date.format(MEAL_DATE_FORMAT);
        let meal_type = meal.meal_type;
        let items = meal.items.join(", ");
        let cal = no_neg_zero(meal.total_calories);
        println!("Logged {meal_type} on {date}: {items} — {cal:.0} kcal");
    }

    Ok(())
}

pub(crate) fn cmd_meal_list(store: &CatalogStore, date: Option<NaiveDate>, json: bool) -> Result<()> {
    let mut meals: Vec<&Meal> = match date {
        Some(date) => store.meals_on(date).collect(),
        None => store.meals().iter().collect(),
    };

    if meals.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No meals logged");
        }
        process::exit(2);
    }

    meals.sort_by_key(|m| (m.date, m.meal_type));
    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
        return Ok(());
    }

    print_meal_table(&meals);
    let total: f64 = meals.iter().map(|m| m.total_calories).sum();
    println!("Total: {:.0} kcal", no_neg_zero(total));

    Ok(())
}
