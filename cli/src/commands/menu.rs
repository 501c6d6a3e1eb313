use anyhow::{Result, bail};
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use forkful_core::models::{Ingredient, MenuItem, Named, calculate_calories};
use forkful_core::store::{CatalogStore, IngredientChange, IngredientRemoval};

use super::helpers::{no_neg_zero, truncate};

#[derive(Serialize)]
struct IngredientDetail<'a> {
    food: &'a str,
    weight_g: f64,
    calories: f64,
}

#[derive(Serialize)]
struct MenuItemDetail<'a> {
    name: &'a str,
    ingredients: Vec<IngredientDetail<'a>>,
    total_calories: f64,
}

fn detail<'a>(store: &CatalogStore, item: &'a MenuItem) -> MenuItemDetail<'a> {
    MenuItemDetail {
        name: item.name(),
        ingredients: item
            .ingredients()
            .iter()
            .map(|i| IngredientDetail {
                food: &i.food,
                weight_g: i.weight_g,
                calories: calculate_calories(store.find_food(&i.food), i.weight_g),
            })
            .collect(),
        total_calories: item.total_calories(),
    }
}

pub(crate) fn cmd_menu_create(
    store: &mut CatalogStore,
    name: &str,
    ingredients: &[Ingredient],
    json: bool,
) -> Result<()> {
    let item = store.create_menu_item(name, ingredients)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail(store, &item))?);
    } else {
        let name = item.name();
        let count = item.ingredients().len();
        let total = no_neg_zero(item.total_calories());
        println!("Created menu item: {name} ({count} ingredients, {total:.1} kcal)");
    }

    Ok(())
}

pub(crate) fn cmd_menu_set_ingredient(
    store: &mut CatalogStore,
    item_name: &str,
    food_name: &str,
    weight_g: f64,
    json: bool,
) -> Result<()> {
    let change = store.set_ingredient(item_name, food_name, weight_g)?;
    let Some(item) = store.find_menu_item(item_name) else {
        bail!("Menu item '{item_name}' not found");
    };

    if json {
        println!(
            "{}",
            serde_json::json!({ "change": change, "menu_item": detail(store, item) })
        );
    } else {
        let name = item.name();
        let total = no_neg_zero(item.total_calories());
        match change {
            IngredientChange::Added => {
                println!("Added {weight_g}g of {food_name} to {name} ({total:.1} kcal)");
            }
            IngredientChange::Updated { previous_g } => println!(
                "Changed {food_name} in {name} from {previous_g}g to {weight_g}g ({total:.1} kcal)"
            ),
        }
    }

    Ok(())
}

pub(crate) fn cmd_menu_remove_ingredient(
    store: &mut CatalogStore,
    item_name: &str,
    food_name: &str,
    json: bool,
) -> Result<()> {
    let removal = store.remove_ingredient(item_name, food_name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&removal)?);
        return Ok(());
    }

    match removal {
        IngredientRemoval::Removed { menu_item } => {
            let name = menu_item.name();
            let total = no_neg_zero(menu_item.total_calories());
            println!("Removed {food_name} from {name} ({total:.1} kcal)");
        }
        IngredientRemoval::MenuItemDeleted { name } => {
            println!("Removed {food_name}, the last ingredient of {name}; deleted {name}");
        }
    }

    Ok(())
}

pub(crate) fn cmd_menu_delete(store: &mut CatalogStore, name: &str, json: bool) -> Result<()> {
    let referencing = store.delete_menu_item(name)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": name, "referencing_meals": referencing })
        );
    } else {
        println!("Deleted menu item: {name}");
        if referencing > 0 {
            eprintln!(
                "Warning: {referencing} logged meal(s) still reference it. The meal log will fail to load until it is created again."
            );
        }
    }

    Ok(())
}

pub(crate) fn cmd_menu_show(store: &CatalogStore, name: &str, json: bool) -> Result<()> {
    let Some(item) = store.find_menu_item(name) else {
        bail!("Menu item '{name}' not found");
    };
    let detail = detail(store, item);

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    println!("=== {} ===", detail.name);
    println!("  INGREDIENTS:");
    for ing in &detail.ingredients {
        let food = ing.food;
        let weight = ing.weight_g;
        let cal = no_neg_zero(ing.calories);
        println!("    {food} | {weight}g | {cal:.1} kcal");
    }
    let total = no_neg_zero(detail.total_calories);
    println!("\n  TOTAL: {total:.1} kcal");

    Ok(())
}

pub(crate) fn cmd_menu_list(store: &CatalogStore, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct MenuItemRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
        #[tabled(rename = "Calories")]
        calories: String,
    }

    let mut items: Vec<&MenuItem> = store.menu_items().iter().collect();
    if items.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No menu items found");
        }
        process::exit(2);
    }

    items.sort_by_cached_key(|i| i.name().to_lowercase());
    if json {
        let details: Vec<MenuItemDetail> = items.iter().map(|i| detail(store, i)).collect();
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    let rows: Vec<MenuItemRow> = items
        .iter()
        .map(|i| MenuItemRow {
            name: truncate(i.name(), 35),
            ingredients: i.ingredients().len(),
            calories: format!("{:.1}", no_neg_zero(i.total_calories())),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
