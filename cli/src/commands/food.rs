use anyhow::Result;
use std::process;

use forkful_core::models::{Food, FoodUpdate, NewFood};
use forkful_core::store::CatalogStore;

use super::helpers::print_food_table;

pub(crate) fn cmd_food_add(store: &mut CatalogStore, new: &NewFood, json: bool) -> Result<()> {
    let food = store.add_food(new)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        let calories = food.calories;
        let serving = food.serving_size_g;
        println!("Added food: {name} ({calories:.0} kcal per {serving}g)");
    }

    Ok(())
}

pub(crate) fn cmd_food_edit(
    store: &mut CatalogStore,
    name: &str,
    update: &FoodUpdate,
    json: bool,
) -> Result<()> {
    let food = store.edit_food(name, update)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        let calories = food.calories;
        let serving = food.serving_size_g;
        println!("Updated food: {name} ({calories:.0} kcal per {serving}g)");
    }

    Ok(())
}

pub(crate) fn cmd_food_delete(store: &mut CatalogStore, name: &str, json: bool) -> Result<()> {
    let referrers = store.delete_food(name)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": name, "still_referenced_by": referrers })
        );
    } else {
        println!("Deleted food: {name}");
        if !referrers.is_empty() {
            eprintln!(
                "Warning: still used by {}. Those menu items will fail to load until the food is added again.",
                referrers.join(", ")
            );
        }
    }

    Ok(())
}

pub(crate) fn cmd_food_list(store: &CatalogStore, json: bool) -> Result<()> {
    let mut foods: Vec<&Food> = store.foods().iter().collect();

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods found");
        }
        process::exit(2);
    }

    foods.sort_by_cached_key(|f| f.name.to_lowercase());
    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        print_food_table(&foods);
    }

    Ok(())
}
