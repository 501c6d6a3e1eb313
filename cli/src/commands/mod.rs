mod food;
mod helpers;
mod meal;
mod menu;

pub(crate) use food::{cmd_food_add, cmd_food_delete, cmd_food_edit, cmd_food_list};
pub(crate) use helpers::{parse_date, parse_grams, parse_ingredient, print_notices};
pub(crate) use meal::{cmd_meal_list, cmd_meal_log};
pub(crate) use menu::{
    cmd_menu_create, cmd_menu_delete, cmd_menu_list, cmd_menu_remove_ingredient,
    cmd_menu_set_ingredient, cmd_menu_show,
};
