//! AI prompt templates.

pub mod grocery_list;
pub mod purchase_units;

pub use grocery_list::{render_grocery_list_prompt, GROCERY_LIST_PROMPT_NAME, GROCERY_LIST_SYSTEM_PROMPT};
pub use purchase_units::{
    render_purchase_units_prompt, PURCHASE_UNITS_PROMPT_NAME, PURCHASE_UNITS_SYSTEM_PROMPT,
};
