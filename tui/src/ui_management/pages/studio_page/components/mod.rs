pub mod category_picker;
pub mod theme_list;
pub mod title_input;
