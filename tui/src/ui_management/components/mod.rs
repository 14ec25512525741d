pub use self::component::{Component, ComponentRender};

mod component;
pub mod input_box;
pub mod log_pane;
