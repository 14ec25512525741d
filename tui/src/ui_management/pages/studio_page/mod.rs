mod components;
mod section;
mod studio_page;

pub use self::studio_page::StudioPage;
