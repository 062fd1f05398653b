mod handlers;
mod main_menu;
mod prompts;

pub use handlers::build_dispatcher;
pub use main_menu::show_main_menu;
