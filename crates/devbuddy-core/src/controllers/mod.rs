pub mod app_controller;
pub mod shell;

pub use app_controller::AppController;
pub use shell::{Notice, NoticeKind, Sidebar, SidebarView};
