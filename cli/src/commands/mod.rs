pub mod diff_layout;
pub mod dump;
pub mod repair;
pub mod show;
