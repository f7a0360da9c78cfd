pub mod components;
pub mod slashcommands;
