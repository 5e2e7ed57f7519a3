pub mod artifacts;
pub mod cache;
pub mod cmake;
pub mod commands;
pub mod export;
pub mod layout;
pub mod lifecycle;
pub mod manifest;
pub mod recipe;
pub mod reference;
pub mod runtime;
pub mod settings;
pub mod toolchain;
pub mod version;
