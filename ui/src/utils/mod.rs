pub mod colors;
pub mod export_target;
