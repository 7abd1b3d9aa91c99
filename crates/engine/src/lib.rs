pub mod address;
pub mod cell;
pub mod field;
pub mod navigation;
pub mod range;
pub mod sheet;
pub mod viewport;
