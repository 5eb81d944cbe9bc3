pub mod ai;
pub mod body;
pub mod entity;
pub mod field;
pub mod geom;
pub mod gravity;
pub mod grid;
pub mod physics;
pub mod platform;
pub mod tile;
