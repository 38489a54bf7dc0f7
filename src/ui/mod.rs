//! egui rendering. Every function here reads from [`crate::state::AppState`]
//! and the data engines; none of them owns data.

pub mod map;
pub mod pages;
pub mod panels;
pub mod plot;
pub mod table;
