//! Store backends

pub mod mongodb;
