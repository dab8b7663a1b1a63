#![deny(unsafe_code)]

//! Data model for longitudinal study consolidation.
//!
//! A [`Table`] is an ordered sequence of named [`Column`]s of equal length,
//! identified by a primary key (patient) and an optional secondary key
//! (visit), described by a [`KeySpec`]. Cells are loosely typed
//! [`CellValue`]s: absent, text, or numeric.

pub mod error;
pub mod keys;
pub mod table;
pub mod value;

pub use error::{ModelError, Result};
pub use keys::KeySpec;
pub use table::{Column, Table};
pub use value::CellValue;
