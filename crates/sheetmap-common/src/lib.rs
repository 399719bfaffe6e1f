extern crate self as sheetmap_common;

pub mod color;
pub mod columns;
pub mod error;
pub mod record;
pub mod row;
pub mod table;
pub mod value;

pub use color::*;
pub use columns::*;
pub use error::*;
pub use record::*;
pub use row::*;
pub use table::*;
pub use value::*;
