pub mod table;

pub use table::{Gap, ResultTable, TableRow};
