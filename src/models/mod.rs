pub mod column;
pub mod format;
pub mod record;
pub mod table;

pub use column::{label_from_name, Column, ColumnKind, StateSource};
pub use format::StateFormat;
pub use record::Record;
pub use table::{Page, Paginator, Table, TableData};
