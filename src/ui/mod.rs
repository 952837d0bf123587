pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, muted, path, section, status, success, summary_row, warn};
pub use progress::Spinner;
pub use table::{TableBuilder, rows_table};
pub use theme::theme;
