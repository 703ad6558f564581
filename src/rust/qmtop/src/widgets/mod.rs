mod help;
mod status;
mod table_helper;
pub use help::help_line;
pub use status::status_line;
pub use table_helper::TableHelper;
