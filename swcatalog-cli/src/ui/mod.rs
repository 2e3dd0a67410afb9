//! Terminal output for swcatalog.

mod terminal;

pub use terminal::ConsoleSink;
