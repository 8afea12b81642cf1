pub mod csv_loader;

pub use csv_loader::{read_bars, BarReader};
