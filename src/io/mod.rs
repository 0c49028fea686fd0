//! CSV adapters for option chains, Treasury par yields, published index values
//! and calculated results. Nothing here runs inside the calculation itself.

pub mod input;
pub mod output;

pub use input::{
    load_market_vix, load_rate_book, load_snapshots, parse_date, read_market_vix, read_rate_book,
    read_snapshots,
};
pub use output::{write_results, write_results_to, VixRecord};
