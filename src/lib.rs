pub mod config;
pub mod error;
pub mod gamma;
pub mod loader;
pub mod prefix_doubling;
pub mod psi_table;
pub mod searchable;
pub mod table;
pub mod util;

pub use config::IndexConfig;
pub use error::{Error, Result};
pub use gamma::GammaBlock;
pub use psi_table::{PsiTable, Region};
pub use searchable::{Hit, Probe, Searchable};
pub use table::SuffixTable;
pub use util::MemoryUsage;
