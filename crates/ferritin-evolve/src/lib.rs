//! ferritin-evolve
//!
//! Directed evolution of a protein sequence guided by an ESM-2 masked language model.
//!
//! - pick an ESM-2 checkpoint and load it as a scoring expert
//! - hand the sequence to an MCMC search engine
//! - rank the returned variants and list their substitutions
//!
//! ```shell
//! cargo run --bin ferritin-evolve -- checkpoints
//! cargo run --bin ferritin-evolve -- evolve --sequence MKTAYIAKQR --search-program ./evo-search
//! cargo run --bin ferritin-evolve --features cuda -- score --sequence MKTAYIAK --variant MKTAYLAK
//! ```
pub mod checkpoints;
pub mod config;
pub mod device;
pub mod error;
pub mod expert;
pub mod fasta;
pub mod search;
pub mod session;
pub mod store;
pub mod table;

pub use config::{OutputMode, SearchConfig};
pub use device::DeviceKind;
pub use error::{EvoError, Result, Stage};
pub use expert::{build_expert, EsmExpert, Expert, ExpertName, ExpertOptions, ExpertSpec};
pub use search::{evolve, ExternalSearch, SearchEngine, SearchOutput};
pub use session::EvolutionSession;
pub use store::{HubModelStore, MaskedLanguageModel, ModelStore};
pub use table::{ResultTable, VariantRecord};
