//! Brand-mention extraction and dataset assembly
//!
//! The two downstream transformations of the pipeline: flagging brand
//! mentions in collected responses, and joining both providers' results
//! with external brand/topic metrics into one wide analytic CSV.

pub mod assemble;
pub mod locale;
pub mod mentions;

mod io;

pub use assemble::{assemble, AssembleInputs};
pub use mentions::{extract_mentions_file, BrandPatterns, MentionRow, DEFAULT_BRAND_PATTERNS};
