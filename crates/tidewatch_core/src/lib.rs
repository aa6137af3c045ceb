//! Tidewatch core: pure state model, filter chains and diff strategies.
mod diff;
mod filter;
mod output;
mod payload;
mod state;

pub use diff::{
    append_new, AppendMerge, AppendOnly, Appended, Changed, DiffError, DiffStrategy, LastWins,
    Merged,
};
pub use filter::{filter_fn, Filter, FilterChain, FnFilter};
pub use output::{Output, TEXT_HTML, TEXT_PLAIN};
pub use payload::{escape_html, Payload};
pub use state::{State, StateError};
