//! # photo-prune CLI
//!
//! Command-line interface for the near-duplicate scan engine.
//!
//! ## Usage
//! ```bash
//! photo-prune scan selection.json
//! photo-prune scan - --output json < selection.json
//! ```

mod cli;

use photo_prune::Result;

fn main() -> Result<()> {
    cli::run()
}
