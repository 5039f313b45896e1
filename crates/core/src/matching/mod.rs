//! Identity resolution: which member sent this transfer?
//!
//! Six ordered tiers, tried until one resolves:
//!
//! | Tier | Evidence | Confidence |
//! |------|----------|------------|
//! | A | exact CUIT | 100 |
//! | B | exact DNI + name similarity >= 50% | 95 |
//! | C | CUIT/DNI cross-check | 98 |
//! | D | full-name similarity >= 85% | rounded similarity |
//! | E | surname similarity in [60%, 80%] | rounded similarity |
//! | E.5 | keyword alias by CUIT | 75 |
//! | F | nothing | 0 |

mod matcher;
pub mod tiers;
mod types;

pub use matcher::{IdentityMatcher, MatchOutcome};
pub use types::*;
