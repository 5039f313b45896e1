//! Text normalization for bank descriptions and member identities.
//!
//! Everything here is a pure function that fails closed: unparseable
//! input yields `None` or an empty string, never an error.

mod extract;
mod normalize;

pub use extract::{
    DescriptionTokens, embedded_dni, extract_cuit, extract_dni, extract_names, extract_tokens,
    is_valid_cuit,
};
pub use normalize::{
    collapse_whitespace, fold_accent, normalize_for_hash, normalize_id, normalize_text,
    split_full_name,
};
