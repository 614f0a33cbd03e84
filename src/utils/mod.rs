pub mod normalize;
pub mod ident;

pub use normalize::{
    name_similarity, normalize_name, normalize_name_loose, person_key, split_credit_name,
};
pub use ident::{normalize_doi, normalize_orcid};
