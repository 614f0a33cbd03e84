pub mod db;
pub mod handlers;
pub mod importers;
pub mod merge;
pub mod middleware;
pub mod models;
pub mod utils;

// Re-export commonly used items (avoiding ambiguous re-exports)
pub use models::{
    AuthorOrder, Contribution, CreateAuthorOrder, UpdateAuthorOrder,
    CreateDissertation, Degree, Dissertation, UpdateDissertation,
    CreatePerson, MergeRequest, Person, UpdatePerson,
    CreatePublication, Publication, UpdatePublication,
};
pub use importers::{ImportOutcome, ImportStats, WorkAuthor, WorkRecord};
pub use merge::{merge_people, DuplicateCandidate, MergeError, MergeSummary};
pub use utils::{
    name_similarity, normalize_doi, normalize_name, normalize_name_loose, normalize_orcid,
    person_key, split_credit_name,
};
