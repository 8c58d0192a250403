pub mod challenge;
pub mod diagnostics;
pub mod schema;

pub use challenge::{
    Behavior, Challenge, ChallengeId, File, Flag, Hint, Requirements, SNAPSHOT_ID, Snapshot,
};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use schema::{SchemaMismatch, challenges_schema, conforms};
