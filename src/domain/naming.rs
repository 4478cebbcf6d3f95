//! Deterministic names derived from a pull request.
//!
//! Re-deriving a name from the same inputs always yields the same string;
//! this is the only thing that ties a pull request to its pipeline.

/// Per-PR pipeline name: `prefix + number`
pub fn pipeline_name(prefix: &str, pr_number: u64) -> String {
    format!("{}{}", prefix, pr_number)
}

/// Infrastructure stack deployed by a target pipeline
pub fn stack_name(stack_prefix: &str, pipeline: &str) -> String {
    format!("{}{}", stack_prefix, pipeline)
}

/// Change set created by a target pipeline's deploy actions
pub fn change_set_name(change_set_prefix: &str, pipeline: &str) -> String {
    format!("{}{}", change_set_prefix, pipeline)
}
