//! Runtime protocol cases.

use super::case::{Case, Category, Group, Step};

/// Returns the runtime group.
#[must_use]
pub fn group() -> Group {
    Group::new(
        Category::Runtime,
        vec![
            Case::new(
                Category::Runtime,
                "metadata",
                "requesting runtime metadata should provide it back",
            )
            .step(Step::RequestRuntime),
        ],
    )
}
