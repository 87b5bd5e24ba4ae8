//! Component protocol cases.

use std::time::Duration;

use crate::tester::TesterOptions;

use super::case::{Case, Category, Group, Step};

/// Time budget for the runtime to list the component library.
pub const LISTING_TIMEOUT: Duration = Duration::from_secs(20);

/// Returns the component group.
#[must_use]
pub fn group(options: &TesterOptions) -> Group {
    Group::new(
        Category::Component,
        vec![
            Case::new(
                Category::Component,
                "listing",
                "requesting a component list should receive some known components",
            )
            .step(Step::AwaitComponent {
                component: options.component("Repeat"),
                budget: LISTING_TIMEOUT,
            }),
        ],
    )
}
