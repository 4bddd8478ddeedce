//! Alert fragments for displaying error messages to users.
//!
//! Alerts are rendered into the fixed alert container at the bottom of the
//! page via htmx's `hx-target-error` attribute.

use maud::{Markup, html};

/// Renders an error alert for the page's alert container.
pub fn error_alert(message: &str, details: &str) -> Markup {
    html!(
        div
            class="w-full rounded-lg border border-red-300 bg-red-50 p-4
                text-red-800 shadow-md dark:border-red-800 dark:bg-gray-800
                dark:text-red-400"
            role="alert"
        {
            p class="font-medium" { (message) }

            @if !details.is_empty() {
                p class="text-sm" { (details) }
            }
        }
    )
}
