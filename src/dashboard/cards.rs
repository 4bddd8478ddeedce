//! Metric cards summarising the selected date range.
//!
//! Shows the headline numbers above the charts: total orders and total
//! revenue, both derived from the daily summary table.

use maud::{Markup, html};

use crate::{dashboard::aggregation::DailyOrderSummary, html::format_currency};

/// Headline totals for the selected date range.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct RangeTotals {
    /// The summed per-day distinct order counts.
    pub total_orders: usize,
    /// The summed revenue across the range.
    pub total_revenue: f64,
}

/// Sums the daily summaries into headline totals.
pub(super) fn calculate_range_totals(daily_summaries: &[DailyOrderSummary]) -> RangeTotals {
    RangeTotals {
        total_orders: daily_summaries
            .iter()
            .map(|summary| summary.order_count)
            .sum(),
        total_revenue: daily_summaries.iter().map(|summary| summary.revenue).sum(),
    }
}

/// Renders the metric cards for total orders and total revenue.
pub(super) fn metric_cards_view(totals: &RangeTotals) -> Markup {
    html! {
        section class="w-full mx-auto mb-4" {
            div class="grid grid-cols-1 sm:grid-cols-2 gap-4" {
                (metric_card("Total Orders", &totals.total_orders.to_string()))
                (metric_card("Total Revenue", &format_currency(totals.total_revenue)))
            }
        }
    }
}

fn metric_card(label: &str, value: &str) -> Markup {
    html! {
        div
            class="bg-white dark:bg-gray-800 border border-gray-200
                dark:border-gray-700 rounded-lg p-4 shadow-md"
        {
            div class="text-sm text-gray-600 dark:text-gray-400 mb-1" { (label) }
            div class="text-3xl font-bold" { (value) }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{RangeTotals, calculate_range_totals, metric_cards_view};
    use crate::dashboard::aggregation::DailyOrderSummary;

    #[test]
    fn totals_sum_orders_and_revenue_across_days() {
        let daily_summaries = vec![
            DailyOrderSummary {
                day: date!(2023 - 01 - 01),
                order_count: 2,
                revenue: 30.0,
            },
            DailyOrderSummary {
                day: date!(2023 - 01 - 02),
                order_count: 1,
                revenue: 12.5,
            },
        ];

        let totals = calculate_range_totals(&daily_summaries);

        assert_eq!(
            totals,
            RangeTotals {
                total_orders: 3,
                total_revenue: 42.5,
            }
        );
    }

    #[test]
    fn totals_are_zero_for_an_empty_range() {
        let totals = calculate_range_totals(&[]);

        assert_eq!(totals.total_orders, 0);
        assert_eq!(totals.total_revenue, 0.0);
    }

    #[test]
    fn cards_show_the_formatted_totals() {
        let totals = RangeTotals {
            total_orders: 3,
            total_revenue: 42.5,
        };

        let html = metric_cards_view(&totals).into_string();

        assert!(html.contains("Total Orders"));
        assert!(html.contains(">3<"));
        assert!(html.contains("Total Revenue"));
        assert!(html.contains("R$42.50"));
    }
}
