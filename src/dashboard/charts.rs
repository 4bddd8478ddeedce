//! Chart generation and rendering for the dashboard.
//!
//! This module creates the ECharts visualizations for the selected date
//! range:
//! - **Daily Orders**: order volume per day as a line chart
//! - **Product Categories**: best and worst sellers by distinct customers
//! - **Customer Demographics**: customers by city, payment type and state
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization
//! code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisPointer, AxisPointerType, AxisType, Tooltip, Trigger},
    series::{Bar, Line, Pie},
};
use maud::{Markup, PreEscaped, html};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::{
    dashboard::aggregation::{
        CustomerCountSummary, bottom_customer_counts, customers_by_category, customers_by_city,
        customers_by_payment_type, customers_by_state, daily_order_summaries, top_customer_counts,
    },
    dataset::Transaction,
    html::HeadElement,
};

const TOP_CATEGORY_COUNT: usize = 5;
const TOP_CITY_COUNT: usize = 10;
const TOP_STATE_COUNT: usize = 10;

const DAY_LABEL_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Generates JavaScript initialization code for dashboard charts, wrapped so
/// that it runs once the page has loaded.
///
/// # Returns
/// HeadElement containing the initialization JavaScript.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        chart_init_statements(charts)
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// Generates the inline script that re-initializes charts after an HTMX swap
/// replaces the dashboard content.
pub(super) fn charts_partial_script(charts: &[DashboardChart]) -> Markup {
    html!(
        script { (PreEscaped(chart_init_statements(charts))) }
    )
}

fn chart_init_statements(charts: &[DashboardChart]) -> String {
    charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const existing = echarts.getInstanceByDom(chartDom);
                    if (existing) {{
                        existing.dispose();
                    }}
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn daily_orders_chart(transactions: &[&Transaction]) -> Chart {
    let summaries = daily_order_summaries(transactions);
    let labels: Vec<String> = summaries
        .iter()
        .map(|summary| summary.day.format(&DAY_LABEL_FORMAT).unwrap_or_default())
        .collect();
    let values: Vec<f64> = summaries
        .iter()
        .map(|summary| summary.order_count as f64)
        .collect();

    Chart::new()
        .title(Title::new().text("Daily Orders").subtext("Orders approved per day"))
        .tooltip(count_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(Line::new().name("Orders").data(values))
}

pub(super) fn best_categories_chart(transactions: &[&Transaction]) -> Chart {
    let summaries = customers_by_category(transactions);

    horizontal_bar_chart(
        "Best Performing Categories",
        "Top 5 by distinct customers",
        top_customer_counts(&summaries, TOP_CATEGORY_COUNT),
    )
}

pub(super) fn worst_categories_chart(transactions: &[&Transaction]) -> Chart {
    let summaries = customers_by_category(transactions);

    horizontal_bar_chart(
        "Worst Performing Categories",
        "Bottom 5 by distinct customers",
        bottom_customer_counts(&summaries, TOP_CATEGORY_COUNT),
    )
}

pub(super) fn customers_by_city_chart(transactions: &[&Transaction]) -> Chart {
    let summaries = customers_by_city(transactions);

    horizontal_bar_chart(
        "Customers by City",
        "Top 10 cities",
        top_customer_counts(&summaries, TOP_CITY_COUNT),
    )
}

pub(super) fn customers_by_state_chart(transactions: &[&Transaction]) -> Chart {
    let summaries = customers_by_state(transactions);

    horizontal_bar_chart(
        "Customers by State",
        "Top 10 states",
        top_customer_counts(&summaries, TOP_STATE_COUNT),
    )
}

pub(super) fn payment_type_chart(transactions: &[&Transaction]) -> Chart {
    let summaries = customers_by_payment_type(transactions);
    let data: Vec<(f64, &str)> = summaries
        .iter()
        .map(|summary| (summary.customer_count as f64, summary.group.as_str()))
        .collect();

    Chart::new()
        .title(Title::new().text("Customers by Payment Type"))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().left("left"))
        .series(Pie::new().name("Customers").radius("55%").data(data))
}

/// Renders customer counts as a horizontal bar chart.
///
/// ECharts draws the first category at the bottom of the axis, so the
/// summaries are reversed to put the first group at the top.
fn horizontal_bar_chart(
    title: &str,
    subtitle: &str,
    summaries: Vec<CustomerCountSummary>,
) -> Chart {
    let labels: Vec<String> = summaries
        .iter()
        .rev()
        .map(|summary| summary.group.clone())
        .collect();
    let values: Vec<f64> = summaries
        .iter()
        .rev()
        .map(|summary| summary.customer_count as f64)
        .collect();

    Chart::new()
        .title(Title::new().text(title).subtext(subtitle))
        .tooltip(count_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Value))
        .y_axis(Axis::new().type_(AxisType::Category).data(labels))
        .series(Bar::new().name("Customers").data(values))
}

/// Creates a tooltip configuration for count values.
fn count_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
