//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for displaying the dashboard and applying date filters
//! - HTML view functions for rendering the dashboard UI
//! - State and form types used by the handlers

use std::{ops::RangeInclusive, sync::Arc};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRequest;
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState,
    alert::error_alert,
    dashboard::{
        aggregation::daily_order_summaries,
        cards::{calculate_range_totals, metric_cards_view},
        charts::{
            DashboardChart, best_categories_chart, charts_partial_script, charts_script,
            customers_by_city_chart, customers_by_state_chart, daily_orders_chart,
            payment_type_chart, worst_categories_chart,
        },
    },
    dataset::{Transaction, date_bounds, transactions_in_date_range},
    endpoints,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, base},
};

/// The format used by HTML date inputs.
const DATE_INPUT_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The full order history, sorted by approval time.
    pub transactions: Arc<Vec<Transaction>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transactions: state.transactions.clone(),
        }
    }
}

/// Form data for updating the dashboard date range.
#[derive(Deserialize)]
pub struct DateRangeForm {
    /// The first approval date to include, as `YYYY-MM-DD`.
    pub start_date: String,
    /// The last approval date to include, as `YYYY-MM-DD`.
    pub end_date: String,
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    /// The min/max approval dates of the loaded data, shown as input limits.
    bounds: RangeInclusive<Date>,
    /// The date range the summaries were computed for.
    selected: RangeInclusive<Date>,
    cards: Markup,
    charts: [DashboardChart; 6],
}

/// Display the reporting page for the full range of the loaded data.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Response {
    let Some(bounds) = date_bounds(&state.transactions) else {
        return dashboard_no_data_view().into_response();
    };

    let data = build_dashboard_data(&state.transactions, bounds.clone(), bounds);

    dashboard_view(&data).into_response()
}

/// Recompute the dashboard for a user-selected date range.
///
/// Returns the dashboard content as a partial for HTMX requests and as a
/// full page otherwise. Malformed or reversed date ranges get an error alert
/// instead; a well-formed range that excludes all data renders an empty
/// dashboard.
pub async fn update_date_range(
    HxRequest(is_htmx): HxRequest,
    State(state): State<DashboardState>,
    Form(form): Form<DateRangeForm>,
) -> Response {
    let Some(bounds) = date_bounds(&state.transactions) else {
        return dashboard_no_data_view().into_response();
    };

    let selected = match parse_date_range(&form) {
        Ok(selected) => selected,
        Err(response) => return response,
    };

    let data = build_dashboard_data(&state.transactions, bounds, selected);

    if is_htmx {
        dashboard_content_partial(&data).into_response()
    } else {
        dashboard_view(&data).into_response()
    }
}

/// Parses the form's date fields into an inclusive range.
///
/// # Errors
/// Returns a ready-to-send alert response if a date cannot be parsed or the
/// start date is after the end date.
fn parse_date_range(form: &DateRangeForm) -> Result<RangeInclusive<Date>, Response> {
    let parse = |value: &str| {
        Date::parse(value, &DATE_INPUT_FORMAT).map_err(|error| {
            tracing::debug!("Could not parse '{value}' as a date: {error}");
            (
                StatusCode::BAD_REQUEST,
                error_alert("Invalid date", &format!("'{value}' is not a valid date.")),
            )
                .into_response()
        })
    };

    let start_date = parse(&form.start_date)?;
    let end_date = parse(&form.end_date)?;

    if start_date > end_date {
        return Err((
            StatusCode::BAD_REQUEST,
            error_alert(
                "Invalid date range",
                "The start date must not be after the end date.",
            ),
        )
            .into_response());
    }

    Ok(start_date..=end_date)
}

/// Filters the transactions to `selected` and builds all the data needed to
/// render the dashboard.
fn build_dashboard_data(
    transactions: &[Transaction],
    bounds: RangeInclusive<Date>,
    selected: RangeInclusive<Date>,
) -> DashboardData {
    let filtered = transactions_in_date_range(transactions, &selected);

    let daily_summaries = daily_order_summaries(&filtered);
    let totals = calculate_range_totals(&daily_summaries);

    DashboardData {
        bounds,
        selected,
        cards: metric_cards_view(&totals),
        charts: build_dashboard_charts(&filtered),
    }
}

/// Creates the array of dashboard charts from the filtered transactions.
///
/// The chart options are serialized to JSON for ECharts consumption.
fn build_dashboard_charts(transactions: &[&Transaction]) -> [DashboardChart; 6] {
    [
        DashboardChart {
            id: "daily-orders-chart",
            options: daily_orders_chart(transactions).to_string(),
        },
        DashboardChart {
            id: "best-categories-chart",
            options: best_categories_chart(transactions).to_string(),
        },
        DashboardChart {
            id: "worst-categories-chart",
            options: worst_categories_chart(transactions).to_string(),
        },
        DashboardChart {
            id: "customers-by-city-chart",
            options: customers_by_city_chart(transactions).to_string(),
        },
        DashboardChart {
            id: "payment-type-chart",
            options: payment_type_chart(transactions).to_string(),
        },
        DashboardChart {
            id: "customers-by-state-chart",
            options: customers_by_state_chart(transactions).to_string(),
        },
    ]
}

/// Renders the dashboard page when no transaction data was loaded.
fn dashboard_no_data_view() -> Markup {
    let content = html!(
        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Charts will show up here once the order export contains some
                transactions."
            }
        }
    );

    base("Dashboard", &[], &content)
}

/// Renders the main dashboard page with the filter form, metric cards and
/// charts.
fn dashboard_view(data: &DashboardData) -> Markup {
    let content = html!(
        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (dashboard_content(data, false))
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(&data.charts),
    ];

    base("Dashboard", &scripts, &content)
}

/// Renders the updated dashboard content for HTMX updates.
///
/// This is used when the date range is changed to update the dashboard
/// without requiring a full page reload. The chart initialization script is
/// inlined since the head scripts only run on full page loads.
fn dashboard_content_partial(data: &DashboardData) -> Markup {
    dashboard_content(data, true)
}

fn dashboard_content(data: &DashboardData, include_script: bool) -> Markup {
    html!(
        h1 class="text-2xl font-bold mt-4 mb-4" { "E-Commerce Dashboard" }

        (date_range_form(&data.bounds, &data.selected))

        (data.cards)

        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in &data.charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }

        @if include_script {
            (charts_partial_script(&data.charts))
        }
    )
}

/// Renders the date-range filter form.
///
/// Changing either input posts the form and swaps the recomputed dashboard
/// content in place.
fn date_range_form(bounds: &RangeInclusive<Date>, selected: &RangeInclusive<Date>) -> Markup {
    html!(
        form
            hx-post=(endpoints::DASHBOARD_DATE_RANGE)
            hx-target="#dashboard-content"
            hx-target-error="#alert-container"
            hx-swap="innerHTML"
            hx-trigger="change"
            class="w-full mb-4 flex flex-wrap items-end gap-4 bg-gray-50
                dark:bg-gray-800 p-4 rounded-lg"
        {
            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }

                input
                    type="date"
                    name="start_date"
                    id="start_date"
                    value=(format_date_input(selected.start()))
                    min=(format_date_input(bounds.start()))
                    max=(format_date_input(bounds.end()))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }

                input
                    type="date"
                    name="end_date"
                    id="end_date"
                    value=(format_date_input(selected.end()))
                    min=(format_date_input(bounds.start()))
                    max=(format_date_input(bounds.end()))
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    )
}

fn format_date_input(date: &Date) -> String {
    date.format(&DATE_INPUT_FORMAT).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use axum_extra::extract::Form;
    use axum_htmx::HxRequest;
    use scraper::{Html, Selector};
    use time::macros::datetime;

    use super::{DashboardState, DateRangeForm, get_dashboard_page, update_date_range};
    use crate::dataset::Transaction;

    const CHART_IDS: [&str; 6] = [
        "daily-orders-chart",
        "best-categories-chart",
        "worst-categories-chart",
        "customers-by-city-chart",
        "payment-type-chart",
        "customers-by-state-chart",
    ];

    fn create_test_transaction(
        order_id: &str,
        customer_id: &str,
        approved_at: time::PrimitiveDateTime,
    ) -> Transaction {
        Transaction {
            order_id: order_id.to_owned(),
            customer_id: customer_id.to_owned(),
            approved_at: Some(approved_at),
            delivered_at: None,
            price: 25.0,
            product_category: "toys".to_owned(),
            customer_city: "sao paulo".to_owned(),
            customer_state: "SP".to_owned(),
            payment_type: "credit_card".to_owned(),
        }
    }

    fn create_test_state(transactions: Vec<Transaction>) -> DashboardState {
        DashboardState {
            transactions: Arc::new(transactions),
        }
    }

    fn date_range_form(start_date: &str, end_date: &str) -> Form<DateRangeForm> {
        Form(DateRangeForm {
            start_date: start_date.to_owned(),
            end_date: end_date.to_owned(),
        })
    }

    async fn response_text(response: Response<Body>) -> String {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

        String::from_utf8_lossy(&body).to_string()
    }

    async fn parse_html(response: Response<Body>) -> Html {
        Html::parse_document(&response_text(response).await)
    }

    #[track_caller]
    fn assert_valid_html(html: &Html) {
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );
    }

    #[track_caller]
    fn assert_chart_exists(html: &Html, chart_id: &str) {
        let selector = Selector::parse(&format!("#{}", chart_id)).unwrap();
        assert!(
            html.select(&selector).next().is_some(),
            "Chart with id '{}' not found",
            chart_id
        );
    }

    #[track_caller]
    fn assert_date_input_value(html: &Html, name: &str, expected: &str) {
        let selector = Selector::parse(&format!("input[name='{name}']")).unwrap();
        let input = html
            .select(&selector)
            .next()
            .unwrap_or_else(|| panic!("No input named '{name}'"));
        assert_eq!(input.value().attr("value"), Some(expected));
    }

    #[tokio::test]
    async fn dashboard_page_loads_successfully() {
        let state = create_test_state(vec![
            create_test_transaction("o1", "c1", datetime!(2023-01-01 10:00:00)),
            create_test_transaction("o2", "c2", datetime!(2023-01-15 14:30:00)),
        ]);

        let response = get_dashboard_page(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert_valid_html(&html);

        for chart_id in CHART_IDS {
            assert_chart_exists(&html, chart_id);
        }

        // The filter defaults to the full range of the loaded data.
        assert_date_input_value(&html, "start_date", "2023-01-01");
        assert_date_input_value(&html, "end_date", "2023-01-15");
    }

    #[tokio::test]
    async fn displays_prompt_text_on_no_data() {
        let state = create_test_state(Vec::new());

        let response = get_dashboard_page(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;
        assert!(html.html().contains("Nothing here yet"));
    }

    #[tokio::test]
    async fn update_returns_partial_for_htmx_request() {
        let state = create_test_state(vec![create_test_transaction(
            "o1",
            "c1",
            datetime!(2023-01-05 10:00:00),
        )]);

        let response = update_date_range(
            HxRequest(true),
            State(state),
            date_range_form("2023-01-01", "2023-01-31"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let text = response_text(response).await;
        // A partial must not nest a second full page inside the content div.
        assert!(!text.contains("<head>"));

        let html = Html::parse_document(&text);
        for chart_id in CHART_IDS {
            assert_chart_exists(&html, chart_id);
        }
    }

    #[tokio::test]
    async fn update_returns_full_page_without_htmx() {
        let state = create_test_state(vec![create_test_transaction(
            "o1",
            "c1",
            datetime!(2023-01-05 10:00:00),
        )]);

        let response = update_date_range(
            HxRequest(false),
            State(state),
            date_range_form("2023-01-01", "2023-01-31"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let text = response_text(response).await;
        assert!(text.contains("<head>"));
        assert_valid_html(&Html::parse_document(&text));
    }

    #[tokio::test]
    async fn update_rejects_a_malformed_date() {
        let state = create_test_state(vec![create_test_transaction(
            "o1",
            "c1",
            datetime!(2023-01-05 10:00:00),
        )]);

        let response = update_date_range(
            HxRequest(true),
            State(state),
            date_range_form("not-a-date", "2023-01-31"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html(response).await;
        assert!(html.html().contains("not a valid date"));
    }

    #[tokio::test]
    async fn update_rejects_a_reversed_range() {
        let state = create_test_state(vec![create_test_transaction(
            "o1",
            "c1",
            datetime!(2023-01-05 10:00:00),
        )]);

        let response = update_date_range(
            HxRequest(true),
            State(state),
            date_range_form("2023-02-01", "2023-01-01"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html(response).await;
        assert!(html.html().contains("start date must not be after"));
    }

    #[tokio::test]
    async fn range_excluding_all_data_renders_an_empty_dashboard() {
        let state = create_test_state(vec![create_test_transaction(
            "o1",
            "c1",
            datetime!(2023-06-05 10:00:00),
        )]);

        // The whole range precedes the data, so every summary is empty.
        let response = update_date_range(
            HxRequest(true),
            State(state),
            date_range_form("2023-01-01", "2023-01-31"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;

        for chart_id in CHART_IDS {
            assert_chart_exists(&html, chart_id);
        }

        let value_selector = Selector::parse("div.text-3xl").unwrap();
        let card_values: Vec<String> = html
            .select(&value_selector)
            .map(|card| card.text().collect::<String>())
            .collect();
        assert_eq!(card_values, vec!["0".to_owned(), "R$0.00".to_owned()]);
    }

    #[test]
    fn date_range_form_decodes_html_form_data() {
        let form_data = "start_date=2023-01-01&end_date=2023-02-01";
        let form: DateRangeForm = serde_html_form::from_str(form_data).unwrap();

        assert_eq!(form.start_date, "2023-01-01");
        assert_eq!(form.end_date, "2023-02-01");
    }
}
