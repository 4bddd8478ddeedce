//! Transaction data aggregation for the dashboard's charts and metrics.
//!
//! Provides functions that reduce a filtered slice of the order history to
//! the small summary tables the charts are drawn from: daily order counts
//! and revenue, and distinct customer counts per product category, city,
//! payment type and state.
//!
//! All of the functions here are pure: the same input always produces the
//! same output, and nothing is cached between calls.

use std::collections::{BTreeMap, HashMap, HashSet};

use time::Date;

use crate::dataset::Transaction;

/// One day's order activity.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct DailyOrderSummary {
    /// The calendar day the orders were approved on.
    pub day: Date,
    /// The number of distinct orders approved that day.
    pub order_count: usize,
    /// The summed price of the line items approved that day.
    pub revenue: f64,
}

/// The number of distinct customers that bought within one group, e.g. one
/// product category or one city.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CustomerCountSummary {
    /// The value of the grouping column, e.g. "toys" or "sao paulo".
    pub group: String,
    /// The number of distinct customer ids seen in the group.
    pub customer_count: usize,
}

/// Aggregates transactions into per-day order counts and revenue.
///
/// Orders are counted once per day no matter how many line items they have,
/// while revenue is the plain sum of line item prices. Rows without an
/// approval timestamp cannot be assigned to a day and are skipped.
///
/// # Returns
/// One summary per day with at least one approved order, ordered by day
/// ascending.
pub(super) fn daily_order_summaries(transactions: &[&Transaction]) -> Vec<DailyOrderSummary> {
    let mut days: BTreeMap<Date, (HashSet<&str>, f64)> = BTreeMap::new();

    for &transaction in transactions {
        let Some(approved_at) = transaction.approved_at else {
            continue;
        };

        let (order_ids, revenue) = days.entry(approved_at.date()).or_default();
        order_ids.insert(transaction.order_id.as_str());
        *revenue += transaction.price;
    }

    days.into_iter()
        .map(|(day, (order_ids, revenue))| DailyOrderSummary {
            day,
            order_count: order_ids.len(),
            revenue,
        })
        .collect()
}

/// Counts distinct customers per product category.
pub(super) fn customers_by_category(transactions: &[&Transaction]) -> Vec<CustomerCountSummary> {
    count_distinct_customers(transactions, |transaction| &transaction.product_category)
}

/// Counts distinct customers per city.
pub(super) fn customers_by_city(transactions: &[&Transaction]) -> Vec<CustomerCountSummary> {
    count_distinct_customers(transactions, |transaction| &transaction.customer_city)
}

/// Counts distinct customers per payment type.
pub(super) fn customers_by_payment_type(
    transactions: &[&Transaction],
) -> Vec<CustomerCountSummary> {
    count_distinct_customers(transactions, |transaction| &transaction.payment_type)
}

/// Counts distinct customers per state.
pub(super) fn customers_by_state(transactions: &[&Transaction]) -> Vec<CustomerCountSummary> {
    count_distinct_customers(transactions, |transaction| &transaction.customer_state)
}

/// Partitions transactions by `group_key` and counts the distinct customer
/// ids within each partition.
///
/// # Returns
/// One summary per distinct key, in the order the keys first appear.
fn count_distinct_customers<'a>(
    transactions: &[&'a Transaction],
    group_key: impl Fn(&'a Transaction) -> &'a str,
) -> Vec<CustomerCountSummary> {
    let mut customers_by_group: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut group_order: Vec<&str> = Vec::new();

    for &transaction in transactions {
        let group = group_key(transaction);
        customers_by_group
            .entry(group)
            .or_insert_with(|| {
                group_order.push(group);
                HashSet::new()
            })
            .insert(transaction.customer_id.as_str());
    }

    group_order
        .into_iter()
        .map(|group| CustomerCountSummary {
            group: group.to_owned(),
            customer_count: customers_by_group[group].len(),
        })
        .collect()
}

/// Selects the `n` groups with the most customers, most first.
///
/// Ties keep their original relative order.
pub(super) fn top_customer_counts(
    summaries: &[CustomerCountSummary],
    n: usize,
) -> Vec<CustomerCountSummary> {
    let mut sorted = summaries.to_vec();
    sorted.sort_by(|a, b| b.customer_count.cmp(&a.customer_count));
    sorted.truncate(n);
    sorted
}

/// Selects the `n` groups with the fewest customers, fewest first.
///
/// Ties keep their original relative order.
pub(super) fn bottom_customer_counts(
    summaries: &[CustomerCountSummary],
    n: usize,
) -> Vec<CustomerCountSummary> {
    let mut sorted = summaries.to_vec();
    sorted.sort_by(|a, b| a.customer_count.cmp(&b.customer_count));
    sorted.truncate(n);
    sorted
}
