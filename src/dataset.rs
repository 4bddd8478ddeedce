//! Loading and filtering of the order history dataset.
//!
//! The dataset is a pre-cleaned CSV export with one row per order line item,
//! where each row carries its order, customer and payment context already
//! joined upstream. The file is read once at startup, validated for column
//! shape, and kept in memory unchanged for the lifetime of the process.

use std::{fs::File, io::Read, ops::RangeInclusive, path::Path};

use csv::StringRecord;
use time::{
    Date, PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::Error;

const ORDER_ID_COLUMN: &str = "order_id";
const CUSTOMER_ID_COLUMN: &str = "customer_id";
const APPROVED_AT_COLUMN: &str = "order_approved_at";
const DELIVERED_AT_COLUMN: &str = "order_delivered_customer_date";
const PRICE_COLUMN: &str = "price";
const CATEGORY_COLUMN: &str = "product_category_name_english";
const CITY_COLUMN: &str = "customer_city";
const STATE_COLUMN: &str = "customer_state";
const PAYMENT_TYPE_COLUMN: &str = "payment_type";

const TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// One row of the order export: a single order line item.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The identifier of the order this line item belongs to.
    pub order_id: String,
    /// The identifier of the customer who placed the order.
    pub customer_id: String,
    /// When the order was approved.
    ///
    /// `None` if the export had no parseable value, in which case the row is
    /// invisible to date filtering and the daily summary.
    pub approved_at: Option<PrimitiveDateTime>,
    /// When the order was delivered to the customer, if it has been.
    pub delivered_at: Option<PrimitiveDateTime>,
    /// The price of this line item.
    pub price: f64,
    /// The product category, using the English names from the export.
    pub product_category: String,
    /// The city of the customer's address.
    pub customer_city: String,
    /// The two-letter state code of the customer's address.
    pub customer_state: String,
    /// How the order was paid for, e.g. "credit_card" or "boleto".
    pub payment_type: String,
}

/// The position of each required column in the CSV header.
///
/// Resolved once per load so that a malformed file fails up front with the
/// name of the missing column, rather than on some arbitrary row.
struct ColumnIndices {
    order_id: usize,
    customer_id: usize,
    approved_at: usize,
    delivered_at: usize,
    price: usize,
    category: usize,
    city: usize,
    state: usize,
    payment_type: usize,
}

impl ColumnIndices {
    fn resolve(headers: &StringRecord) -> Result<Self, Error> {
        Ok(Self {
            order_id: column_index(headers, ORDER_ID_COLUMN)?,
            customer_id: column_index(headers, CUSTOMER_ID_COLUMN)?,
            approved_at: column_index(headers, APPROVED_AT_COLUMN)?,
            delivered_at: column_index(headers, DELIVERED_AT_COLUMN)?,
            price: column_index(headers, PRICE_COLUMN)?,
            category: column_index(headers, CATEGORY_COLUMN)?,
            city: column_index(headers, CITY_COLUMN)?,
            state: column_index(headers, STATE_COLUMN)?,
            payment_type: column_index(headers, PAYMENT_TYPE_COLUMN)?,
        })
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, Error> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| Error::MissingColumn(name.to_owned()))
}

/// Load the order history from the CSV file at `path`.
///
/// Rows are returned sorted by approval time ascending.
///
/// # Errors
/// Returns [Error::InvalidCsv] if the file cannot be opened or a row cannot
/// be parsed, and [Error::MissingColumn] if the header is missing a required
/// column.
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>, Error> {
    let file = File::open(path).map_err(|error| {
        Error::InvalidCsv(format!("could not open {}: {error}", path.display()))
    })?;

    read_transactions(file)
}

/// Read the order history CSV from `reader`.
///
/// The header row is validated against the expected column names before any
/// row is parsed. Rows with an empty or malformed approval timestamp are
/// kept, but with the timestamp absent; they are counted and reported with a
/// single warning since they cannot take part in date filtering.
///
/// Rows are returned sorted by approval time ascending.
///
/// # Errors
/// Returns [Error::MissingColumn] if the header is missing a required column
/// and [Error::InvalidCsv] if a row cannot be read or its price cannot be
/// parsed.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>, Error> {
    let mut reader = csv::Reader::from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCsv(format!("could not read the header row: {error}")))?
        .clone();
    let columns = ColumnIndices::resolve(&headers)?;

    let mut transactions = Vec::new();
    let mut missing_approval_times = 0;

    for (row_number, record) in reader.records().enumerate() {
        // Line 1 is the header, so data rows start at line 2.
        let line_number = row_number + 2;
        let record = record
            .map_err(|error| Error::InvalidCsv(format!("line {line_number}: {error}")))?;

        let transaction = parse_record(&record, &columns, line_number)?;

        if transaction.approved_at.is_none() {
            missing_approval_times += 1;
        }

        transactions.push(transaction);
    }

    if missing_approval_times > 0 {
        tracing::warn!(
            "{missing_approval_times} rows have a missing or malformed approval timestamp \
            and will be excluded from date filtering"
        );
    }

    // Rows without an approval time sort first; the date filter never selects them.
    transactions.sort_by_key(|transaction| transaction.approved_at);

    Ok(transactions)
}

fn parse_record(
    record: &StringRecord,
    columns: &ColumnIndices,
    line_number: usize,
) -> Result<Transaction, Error> {
    let field = |index: usize| record.get(index).unwrap_or_default();

    let price: f64 = field(columns.price).parse().map_err(|error| {
        Error::InvalidCsv(format!(
            "could not parse '{}' as a price on line {line_number}: {error}",
            field(columns.price)
        ))
    })?;

    Ok(Transaction {
        order_id: field(columns.order_id).to_owned(),
        customer_id: field(columns.customer_id).to_owned(),
        approved_at: parse_timestamp(field(columns.approved_at)),
        delivered_at: parse_timestamp(field(columns.delivered_at)),
        price,
        product_category: field(columns.category).to_owned(),
        customer_city: field(columns.city).to_owned(),
        customer_state: field(columns.state).to_owned(),
        payment_type: field(columns.payment_type).to_owned(),
    })
}

/// Parses a `YYYY-MM-DD HH:MM:SS` timestamp, treating empty or malformed
/// values as absent.
fn parse_timestamp(value: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(value, &TIMESTAMP_FORMAT).ok()
}

/// The earliest and latest approval dates in `transactions`, used as the
/// default date-range filter.
///
/// # Returns
/// `None` if no row has an approval timestamp.
pub(crate) fn date_bounds(transactions: &[Transaction]) -> Option<RangeInclusive<Date>> {
    let mut dates = transactions
        .iter()
        .filter_map(|transaction| transaction.approved_at)
        .map(|approved_at| approved_at.date());

    let first = dates.next()?;
    let (min, max) = dates.fold((first, first), |(min, max), date| {
        (min.min(date), max.max(date))
    });

    Some(min..=max)
}

/// Selects the transactions whose approval date falls within the inclusive
/// `date_range`. Rows without an approval timestamp are never selected.
pub(crate) fn transactions_in_date_range<'a>(
    transactions: &'a [Transaction],
    date_range: &RangeInclusive<Date>,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|transaction| {
            transaction
                .approved_at
                .is_some_and(|approved_at| date_range.contains(&approved_at.date()))
        })
        .collect()
}
