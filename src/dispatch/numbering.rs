//! Human-facing order numbers: `<PREFIX><YEAR><SEQ>`.
//!
//! The prefix is the first three characters of the company name, uppercased;
//! the sequence restarts each calendar year per company. Formatting is pure;
//! picking a free sequence number is the data layer's problem (the count-
//! then-insert step races, so `Db::create_order` retries on the unique
//! `(company_id, order_number)` index).

/// Format an order number for the given company name, year, and sequence.
///
/// "Acme", 2024, seq 4 → `"ACM20240004"`.
pub fn format_order_number(company_name: &str, year: i32, seq: u32) -> String {
    let prefix: String = company_name
        .chars()
        .take(3)
        .flat_map(char::to_uppercase)
        .collect();
    format!("{prefix}{year}{seq:04}")
}

/// Next number after `existing_count` orders already created this year.
pub fn next_order_number(company_name: &str, year: i32, existing_count: u32) -> String {
    format_order_number(company_name, year, existing_count + 1)
}
