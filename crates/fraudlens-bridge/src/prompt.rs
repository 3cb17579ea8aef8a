//! The fixed instruction sent with every question.
//!
//! The schema description must stay in lockstep with the DDL in
//! `fraudlens-store-sqlite`; the worked example doubles as a test
//! fixture for the whole ask path.

/// System message: the four tables, their columns, and worked examples.
pub const SYSTEM_PROMPT: &str = "\
You are a SQL expert with access to a database containing the following tables:
- fraud_data (columns: transaction_id, trans_date_trans_time, amt, trans_num, is_fraud, merchant_id, location_id, user_id)
- merchants (columns: merchant_id, merchant_name, category)
- locations (columns: location_id, city, state, lat, long, city_pop)
- users (columns: user_id, job, dob)
Generate accurate SQL queries using the exact column names provided.
Handle various types of queries such as:
1. Counting rows in a table.
2. Summing values under certain conditions.
3. Finding averages grouped by a column.
4. Performing joins between tables based on foreign keys.
Always select the most relevant columns for the query requested.
Example: \"Count the number of fraud transactions\" should translate to \
\"SELECT COUNT(*) FROM fraud_data WHERE is_fraud = TRUE;\"";

/// User message wrapping the verbatim question.
pub fn user_prompt(question: &str) -> String {
  format!(
    "Generate an SQL query for the following request: {question}. \
     Provide only the SQL query."
  )
}
