//! Prompt text for statement field extraction.
//!
//! Kept in one place so prompt changes are reviewed as data and unit tests
//! can inspect the exact wording without a model.

/// Keys the model is asked to return, in prompt order.
pub const FIELD_KEYS: [&str; 5] = [
    "issuer",
    "account_last_4",
    "statement_date",
    "due_date",
    "total_balance",
];

/// Instruction block placed before the statement text.
pub const EXTRACTION_INSTRUCTIONS: &str = r#"You are a strict data extraction engine. Read the credit card statement text below and extract 5 facts.

INSTRUCTIONS:
1. Find the issuer (the bank or card provider) near the top of the document.
2. Find the account number.
3. Find the statement date.
4. Find the payment due date.
5. Find the total balance.

RETURN ONLY JSON with exactly these keys:
- "issuer": the name of the bank or provider exactly as written in the text.
- "account_last_4": the last 4 digits of the account number.
- "statement_date": date in YYYY-MM-DD.
- "due_date": date in YYYY-MM-DD, or null if there is none.
- "total_balance": numeric value only (e.g. 1234.50).

TEXT TO ANALYZE:
"#;

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Full prompt for `text`, truncated to `max_chars` characters.
pub fn extraction_prompt(text: &str, max_chars: usize) -> String {
    let body = truncate_chars(text, max_chars);
    let mut prompt = String::with_capacity(EXTRACTION_INSTRUCTIONS.len() + body.len() + 1);
    prompt.push_str(EXTRACTION_INSTRUCTIONS);
    prompt.push_str(body);
    prompt.push('\n');
    prompt
}
