//! API response fixtures

use serde_json::{Value, json};

/// Catalogue body listing the given instrument names
pub fn catalogue_body(names: &[&str]) -> Value {
    let result: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({
                "instrument_name": name,
                "kind": "option",
                "base_currency": "BTC",
                "is_active": false
            })
        })
        .collect();
    json!({ "jsonrpc": "2.0", "result": result, "usIn": 0, "usOut": 0 })
}

/// Order book body for one instrument, fields in API order
pub fn order_book_body(name: &str, mark_price: f64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": {
            "instrument_name": name,
            "state": "closed",
            "mark_price": mark_price,
            "bids": [],
            "asks": [],
            "open_interest": 0
        }
    })
}

/// Header line matching [`order_book_body`]
pub const ORDER_BOOK_HEADER: &str = "instrument_name,state,mark_price,bids,asks,open_interest";

/// Order book body with an empty result
pub fn empty_order_book_body() -> Value {
    json!({ "jsonrpc": "2.0", "result": {} })
}
