pub mod conv;
pub mod crypto;
pub mod page;
pub mod validator;

use std::collections::HashMap;

use serde_json::Value;

/// Loosely typed filter/pagination input, as it arrives from a query string or JSON body.
pub type Params = HashMap<String, Value>;

/// Non-empty string value of `key`, if any.
pub fn param_str(params: &Params, key: &str) -> Option<String> {
    params
        .get(key)
        .map(conv::to_str)
        .filter(|s| !s.is_empty())
}
