use std::collections::HashMap;

use lazy_static::lazy_static;

lazy_static! {
    /// Binding priority of each binary operator. Higher binds tighter.
    pub static ref OPERATOR_PRIORITY: HashMap<&'static str, u32> = {
        let mut map = HashMap::new();
        map.insert("*", 30);
        map.insert("/", 40);
        map.insert("-", 20);
        map.insert("+", 10);
        map.insert("==", 9);
        map.insert("!=", 8);
        map.insert("|", 6);
        map
    };
}

/// Priority of an operator; anything not in the table (e.g. `.`) is 0.
pub fn operator_priority(operator: &str) -> u32 {
    OPERATOR_PRIORITY.get(operator).copied().unwrap_or(0)
}
