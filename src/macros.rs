/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Object keys must be string literals. Negative numbers need parentheses,
/// e.g. `flow!({ "delta": (-1) })`.
///
/// ```rust
/// use flowdoc::{flow, Value};
///
/// let value = flow!({
///     "name": "Alice",
///     "tags": ["rust", "flow"],
///     "limits": { "max": 10 }
/// });
/// assert_eq!(value.get("name"), Some(&Value::from("Alice")));
/// ```
#[macro_export]
macro_rules! flow {
    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::flow!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::FlowMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::FlowMap::new();
        $(
            object.insert($key.to_string(), $crate::flow!($value));
        )*
        $crate::Value::Object(object)
    }};

    // Numbers, strings and parenthesized expressions
    ($s:expr) => {
        $crate::Value::from($s)
    };
}
