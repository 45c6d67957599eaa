/// Builds a [`ValueMap`](crate::ValueMap) of cells, in the order written.
///
/// Keys are string literals. Values are `null`, a bracketed list of elements (each a
/// single token tree: a literal, `null`, or a parenthesised expression), or any expression
/// convertible into a [`Value`](crate::Value).
///
/// # Examples
///
/// ```rust
/// use serde_dataset::{row, Value};
///
/// let cells = row! {
///     "IdTest" => 2,
///     "Name" => "X",
///     "Note" => null,
///     "Tags" => ["a", "b"],
///     "Price" => (-1.5),
/// };
/// assert_eq!(cells.len(), 5);
/// assert_eq!(cells.get("Note"), Some(&Value::Null));
/// assert_eq!(cells.get("Price"), Some(&Value::Float(-1.5)));
/// ```
#[macro_export]
macro_rules! row {
    (@value null) => {
        $crate::Value::Null
    };

    (@value [ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::row!(@value $elem)),*])
    };

    (@value $value:expr) => {
        $crate::Value::from($value)
    };

    (@cells $map:ident) => {};

    (@cells $map:ident $key:literal => null $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from($key), $crate::Value::Null);
        $( $crate::row!(@cells $map $($rest)*); )?
    };

    (@cells $map:ident $key:literal => [ $($elem:tt)* ] $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from($key), $crate::row!(@value [ $($elem)* ]));
        $( $crate::row!(@cells $map $($rest)*); )?
    };

    (@cells $map:ident $key:literal => $value:expr $(, $($rest:tt)*)?) => {
        $map.insert(::std::string::String::from($key), $crate::Value::from($value));
        $( $crate::row!(@cells $map $($rest)*); )?
    };

    ($($body:tt)*) => {{
        #[allow(unused_mut)]
        let mut cells = $crate::ValueMap::new();
        $crate::row!(@cells cells $($body)*);
        cells
    }};
}

#[cfg(test)]
mod tests {
    use crate::{Value, ValueMap};

    #[test]
    fn test_row_macro_empty() {
        assert_eq!(row! {}, ValueMap::new());
    }

    #[test]
    fn test_row_macro_keeps_order() {
        let cells = row! { "b" => 1, "a" => true, "c" => "x" };
        let keys: Vec<_> = cells.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(cells.get("a"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_row_macro_null_and_arrays() {
        let cells = row! { "n" => null, "xs" => [1, null, 3], "empty" => [] };
        assert_eq!(cells.get("n"), Some(&Value::Null));
        assert_eq!(
            cells.get("xs"),
            Some(&Value::Array(vec![Value::Integer(1), Value::Null, Value::Integer(3)]))
        );
        assert_eq!(cells.get("empty"), Some(&Value::Array(vec![])));
    }

    #[test]
    fn test_row_macro_expressions() {
        let name = String::from("Y");
        let id: i64 = 7;
        let cells = row! { "IdTest" => id + 1, "Name" => name.clone(), "Opt" => None::<i64> };
        assert_eq!(cells.get("IdTest"), Some(&Value::Integer(8)));
        assert_eq!(cells.get("Name"), Some(&Value::from("Y")));
        assert_eq!(cells.get("Opt"), Some(&Value::Null));
    }
}
