//! Parameter escaping for property-graph engines that only support
//! templated queries rather than true parameter binding. When an engine
//! can bind parameters natively, prefer that — this exists for the engines
//! that can't.

use crate::value::QueryValue;

/// Render `value` as a literal safe to splice into a templated query:
/// strings are quoted with internal single quotes doubled, `null` renders
/// as the bare keyword, and nested maps render as property-syntax text
/// (`{key: value, ...}`), recursively.
pub fn escape_value(value: &QueryValue) -> String {
    match value {
        QueryValue::Null => "null".to_string(),
        QueryValue::Bool(b) => b.to_string(),
        QueryValue::Int(i) => i.to_string(),
        QueryValue::Float(f) => f.to_string(),
        QueryValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        QueryValue::List(items) => {
            let rendered: Vec<String> = items.iter().map(escape_value).collect();
            format!("[{}]", rendered.join(", "))
        }
        QueryValue::Map(map) => {
            let mut entries: Vec<&String> = map.keys().collect();
            entries.sort();
            let rendered: Vec<String> = entries
                .into_iter()
                .map(|k| format!("{}: {}", k, escape_value(&map[k])))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn quotes_strings_and_doubles_single_quotes() {
        assert_eq!(escape_value(&QueryValue::Text("O'Brien".into())), "'O''Brien'");
    }

    #[test]
    fn null_renders_bare() {
        assert_eq!(escape_value(&QueryValue::Null), "null");
    }

    #[test]
    fn nested_map_renders_property_syntax() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), QueryValue::Text("a".into()));
        map.insert("count".to_string(), QueryValue::Int(2));
        assert_eq!(escape_value(&QueryValue::Map(map)), "{count: 2, name: 'a'}");
    }
}
