//! Syntax tree evaluation against a JSON data context.

use super::parse::{CmpOp, Cond, FieldPath, Node, Operand};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Render `nodes` to text. `.Local` writes from `set` land in `data`.
pub fn execute(nodes: &[Node], data: &mut Value) -> Result<String> {
    let mut out = String::new();
    run(nodes, data, &mut out)?;
    Ok(out)
}

fn run(nodes: &[Node], data: &mut Value, out: &mut String) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Output(path) => {
                let value = lookup(data, path)
                    .ok_or_else(|| missing(path))?;
                out.push_str(&scalar(path, value)?);
            }
            Node::Default(fallback, path) => match lookup(data, path) {
                Some(value) if !value.is_null() => out.push_str(&scalar(path, value)?),
                _ => out.push_str(&scalar(path, fallback)?),
            },
            Node::Tokens(path) => {
                let value = lookup(data, path).ok_or_else(|| missing(path))?;
                out.push_str(&token_list(path, value)?);
            }
            Node::Set(key, operand) => {
                let value = resolve(data, operand)?.clone();
                set_local(data, key, value);
            }
            Node::If {
                branches,
                otherwise,
            } => {
                let mut taken = None;
                for (cond, body) in branches {
                    if eval(data, cond)? {
                        taken = Some(body);
                        break;
                    }
                }
                run(taken.unwrap_or(otherwise), data, out)?;
            }
        }
    }
    Ok(())
}

fn lookup<'a>(data: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = data;
    for segment in &path.segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn missing(path: &FieldPath) -> Error {
    Error::template_exec(format!("field {} not found", path.display()))
}

fn resolve<'a>(data: &'a Value, operand: &'a Operand) -> Result<&'a Value> {
    match operand {
        Operand::Field(path) => lookup(data, path).ok_or_else(|| missing(path)),
        Operand::Literal(value) => Ok(value),
    }
}

/// Scalars render as they would inside a JSON string: strings escaped but
/// unquoted, numbers and booleans verbatim.
fn scalar(path: &FieldPath, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => {
            let quoted = Value::String(s.clone()).to_string();
            Ok(quoted[1..quoted.len() - 1].to_string())
        }
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(Error::template_exec(format!(
            "field {} has no value",
            path.display()
        ))),
        _ => Err(Error::template_exec(format!(
            "field {} is not a scalar",
            path.display()
        ))),
    }
}

fn token_list(path: &FieldPath, value: &Value) -> Result<String> {
    let items = match value {
        Value::Null => return Ok("\"\"".to_string()),
        Value::Array(items) => items,
        _ => {
            return Err(Error::template_exec(format!(
                "field {} is not a list",
                path.display()
            )))
        }
    };
    if items.is_empty() {
        return Ok("\"\"".to_string());
    }

    let mut quoted = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(_) => quoted.push(item.to_string()),
            Value::Number(n) => quoted.push(Value::String(n.to_string()).to_string()),
            _ => {
                return Err(Error::template_exec(format!(
                    "field {} holds a non-scalar token",
                    path.display()
                )))
            }
        }
    }
    Ok(quoted.join(","))
}

fn set_local(data: &mut Value, key: &str, value: Value) {
    if !data.is_object() {
        *data = Value::Object(Map::new());
    }
    if let Value::Object(root) = data {
        let local = root
            .entry("Local")
            .or_insert_with(|| Value::Object(Map::new()));
        if !local.is_object() {
            *local = Value::Object(Map::new());
        }
        if let Value::Object(map) = local {
            map.insert(key.to_string(), value);
        }
    }
}

fn eval(data: &Value, cond: &Cond) -> Result<bool> {
    match cond {
        Cond::Truthy(Operand::Field(path)) => Ok(lookup(data, path).map(truthy).unwrap_or(false)),
        Cond::Truthy(Operand::Literal(value)) => Ok(truthy(value)),
        Cond::Not(inner) => Ok(!eval(data, inner)?),
        Cond::And(a, b) => Ok(eval(data, a)? && eval(data, b)?),
        Cond::Or(a, b) => Ok(eval(data, a)? || eval(data, b)?),
        Cond::Compare(op, a, b) => {
            let left = resolve(data, a)?;
            let right = resolve(data, b)?;
            compare(*op, left, right)
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool> {
    // Numbers compare numerically, also against numeric strings, so that
    // `eq .Profile.height 720` works whether the config wrote 720 or "720".
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            match (as_number(left), as_number(right)) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            }
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    };

    match (op, ordering) {
        (CmpOp::Eq, ord) => Ok(ord == Some(Ordering::Equal)),
        (CmpOp::Ne, ord) => Ok(ord != Some(Ordering::Equal)),
        (_, None) => Err(Error::template_exec(format!(
            "cannot order {left} against {right}"
        ))),
        (CmpOp::Lt, Some(ord)) => Ok(ord == Ordering::Less),
        (CmpOp::Le, Some(ord)) => Ok(ord != Ordering::Greater),
        (CmpOp::Gt, Some(ord)) => Ok(ord == Ordering::Greater),
        (CmpOp::Ge, Some(ord)) => Ok(ord != Ordering::Less),
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse::parse;
    use super::*;
    use serde_json::json;
    use assert_matches::assert_matches;

    fn render(source: &str, mut data: Value) -> Result<String> {
        let nodes = parse(source)?;
        execute(&nodes, &mut data)
    }

    #[test]
    fn test_substitution_escapes() {
        let out = render(
            "[\"{{ .title }}\", {{ .h }}, {{ .ok }}]",
            json!({"title": "say \"hi\"", "h": 720, "ok": true}),
        )
        .unwrap();
        assert_eq!(out, r#"["say \"hi\"", 720, true]"#);
    }

    #[test]
    fn test_array_index() {
        let out = render(
            "{{ .Video.streams.1.codec_name }}",
            json!({"Video": {"streams": [{"codec_name": "h264"}, {"codec_name": "aac"}]}}),
        )
        .unwrap();
        assert_eq!(out, "aac");
    }

    #[test]
    fn test_missing_field_is_exec_error() {
        let err = render("{{ .Profile.codec }}", json!({"Profile": {}})).unwrap_err();
        assert_matches!(err, Error::TemplateExec(ref m) if m.contains(".Profile.codec"));

        let err = render("{{ .h }}", json!({"h": null})).unwrap_err();
        assert_matches!(err, Error::TemplateExec(_));
    }

    #[test]
    fn test_default() {
        let data = json!({"Profile": {"ext": null, "crf": 20}});
        assert_eq!(render("{{ default \"mp4\" .Profile.ext }}", data.clone()).unwrap(), "mp4");
        assert_eq!(render("{{ default 23 .Profile.crf }}", data.clone()).unwrap(), "20");
        assert_eq!(render("{{ default 23 .Profile.none }}", data).unwrap(), "23");
    }

    #[test]
    fn test_conditionals() {
        let source = "{{ if gt .h 1080 }}uhd{{ else if ge .h 720 }}hd{{ else }}sd{{ end }}";
        assert_eq!(render(source, json!({"h": 2160})).unwrap(), "uhd");
        assert_eq!(render(source, json!({"h": 720})).unwrap(), "hd");
        assert_eq!(render(source, json!({"h": "480"})).unwrap(), "sd");
    }

    #[test]
    fn test_truthiness_of_missing_field() {
        let source = "{{ if .Profile.cuda }}gpu{{ else }}cpu{{ end }}";
        assert_eq!(render(source, json!({"Profile": {}})).unwrap(), "cpu");
        assert_eq!(render(source, json!({"Profile": {"cuda": true}})).unwrap(), "gpu");
        assert_eq!(
            render("{{ if not .x }}none{{ end }}", json!({"x": ""})).unwrap(),
            "none"
        );
    }

    #[test]
    fn test_logic() {
        let source = "{{ if and (eq .c \"hevc\") (or .a (lt .n 3)) }}y{{ else }}n{{ end }}";
        assert_eq!(render(source, json!({"c": "hevc", "n": 2})).unwrap(), "y");
        assert_eq!(render(source, json!({"c": "hevc", "n": 5})).unwrap(), "n");
        assert_eq!(render(source, json!({"c": "h264", "a": true})).unwrap(), "n");
    }

    #[test]
    fn test_compare_errors() {
        let err = render("{{ if gt .missing 1 }}x{{ end }}", json!({})).unwrap_err();
        assert_matches!(err, Error::TemplateExec(_));

        let err = render("{{ if lt .s 1 }}x{{ end }}", json!({"s": "abc"})).unwrap_err();
        assert_matches!(err, Error::TemplateExec(_));

        // Equality across types is simply false
        assert_eq!(render("{{ if eq .s 1 }}x{{ end }}", json!({"s": "abc"})).unwrap(), "");
    }

    #[test]
    fn test_set_local() {
        let source = "{{ if gt .h 1080 }}{{ set \"crf\" 28 }}{{ else }}{{ set \"crf\" .base }}{{ end }}{{ .Local.crf }}";
        assert_eq!(render(source, json!({"h": 2160, "base": 22})).unwrap(), "28");
        assert_eq!(render(source, json!({"h": 720, "base": 22})).unwrap(), "22");
    }

    #[test]
    fn test_tokens() {
        let data = json!({"Flags": {"args": ["-crf", "22"], "init": []}});
        assert_eq!(
            render("[{{ tokens .Flags.args }}]", data.clone()).unwrap(),
            r#"["-crf","22"]"#
        );
        assert_eq!(render("[{{ tokens .Flags.init }}]", data).unwrap(), r#"[""]"#);

        let err = render("{{ tokens .x }}", json!({"x": "str"})).unwrap_err();
        assert_matches!(err, Error::TemplateExec(_));
    }
}
