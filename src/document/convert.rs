use serde_yaml::Value;

use super::{DocumentNode, Mapping};

/// Converts a parsed `serde_yaml::Value` into a [`DocumentNode`].
///
/// Scalar mapping keys are stringified the way they were written
/// (`1: a` gives the key `"1"`). Tags are dropped and the tagged value kept.
///
/// # Errors
///
/// Returns a message naming the offending key when a mapping key is itself
/// a sequence or mapping.
pub fn yaml_to_document(value: Value) -> Result<DocumentNode, String> {
    Ok(match value {
        Value::Null => DocumentNode::Null,
        Value::Bool(b) => DocumentNode::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                DocumentNode::Integer(i)
            } else {
                DocumentNode::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => DocumentNode::String(s),
        Value::Sequence(seq) => DocumentNode::Sequence(
            seq.into_iter()
                .map(yaml_to_document)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (key, value) in map {
                let key = yaml_key(key)?;
                out.insert(key, yaml_to_document(value)?);
            }
            DocumentNode::Mapping(out)
        }
        Value::Tagged(tagged) => yaml_to_document(tagged.value)?,
    })
}

fn yaml_key(key: Value) -> Result<String, String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(format!(
            "mapping key must be a scalar, found {}",
            match other {
                Value::Sequence(_) => "sequence",
                _ => "mapping",
            }
        )),
    }
}
