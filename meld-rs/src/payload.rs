//! Template payloads and request-derived values

use crate::error::{MeldError, Result};
use serde::Serialize;
use serde_json::Value;

/// Variables available to subject and body templates
pub type Payload = serde_json::Map<String, Value>;

/// Supplies named values taken from a caller-defined request
pub trait RequestSource {
    fn extract(&self) -> Result<Payload>;
}

impl<F> RequestSource for F
where
    F: Fn() -> Result<Payload>,
{
    fn extract(&self) -> Result<Payload> {
        self()
    }
}

/// Copies values out of a serializable request by dotted attribute path
///
/// ```
/// use meld_rs::payload::{AttributePaths, RequestSource};
/// use serde_json::json;
///
/// let request = json!({ "user": { "email": "jane@example.com" } });
/// let values = AttributePaths::new(&request)
///     .with("user_email", "user.email")
///     .extract()
///     .unwrap();
/// assert_eq!(values["user_email"], "jane@example.com");
/// ```
pub struct AttributePaths<'a, R: Serialize> {
    request: &'a R,
    paths: Vec<(String, String)>,
}

impl<'a, R: Serialize> AttributePaths<'a, R> {
    pub fn new(request: &'a R) -> Self {
        Self {
            request,
            paths: Vec::new(),
        }
    }

    /// Declare that payload `key` takes the value at `path`
    pub fn with(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.paths.push((key.into(), path.into()));
        self
    }
}

impl<R: Serialize> RequestSource for AttributePaths<'_, R> {
    fn extract(&self) -> Result<Payload> {
        let root = serde_json::to_value(self.request)?;

        let mut values = Payload::new();
        for (key, path) in &self.paths {
            let value = lookup(&root, path)
                .ok_or_else(|| MeldError::RequestAttribute(path.clone()))?;
            values.insert(key.clone(), value.clone());
        }
        Ok(values)
    }
}

/// Follow `a.b.c` through objects, numeric segments index into arrays
fn lookup<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(root, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
