use serde_json::Value;

/// Look up `path` in `root`; `Null` when any step is missing.
///
/// Steps are separated by `.`; `name[2]` indexes into an array and a
/// trailing `len()` yields the length of an array, object or string.
///
/// ```ignore
/// json_at(&body, "items[0].name");
/// json_at(&body, "items.len()");
/// ```
pub fn json_at(root: &Value, path: &str) -> Value {
    let mut current = root;
    for step in path.split('.').filter(|s| !s.is_empty()) {
        if step == "len()" {
            let len = match current {
                Value::Array(a) => a.len(),
                Value::Object(o) => o.len(),
                Value::String(s) => s.chars().count(),
                other => panic!("len() on a non-collection in \"{path}\": {other}"),
            };
            return Value::from(len);
        }
        let (name, indexes) = match step.find('[') {
            Some(pos) => step.split_at(pos),
            None => (step, ""),
        };
        if !name.is_empty() {
            current = match current.get(name) {
                Some(v) => v,
                None => return Value::Null,
            };
        }
        for index in indexes
            .split(']')
            .filter_map(|s| s.strip_prefix('['))
        {
            let index: usize = index
                .parse()
                .unwrap_or_else(|_| panic!("bad index [{index}] in \"{path}\""));
            current = match current.get(index) {
                Some(v) => v,
                None => return Value::Null,
            };
        }
    }
    current.clone()
}
