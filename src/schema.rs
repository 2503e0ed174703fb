use crate::error::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};

/// Shape of a single field in a schema
#[derive(Debug, Clone)]
enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    Object(Schema),
    Array(Box<Field>),
    Any,
}

/// Declarative constraints on one payload field.
///
/// Primitive values may be coerced (numeric strings become numbers);
/// structural shape (objects, arrays) is never coerced.
#[derive(Debug, Clone)]
pub struct Field {
    required: bool,
    kind: FieldKind,
    min: Option<f64>,
    max: Option<f64>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    pattern: Option<Regex>,
    allowed: Option<Vec<String>>,
}

impl Field {
    fn new(kind: FieldKind) -> Self {
        Field {
            required: false,
            kind,
            min: None,
            max: None,
            min_len: None,
            max_len: None,
            pattern: None,
            allowed: None,
        }
    }

    pub fn string() -> Self {
        Field::new(FieldKind::String)
    }

    pub fn integer() -> Self {
        Field::new(FieldKind::Integer)
    }

    pub fn number() -> Self {
        Field::new(FieldKind::Number)
    }

    pub fn boolean() -> Self {
        Field::new(FieldKind::Boolean)
    }

    pub fn object(schema: Schema) -> Self {
        Field::new(FieldKind::Object(schema))
    }

    pub fn array(item: Field) -> Self {
        Field::new(FieldKind::Array(Box::new(item)))
    }

    pub fn any() -> Self {
        Field::new(FieldKind::Any)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    /// Constrain string values to the given regular expression.
    /// The pattern is a schema-author constant.
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(Regex::new(pattern).expect("invalid field pattern"));
        self
    }

    /// Constrain string values to an enumerated set
    pub fn allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Check a present value against this field's constraints, appending
    /// one message per violated constraint. Returns the normalized value
    /// when every constraint holds.
    fn check(&self, path: &str, value: &Value, messages: &mut Vec<String>) -> Option<Value> {
        match &self.kind {
            FieldKind::String => match value.as_str() {
                Some(s) => {
                    let mut ok = true;
                    let len = s.chars().count();
                    if let Some(min) = self.min_len {
                        if len < min {
                            messages.push(format!("{}: must be at least {} characters", path, min));
                            ok = false;
                        }
                    }
                    if let Some(max) = self.max_len {
                        if len > max {
                            messages.push(format!("{}: must be at most {} characters", path, max));
                            ok = false;
                        }
                    }
                    if let Some(re) = &self.pattern {
                        if !re.is_match(s) {
                            messages.push(format!("{}: must match pattern {}", path, re.as_str()));
                            ok = false;
                        }
                    }
                    if let Some(allowed) = &self.allowed {
                        if !allowed.iter().any(|a| a == s) {
                            messages.push(format!(
                                "{}: must be one of [{}]",
                                path,
                                allowed.join(", ")
                            ));
                            ok = false;
                        }
                    }
                    ok.then(|| value.clone())
                }
                None => {
                    messages.push(format!("{}: must be a string", path));
                    None
                }
            },
            FieldKind::Integer => {
                let parsed = if let Some(i) = value.as_i64() {
                    Some(i)
                } else if let Some(s) = value.as_str() {
                    s.trim().parse::<i64>().ok()
                } else {
                    None
                };
                match parsed {
                    Some(i) => {
                        self.check_range(path, i as f64, messages)
                            .then(|| Value::from(i))
                    }
                    None => {
                        messages.push(format!("{}: must be an integer", path));
                        None
                    }
                }
            }
            FieldKind::Number => {
                let parsed = if let Some(f) = value.as_f64() {
                    Some(f)
                } else if let Some(s) = value.as_str() {
                    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
                } else {
                    None
                };
                match parsed {
                    Some(f) => self
                        .check_range(path, f, messages)
                        .then(|| serde_json::Number::from_f64(f).map(Value::Number))
                        .flatten(),
                    None => {
                        messages.push(format!("{}: must be a number", path));
                        None
                    }
                }
            }
            FieldKind::Boolean => match value.as_bool() {
                Some(b) => Some(Value::Bool(b)),
                None => {
                    messages.push(format!("{}: must be a boolean", path));
                    None
                }
            },
            FieldKind::Object(schema) => match value.as_object() {
                Some(obj) => {
                    let before = messages.len();
                    let out = schema.check_object(&format!("{}.", path), obj, messages);
                    (messages.len() == before).then(|| Value::Object(out))
                }
                None => {
                    messages.push(format!("{}: must be an object", path));
                    None
                }
            },
            FieldKind::Array(item) => match value.as_array() {
                Some(arr) => {
                    let before = messages.len();
                    let mut out = Vec::with_capacity(arr.len());
                    for (i, element) in arr.iter().enumerate() {
                        if let Some(v) = item.check(&format!("{}[{}]", path, i), element, messages)
                        {
                            out.push(v);
                        }
                    }
                    (messages.len() == before).then(|| Value::Array(out))
                }
                None => {
                    messages.push(format!("{}: must be an array", path));
                    None
                }
            },
            FieldKind::Any => Some(value.clone()),
        }
    }

    fn check_range(&self, path: &str, value: f64, messages: &mut Vec<String>) -> bool {
        let mut ok = true;
        if let Some(min) = self.min {
            if value < min {
                messages.push(format!("{}: must be at least {}", path, min));
                ok = false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                messages.push(format!("{}: must be at most {}", path, max));
                ok = false;
            }
        }
        ok
    }
}

/// Cross-field constraints evaluated against the whole payload object
#[derive(Debug, Clone)]
pub enum Rule {
    /// An array field must contain at least `min` items
    MinItems { field: String, min: usize },
    /// A field becomes required when a sibling field holds a given value
    RequiredIf {
        field: String,
        when: String,
        equals: Value,
    },
}

impl Rule {
    pub fn min_items(field: impl Into<String>, min: usize) -> Self {
        Rule::MinItems {
            field: field.into(),
            min,
        }
    }

    pub fn required_if(
        field: impl Into<String>,
        when: impl Into<String>,
        equals: impl Into<Value>,
    ) -> Self {
        Rule::RequiredIf {
            field: field.into(),
            when: when.into(),
            equals: equals.into(),
        }
    }

    fn check(&self, prefix: &str, obj: &Map<String, Value>, messages: &mut Vec<String>) {
        match self {
            Rule::MinItems { field, min } => {
                if let Some(Value::Array(arr)) = obj.get(field) {
                    if arr.len() < *min {
                        messages.push(format!(
                            "{}{}: must contain at least {} item(s)",
                            prefix, field, min
                        ));
                    }
                }
            }
            Rule::RequiredIf {
                field,
                when,
                equals,
            } => {
                if obj.get(when) == Some(equals) {
                    match obj.get(field) {
                        None | Some(Value::Null) => messages.push(format!(
                            "{}{}: required when {} is {}",
                            prefix, field, when, equals
                        )),
                        Some(_) => {}
                    }
                }
            }
        }
    }
}

/// A named, declarative description of one payload's required shape.
///
/// Validation is closed-world: fields not declared here fail validation
/// unless the schema is marked passthrough. Validation always runs to
/// completion and reports every violated constraint.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<(String, Field)>,
    passthrough: bool,
    rules: Vec<Rule>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Schema {
            name: name.into(),
            fields: Vec::new(),
            passthrough: false,
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a field; declaration order is the message order
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Allow undeclared fields through unchanged
    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    /// Attach a cross-field rule
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Validate a payload, returning the normalized (coerced) value or a
    /// validation error listing every violated field
    pub fn validate(&self, payload: &Value) -> Result<Value> {
        let mut messages = Vec::new();

        let normalized = match payload.as_object() {
            Some(obj) => Some(self.check_object("", obj, &mut messages)),
            None => {
                messages.push("payload: must be a JSON object".to_string());
                None
            }
        };

        if messages.is_empty() {
            Ok(Value::Object(normalized.unwrap_or_default()))
        } else {
            Err(Error::Validation { messages })
        }
    }

    fn check_object(
        &self,
        prefix: &str,
        obj: &Map<String, Value>,
        messages: &mut Vec<String>,
    ) -> Map<String, Value> {
        let mut out = Map::new();

        for (name, field) in &self.fields {
            let path = format!("{}{}", prefix, name);
            match obj.get(name) {
                None | Some(Value::Null) => {
                    if field.required {
                        messages.push(format!("{}: required field is missing", path));
                    }
                }
                Some(value) => {
                    if let Some(v) = field.check(&path, value, messages) {
                        out.insert(name.clone(), v);
                    }
                }
            }
        }

        for (key, value) in obj {
            if self.fields.iter().any(|(name, _)| name == key) {
                continue;
            }
            if self.passthrough {
                out.insert(key.clone(), value.clone());
            } else {
                messages.push(format!("{}{}: unknown field", prefix, key));
            }
        }

        for rule in &self.rules {
            rule.check(prefix, obj, messages);
        }

        out
    }
}
