//! Partial-update construction and application.
//!
//! # Responsibility
//! - Turn typed optional changes into the minimal set of attribute writes.
//! - Apply a change set to an attribute map (shared by all backends).
//!
//! # Invariants
//! - Only paths of an `UpdatableField` whitelist can enter a built set.
//! - Every built set carries `last_edited`, so it is never empty.
//! - Map-valued fields are written whole; inner keys are never merged.

use super::{Attributes, StoreError, StoreResult, LAST_EDITED_ATTRIBUTE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whitelisted attribute of one entity type.
///
/// Implemented by small per-entity enums; each variant maps to one fixed
/// dotted attribute path such as `data.label`.
pub trait UpdatableField: Copy {
    fn path(self) -> &'static str;
}

/// How provided zero values (`0`, `""`, `false`, empty map) are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroValuePolicy {
    /// A provided zero value means "no change".
    #[default]
    Skip,
    /// Every provided value is written, including zero values.
    Write,
}

/// Value that can be written through an update.
pub trait UpdateValue {
    fn is_zero(&self) -> bool;
    fn into_value(self) -> Value;
}

impl UpdateValue for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl UpdateValue for &str {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl UpdateValue for i64 {
    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl UpdateValue for bool {
    fn is_zero(&self) -> bool {
        !*self
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl UpdateValue for Map<String, Value> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

/// Ordered attribute writes for one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSet {
    fields: Vec<(&'static str, Value)>,
}

impl UpdateSet {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Attribute paths in write order.
    pub fn paths(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(path, _)| *path).collect()
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(candidate, _)| *candidate == path)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(path, value)| (*path, value))
    }

    fn insert(&mut self, path: &'static str, value: Value) {
        match self.fields.iter_mut().find(|(candidate, _)| *candidate == path) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((path, value)),
        }
    }

    /// Writes every field into `attributes`, creating intermediate maps.
    pub fn apply_to(&self, attributes: &mut Attributes) -> StoreResult<()> {
        for (path, value) in &self.fields {
            set_path(attributes, path, value.clone())?;
        }
        Ok(())
    }
}

/// Collects the changed fields of one entity.
pub struct UpdateBuilder<F: UpdatableField> {
    policy: ZeroValuePolicy,
    set: UpdateSet,
    _field: std::marker::PhantomData<F>,
}

impl<F: UpdatableField> UpdateBuilder<F> {
    pub fn new(policy: ZeroValuePolicy) -> Self {
        Self {
            policy,
            set: UpdateSet::default(),
            _field: std::marker::PhantomData,
        }
    }

    /// Records `value` for `field` when it counts as a change.
    pub fn set<T: UpdateValue>(mut self, field: F, value: Option<T>) -> Self {
        if let Some(value) = value {
            if self.policy == ZeroValuePolicy::Write || !value.is_zero() {
                self.set.insert(field.path(), value.into_value());
            }
        }
        self
    }

    /// Seals the set, stamping `last_edited` with `now_ms`.
    pub fn finish(mut self, now_ms: i64) -> UpdateSet {
        self.set.insert(LAST_EDITED_ATTRIBUTE, Value::from(now_ms));
        self.set
    }
}

fn set_path(attributes: &mut Attributes, path: &str, value: Value) -> StoreResult<()> {
    let mut segments = path.split('.').peekable();
    let mut current = attributes;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return Ok(());
        }
        let next = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match next {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidRecord(format!(
                    "attribute `{segment}` of path `{path}` is {other}, not a map"
                )))
            }
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Copy)]
    enum Field {
        Label,
        X,
        Animated,
        Styles,
    }

    impl UpdatableField for Field {
        fn path(self) -> &'static str {
            match self {
                Self::Label => "data.label",
                Self::X => "position.x",
                Self::Animated => "animated",
                Self::Styles => "styles.label_styles",
            }
        }
    }

    #[test]
    fn only_provided_fields_and_last_edited_are_written() {
        let set = UpdateBuilder::new(ZeroValuePolicy::Skip)
            .set(Field::Label, Some("x"))
            .set::<i64>(Field::X, None)
            .finish(42);
        assert_eq!(set.paths(), vec!["data.label", "last_edited"]);
        assert_eq!(set.get("last_edited"), Some(&json!(42)));
    }

    #[test]
    fn skip_policy_drops_zero_values() {
        let set = UpdateBuilder::new(ZeroValuePolicy::Skip)
            .set(Field::X, Some(0_i64))
            .set(Field::Animated, Some(false))
            .set(Field::Label, Some(String::new()))
            .set(Field::Styles, Some(Map::new()))
            .finish(1);
        assert_eq!(set.paths(), vec!["last_edited"]);
    }

    #[test]
    fn write_policy_keeps_zero_values() {
        let set = UpdateBuilder::new(ZeroValuePolicy::Write)
            .set(Field::X, Some(0_i64))
            .set(Field::Animated, Some(false))
            .finish(1);
        assert_eq!(set.paths(), vec!["position.x", "animated", "last_edited"]);
        assert_eq!(set.get("animated"), Some(&json!(false)));
    }

    #[test]
    fn apply_replaces_whole_sub_map_and_keeps_siblings() {
        let mut attributes = json!({
            "data": {"label": "old", "title": "kept"},
            "styles": {"label_styles": {"color": "red", "size": 3}}
        })
        .as_object()
        .cloned()
        .unwrap();

        let mut styles = Map::new();
        styles.insert("color".to_string(), json!("blue"));
        let set = UpdateBuilder::new(ZeroValuePolicy::Skip)
            .set(Field::Label, Some("new"))
            .set(Field::Styles, Some(styles))
            .finish(7);
        set.apply_to(&mut attributes).unwrap();

        assert_eq!(attributes["data"], json!({"label": "new", "title": "kept"}));
        assert_eq!(attributes["styles"]["label_styles"], json!({"color": "blue"}));
        assert_eq!(attributes["last_edited"], json!(7));
    }

    #[test]
    fn apply_creates_missing_parents_but_rejects_scalar_parents() {
        let mut attributes = Attributes::new();
        let set = UpdateBuilder::new(ZeroValuePolicy::Skip)
            .set(Field::X, Some(5_i64))
            .finish(1);
        set.apply_to(&mut attributes).unwrap();
        assert_eq!(attributes["position"], json!({"x": 5}));

        let mut broken = json!({"position": 3}).as_object().cloned().unwrap();
        let err = set.apply_to(&mut broken).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
    }
}
