//! Filters, sorts and set mutations understood by every [`DocumentStore`](super::DocumentStore).
//!
//! Documents are JSON objects. Field paths are dotted (`author.id`) and address
//! nested objects. Both store backends evaluate queries with the functions in
//! this module so that ordering and matching behave identically.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{FeedError, FeedResult};

/// Name of the identifier field every stored document carries.
pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Document predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals value.
    Eq(String, Value),
    /// Array field holds value.
    Contains(String, Value),
    /// Field equals one of the values. An empty list matches nothing.
    In(String, Vec<Value>),
    /// Every inner filter matches.
    And(Vec<Filter>),
}

impl Filter {
    pub fn id(entity_id: impl Into<String>) -> Self {
        Self::Eq(ID_FIELD.to_string(), Value::String(entity_id.into()))
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains(field.into(), value.into())
    }

    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// Combines two filters, flattening nested conjunctions.
    pub fn and_also(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, other) | (other, Filter::All) => other,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), other) => {
                left.push(other);
                Filter::And(left)
            }
            (first, second) => Filter::And(vec![first, second]),
        }
    }

    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, expected) => lookup(document, field) == Some(expected),
            Filter::Contains(field, expected) => lookup(document, field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(expected)),
            Filter::In(field, candidates) => {
                lookup(document, field).is_some_and(|actual| candidates.contains(actual))
            }
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(document)),
        }
    }

    /// Identifier the filter pins, if any. Lets stores fetch a single key instead of scanning.
    pub fn id_hint(&self) -> Option<&str> {
        match self {
            Filter::Eq(field, Value::String(id)) if field == ID_FIELD => Some(id),
            Filter::And(filters) => filters.iter().find_map(Filter::id_hint),
            _ => None,
        }
    }

    /// Builds the starting document of an upsert from the equality clauses of the filter.
    pub fn seed_document(&self) -> Value {
        let mut seed = Value::Object(Map::new());
        self.collect_equalities(&mut seed);
        seed
    }

    fn collect_equalities(&self, seed: &mut Value) {
        match self {
            Filter::Eq(field, value) => {
                // Seeding an object cannot fail; path segments are created on demand.
                let _ = assign(seed, field, value.clone());
            }
            Filter::And(filters) => filters.iter().for_each(|filter| filter.collect_equalities(seed)),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Parameters of a `FindMany` call.
#[derive(Debug, Clone)]
pub struct FindOptions {
    pub filter: Filter,
    pub sort: Vec<SortKey>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: Vec::new(),
            skip: 0,
            limit: None,
        }
    }

    #[inline]
    pub fn with_sort(mut self, sort: impl IntoIterator<Item = SortKey>) -> Self {
        self.sort = sort.into_iter().collect();
        self
    }

    #[inline]
    pub fn with_window(mut self, skip: u64, limit: u64) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }
}

/// A single-field mutation applied inside one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Replace the field value.
    Set(String, Value),
    /// Append the value to an array field unless already present.
    AddToSet(String, Value),
    /// Remove every occurrence of the value from an array field.
    Pull(String, Value),
}

impl Update {
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Set(field.into(), value.into())
    }

    pub fn add_to_set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::AddToSet(field.into(), value.into())
    }

    pub fn pull(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Pull(field.into(), value.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnDocument {
    #[default]
    Before,
    After,
}

/// Options of an `UpdateOne` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    pub upsert: bool,
    pub return_document: ReturnDocument,
}

impl UpdateOptions {
    /// Plain update; the outcome carries the document as it was before the mutation.
    pub const PLAIN: UpdateOptions = UpdateOptions {
        upsert: false,
        return_document: ReturnDocument::Before,
    };

    /// Return the post-mutation state; never create a document.
    pub const RETURN_AFTER: UpdateOptions = UpdateOptions {
        upsert: false,
        return_document: ReturnDocument::After,
    };

    /// Create the document when nothing matches and return the post-mutation state.
    pub const UPSERT_RETURN_AFTER: UpdateOptions = UpdateOptions {
        upsert: true,
        return_document: ReturnDocument::After,
    };
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
    pub upserted_id: Option<String>,
    pub document: Option<Value>,
}

impl UpdateOutcome {
    pub fn unmatched() -> Self {
        Self::default()
    }
}

/// Resolves a dotted path inside a document.
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |current, segment| current.get(segment))
}

fn assign(document: &mut Value, path: &str, value: Value) -> FeedResult<()> {
    let slot = slot_mut(document, path)?;
    *slot = value;
    Ok(())
}

fn slot_mut<'a>(document: &'a mut Value, path: &str) -> FeedResult<&'a mut Value> {
    let mut current = document;
    for segment in path.split('.') {
        let object = current
            .as_object_mut()
            .ok_or_else(|| FeedError::store(format!("cannot address `{path}`: parent is not an object")))?;
        current = object.entry(segment.to_string()).or_insert(Value::Null);
    }
    Ok(current)
}

fn array_mut<'a>(document: &'a mut Value, path: &str) -> FeedResult<&'a mut Vec<Value>> {
    let slot = slot_mut(document, path)?;
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    slot.as_array_mut()
        .ok_or_else(|| FeedError::store(format!("field `{path}` is not an array")))
}

/// Applies mutations in order. Returns whether the document changed.
pub fn apply_updates(document: &mut Value, updates: &[Update]) -> FeedResult<bool> {
    let mut modified = false;
    for update in updates {
        match update {
            Update::Set(field, value) => {
                let slot = slot_mut(document, field)?;
                if *slot != *value {
                    *slot = value.clone();
                    modified = true;
                }
            }
            Update::AddToSet(field, value) => {
                let items = array_mut(document, field)?;
                if !items.contains(value) {
                    items.push(value.clone());
                    modified = true;
                }
            }
            Update::Pull(field, value) => {
                let items = array_mut(document, field)?;
                let before = items.len();
                items.retain(|item| item != value);
                modified |= items.len() != before;
            }
        }
    }
    Ok(modified)
}

/// Total order over JSON values: null < bool < number < string < array < object.
pub fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (left, right) {
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Array(a)), Some(Value::Array(b))) => a.len().cmp(&b.len()),
        _ => rank(left).cmp(&rank(right)),
    }
}

fn compare_documents(left: &Value, right: &Value, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let ordering = compare_values(lookup(left, &key.field), lookup(right, &key.field));
        let ordering = match key.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Filters, stably sorts and windows documents given in natural (insertion) order.
pub fn select<I>(documents: I, options: &FindOptions) -> Vec<Value>
where
    I: IntoIterator<Item = Value>,
{
    let mut selected: Vec<Value> = documents
        .into_iter()
        .filter(|document| options.filter.matches(document))
        .collect();
    if !options.sort.is_empty() {
        selected.sort_by(|left, right| compare_documents(left, right, &options.sort));
    }
    let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
    let limit = options
        .limit
        .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
        .unwrap_or(usize::MAX);
    selected.into_iter().skip(skip).take(limit).collect()
}
