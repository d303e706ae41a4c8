//! `$ref` resolution
//!
//! Two modes share one pointer parser:
//! - **Shallow** follows at most `max_depth` references per branch and leaves
//!   anything deeper untouched. Used for human-readable output.
//! - **Deep** resolves everything, replacing cycles and over-deep chains with
//!   an object placeholder. Used for machine-consumable schemas.
//!
//! A resolver is created per conversion run; its caches and cycle stack never
//! outlive that run.

use crate::openapi::{decode, RefOr, SpecDocument};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::{BTreeSet, HashMap};

/// How far references are followed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Shallow { max_depth: usize },
    Deep { max_depth: usize },
}

impl ResolveMode {
    pub fn max_depth(&self) -> usize {
        match self {
            ResolveMode::Shallow { max_depth } | ResolveMode::Deep { max_depth } => *max_depth,
        }
    }
}

/// Reference resolver bound to one document
pub struct Resolver<'a> {
    root: &'a Value,
    mode: ResolveMode,
    /// Raw pointer targets
    lookups: HashMap<String, Value>,
    /// Completed deep resolutions
    resolved: HashMap<String, Value>,
    /// References under resolution (deep mode)
    stack: Vec<String>,
    used_schemas: BTreeSet<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(document: &'a SpecDocument, mode: ResolveMode) -> Self {
        Self {
            root: document.root(),
            mode,
            lookups: HashMap::new(),
            resolved: HashMap::new(),
            stack: Vec::new(),
            used_schemas: BTreeSet::new(),
        }
    }

    pub fn mode(&self) -> ResolveMode {
        self.mode
    }

    /// Schema names reached through `.../schemas/...` references in deep mode
    pub fn used_schemas(&self) -> &BTreeSet<String> {
        &self.used_schemas
    }

    /// Replace every reference inside `node` according to the resolver mode
    pub fn resolve(&mut self, node: &Value) -> Value {
        match self.mode {
            ResolveMode::Shallow { max_depth } => self.resolve_shallow(node, 0, max_depth),
            ResolveMode::Deep { max_depth } => self.resolve_deep(node, max_depth),
        }
    }

    /// Raw target of a pointer; missing segments yield an empty object
    pub fn lookup(&mut self, reference: &str) -> Value {
        if let Some(target) = self.lookups.get(reference) {
            return target.clone();
        }

        let target = match pointer_segments(reference) {
            Some(segments) => walk(self.root, &segments),
            None => {
                tracing::debug!("Unsupported reference {}, using empty object", reference);
                None
            }
        }
        .cloned()
        .unwrap_or_else(|| {
            tracing::debug!("Reference {} does not resolve, using empty object", reference);
            Value::Object(Map::new())
        });

        self.lookups.insert(reference.to_string(), target.clone());
        target
    }

    /// Turn a typed slot into its item, following reference chains
    pub fn resolve_ref_or<T>(&mut self, slot: &RefOr<T>) -> T
    where
        T: DeserializeOwned + Default + Clone,
    {
        let mut reference = match slot {
            RefOr::Item(item) => return item.clone(),
            RefOr::Reference { ref_path } => ref_path.clone(),
        };

        let mut seen: Vec<String> = Vec::new();
        loop {
            if seen.contains(&reference) || seen.len() > self.mode.max_depth() {
                tracing::debug!("Reference chain through {} does not terminate", reference);
                return T::default();
            }
            seen.push(reference.clone());

            let target = self.lookup(&reference);
            match target.get("$ref").and_then(Value::as_str) {
                Some(next) => reference = next.to_string(),
                None => return decode(&target),
            }
        }
    }

    fn resolve_shallow(&mut self, node: &Value, depth: usize, max_depth: usize) -> Value {
        if depth > max_depth {
            return node.clone();
        }

        match node {
            Value::Object(map) => match reference_of(map) {
                Some(reference) => {
                    let target = self.lookup(reference);
                    self.resolve_shallow(&target, depth + 1, max_depth)
                }
                None => Value::Object(
                    map.iter()
                        .map(|(key, value)| {
                            (key.clone(), self.resolve_shallow(value, depth, max_depth))
                        })
                        .collect(),
                ),
            },
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_shallow(item, depth, max_depth))
                    .collect(),
            ),
            scalar => scalar.clone(),
        }
    }

    fn resolve_deep(&mut self, node: &Value, max_depth: usize) -> Value {
        match node {
            Value::Object(map) => match reference_of(map) {
                Some(reference) => self.follow_deep(reference, max_depth),
                None => Value::Object(
                    map.iter()
                        .map(|(key, value)| (key.clone(), self.resolve_deep(value, max_depth)))
                        .collect(),
                ),
            },
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_deep(item, max_depth))
                    .collect(),
            ),
            scalar => scalar.clone(),
        }
    }

    fn follow_deep(&mut self, reference: &str, max_depth: usize) -> Value {
        if self.stack.len() > max_depth {
            return json!({"type": "object", "description": "(circular reference)"});
        }
        if self.stack.iter().any(|active| active == reference) {
            tracing::debug!("Cycle detected at {}", reference);
            return json!({"type": "object", "description": format!("(circular: {})", reference)});
        }
        if let Some(done) = self.resolved.get(reference) {
            return done.clone();
        }

        let target = self.lookup(reference);
        if let Some((_, name)) = reference.rsplit_once("/schemas/") {
            self.used_schemas.insert(name.to_string());
        }

        self.stack.push(reference.to_string());
        let resolved = self.resolve_deep(&target, max_depth);
        self.stack.pop();

        self.resolved.insert(reference.to_string(), resolved.clone());
        resolved
    }
}

fn reference_of(map: &Map<String, Value>) -> Option<&str> {
    map.get("$ref").and_then(Value::as_str)
}

/// Split `#/a/b~1c` into unescaped segments; `None` for non-local references
fn pointer_segments(reference: &str) -> Option<Vec<String>> {
    let pointer = reference.strip_prefix('#')?;
    Some(
        pointer
            .split('/')
            .skip(1)
            .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
            .collect(),
    )
}

fn walk<'v>(root: &'v Value, segments: &[String]) -> Option<&'v Value> {
    segments.iter().try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
