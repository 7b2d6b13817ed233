//! Form builder accumulator.
//!
//! A [`FormBuilder`] is a tree: every field added to it becomes a child entry,
//! and nested forms created with [`FormBuilder::build`] are children that hold
//! entries of their own. Rendering the tree is left to the caller.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde_json::Value;

use crate::descriptor::FieldDescriptor;
use crate::options::OptionMap;

/// Converts between a related entity and the scalar a widget submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTransformer {
    /// Entity to its identifier, looked up through `entity_manager`
    EntityToId {
        entity_manager: String,
        class_name: String,
    },
}

/// Options handed to a widget.
///
/// Plain values live in `values`. Objects that are not plain data (the
/// collection prototype, the originating descriptor, a value transformer)
/// have their own typed slots.
#[derive(Debug, Clone, Default)]
pub struct WidgetOptions {
    pub values: OptionMap,
    pub value_transformer: Option<ValueTransformer>,
    pub prototype: Option<Box<FormBuilder>>,
    pub field_description: Option<Box<FieldDescriptor>>,
}

impl WidgetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }
}

impl From<OptionMap> for WidgetOptions {
    fn from(values: OptionMap) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }
}

/// A widget produced by a [`crate::WidgetFactory`].
#[derive(Debug, Clone)]
pub struct Widget {
    pub widget_type: String,
    pub options: WidgetOptions,
}

/// Accumulates form entries for one form scope.
#[derive(Debug, Clone)]
pub struct FormBuilder {
    name: String,
    widget_type: String,
    options: WidgetOptions,
    data: Option<Value>,
    children: IndexMap<String, FormBuilder>,
    lineage: Vec<String>,
}

impl FormBuilder {
    pub fn new(name: impl Into<String>, widget_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            widget_type: widget_type.into(),
            options: WidgetOptions::default(),
            data: None,
            children: IndexMap::new(),
            lineage: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn widget_type(&self) -> &str {
        &self.widget_type
    }

    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: Value) {
        self.data = Some(data);
    }

    /// Add (or replace) a field entry.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        widget_type: impl Into<String>,
        options: WidgetOptions,
    ) -> &mut Self {
        let name = name.into();
        let mut entry = FormBuilder::new(name.clone(), widget_type);
        entry.options = options;
        entry.lineage = self.lineage.clone();
        self.children.insert(name, entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FormBuilder> {
        self.children.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Detach an entry, keeping the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<FormBuilder> {
        self.children.shift_remove(name)
    }

    /// Create a nested form scope registered under `name` and return it.
    pub fn build(
        &mut self,
        name: impl Into<String>,
        base_type: impl Into<String>,
    ) -> &mut FormBuilder {
        let child = self.scope(name, base_type);
        self.insert(child)
    }

    /// A nested form scope that shares this scope's lineage but is not
    /// registered yet.
    pub fn scope(&self, name: impl Into<String>, base_type: impl Into<String>) -> FormBuilder {
        let mut child = FormBuilder::new(name, base_type);
        child.lineage = self.lineage.clone();
        child
    }

    /// Register `child` under its own name, replacing any entry there.
    pub fn insert(&mut self, child: FormBuilder) -> &mut FormBuilder {
        match self.children.entry(child.name.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(child);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(child),
        }
    }

    pub fn children(&self) -> impl Iterator<Item = &FormBuilder> {
        self.children.values()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Model classes entered through inline forms, outermost first.
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// Record that this scope edits an instance of `class`.
    pub fn enter(&mut self, class: impl Into<String>) {
        self.lineage.push(class.into());
    }
}
