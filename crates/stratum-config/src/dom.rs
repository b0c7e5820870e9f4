//! Merging XML fragments into one document.
//!
//! Every incoming element is matched against the existing tree by its path
//! and, when the path has an id attribute registered in [`IdAttributes`], by
//! the value of that attribute:
//!
//! | candidates | keyed | un-keyed |
//! |------------|-------|----------|
//! | none | appended, with its whole subtree | appended |
//! | one | merged into the candidate | merged into the candidate |
//! | several | [`DomError::AmbiguousMatch`] | appended |
//!
//! An element is un-keyed when its path has no id rule or it lacks the id
//! attribute. A lone un-keyed sibling of the same name is treated as a
//! singleton and overridden, so two distinct `<type>` elements without an id
//! rule collapse into one. Register an id attribute for repeatable elements.
//!
//! Merging into a matched element copies attributes over. Pure text replaces
//! the content and child elements recurse. In mixed content each text node
//! overwrites the existing text node at the same position; extra ones are
//! appended and stale ones dropped.
//!
//! ```rust
//! use std::sync::Arc;
//! use stratum_config::{DocumentFactory, IdAttributes, MergeDocument, StandardDocumentFactory};
//!
//! let ids: IdAttributes = [("/config/type", "name")].into_iter().collect();
//! let mut dom = StandardDocumentFactory
//!     .create(r#"<config><type name="A" shared="true"/></config>"#, Arc::new(ids), None)
//!     .unwrap();
//! dom.merge(r#"<config><type name="A" shared="false"/><type name="B"/></config>"#)
//!     .unwrap();
//!
//! let types = dom.root().get_children("type");
//! assert_eq!(types.len(), 2);
//! assert_eq!(types[0].get_attribute("shared"), Some("false"));
//! ```

use crate::error::DomError;
use crate::id_attributes::IdAttributes;
use crate::schema::{DocumentSchema, SchemaRef};
use std::sync::Arc;
use stratum_xml::{Span, XmlAttribute, XmlChild, XmlChildren, XmlElement};

/// A document that further fragments can be folded into.
pub trait MergeDocument {
    /// Parse `content` and reconcile it into this document.
    fn merge(&mut self, content: &str) -> Result<(), DomError>;

    /// Check the current tree against `schema`, returning every violation.
    fn validate(&self, schema: &dyn DocumentSchema) -> Vec<String>;

    fn root(&self) -> &XmlElement;

    fn into_root(self) -> XmlElement;
}

/// Builds the document for the first file of a read.
pub trait DocumentFactory {
    type Document: MergeDocument;

    fn create(
        &self,
        initial: &str,
        id_attributes: Arc<IdAttributes>,
        per_file_schema: Option<SchemaRef>,
    ) -> Result<Self::Document, DomError>;
}

/// Factory for [`ConfigDom`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDocumentFactory;

impl DocumentFactory for StandardDocumentFactory {
    type Document = ConfigDom;

    fn create(
        &self,
        initial: &str,
        id_attributes: Arc<IdAttributes>,
        per_file_schema: Option<SchemaRef>,
    ) -> Result<ConfigDom, DomError> {
        ConfigDom::new(initial, id_attributes, per_file_schema)
    }
}

/// The standard merged document.
#[derive(Debug, Clone)]
pub struct ConfigDom {
    root: XmlElement,
    id_attributes: Arc<IdAttributes>,
    per_file_schema: Option<SchemaRef>,
}

impl ConfigDom {
    pub fn new(
        initial: &str,
        id_attributes: Arc<IdAttributes>,
        per_file_schema: Option<SchemaRef>,
    ) -> Result<Self, DomError> {
        let root = load(initial, per_file_schema.as_deref())?;
        Ok(Self {
            root,
            id_attributes,
            per_file_schema,
        })
    }

    pub fn id_attributes(&self) -> &IdAttributes {
        &self.id_attributes
    }
}

impl MergeDocument for ConfigDom {
    fn merge(&mut self, content: &str) -> Result<(), DomError> {
        let incoming = load(content, self.per_file_schema.as_deref())?;
        if incoming.name != self.root.name {
            return Err(DomError::RootMismatch {
                expected: self.root.name.clone(),
                found: incoming.name,
            });
        }

        let path = format!("/{}", incoming.name);
        merge_matched(&mut self.root, incoming, &path, &path, &self.id_attributes)
    }

    fn validate(&self, schema: &dyn DocumentSchema) -> Vec<String> {
        schema.validate(&self.root)
    }

    fn root(&self) -> &XmlElement {
        &self.root
    }

    fn into_root(self) -> XmlElement {
        self.root
    }
}

/// Parse a fragment and check it against the per-file schema.
fn load(content: &str, per_file_schema: Option<&dyn DocumentSchema>) -> Result<XmlElement, DomError> {
    let document = stratum_xml::parse(content)?;
    if let Some(schema) = per_file_schema {
        let violations = schema.validate(&document.root);
        if !violations.is_empty() {
            return Err(DomError::Validation { violations });
        }
    }
    Ok(document.root)
}

/// Reconcile `incoming` into `existing`, which has already been matched.
///
/// `path` is the predicate-free element path used for id lookups, `query`
/// the same path with id predicates, used in error messages.
fn merge_matched(
    existing: &mut XmlElement,
    incoming: XmlElement,
    path: &str,
    query: &str,
    ids: &IdAttributes,
) -> Result<(), DomError> {
    let XmlElement {
        attributes,
        children,
        ..
    } = incoming;

    for attribute in attributes {
        merge_attribute(existing, attribute);
    }

    match children {
        XmlChildren::Empty => Ok(()),
        XmlChildren::Text { content, span } => {
            existing.set_text(content, span);
            Ok(())
        }
        XmlChildren::Elements(elements) => {
            for element in elements {
                merge_child(existing, element, path, query, ids)?;
            }
            Ok(())
        }
        XmlChildren::Mixed(children) => {
            let mut texts = 0;
            for child in children {
                match child {
                    XmlChild::Element(element) => merge_child(existing, element, path, query, ids)?,
                    XmlChild::Text { content, span } => {
                        match text_node_mut(existing, texts) {
                            Some((current, current_span)) => {
                                *current = content;
                                *current_span = span;
                            }
                            None => existing.push_text(content, span),
                        }
                        texts += 1;
                    }
                }
            }
            drop_text_after(existing, texts);
            Ok(())
        }
    }
}

/// The `index`-th text node of `element`.
fn text_node_mut(element: &mut XmlElement, index: usize) -> Option<(&mut String, &mut Span)> {
    match &mut element.children {
        XmlChildren::Text { content, span } if index == 0 => Some((content, span)),
        XmlChildren::Mixed(children) => children
            .iter_mut()
            .filter_map(|child| match child {
                XmlChild::Text { content, span } => Some((content, span)),
                XmlChild::Element(_) => None,
            })
            .nth(index),
        _ => None,
    }
}

/// Remove every text node after the first `keep`.
fn drop_text_after(element: &mut XmlElement, keep: usize) {
    if keep == 0 && element.has_text() {
        element.children = XmlChildren::Empty;
        return;
    }
    let XmlChildren::Mixed(children) = &mut element.children else {
        return;
    };

    let mut seen = 0;
    children.retain(|child| match child {
        XmlChild::Text { .. } => {
            seen += 1;
            seen <= keep
        }
        XmlChild::Element(_) => true,
    });

    if seen > keep && children.iter().all(|child| matches!(child, XmlChild::Element(_))) {
        let elements: Vec<XmlElement> = std::mem::take(children)
            .into_iter()
            .filter_map(|child| match child {
                XmlChild::Element(element) => Some(element),
                XmlChild::Text { .. } => None,
            })
            .collect();
        element.children = if elements.is_empty() {
            XmlChildren::Empty
        } else {
            XmlChildren::Elements(elements)
        };
    }
}

fn merge_attribute(existing: &mut XmlElement, attribute: XmlAttribute) {
    let current = existing
        .attributes
        .iter_mut()
        .find(|a| a.name == attribute.name && a.prefix == attribute.prefix);
    match current {
        Some(current) => {
            current.value = attribute.value;
            current.span = attribute.span;
        }
        None => existing.attributes.push(attribute),
    }
}

fn merge_child(
    parent: &mut XmlElement,
    node: XmlElement,
    parent_path: &str,
    parent_query: &str,
    ids: &IdAttributes,
) -> Result<(), DomError> {
    let path = format!("{}/{}", parent_path, node.name);

    let key = ids
        .get(&path)
        .and_then(|attr| node.get_attribute(attr).map(|value| (attr, value.to_string())));
    let query = match &key {
        Some((attr, value)) => format!("{}/{}[@{}=\"{}\"]", parent_query, node.name, attr, value),
        None => format!("{}/{}", parent_query, node.name),
    };

    let matched = {
        let mut candidates: Vec<&mut XmlElement> = parent
            .all_children_mut()
            .into_iter()
            .filter(|candidate| {
                candidate.name == node.name
                    && match &key {
                        Some((attr, value)) => candidate.get_attribute(attr) == Some(value.as_str()),
                        None => true,
                    }
            })
            .collect();
        match (candidates.len(), &key) {
            (0 | 1, _) => candidates.pop(),
            (_, Some(_)) => return Err(DomError::AmbiguousMatch { query }),
            (_, None) => None,
        }
    };

    match matched {
        Some(existing) => merge_matched(existing, node, &path, &query, ids),
        None => {
            tracing::trace!(query = %query, "Appending new element");
            parent.push_element(node);
            Ok(())
        }
    }
}
