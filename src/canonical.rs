//! Canonical form of a document.
//!
//! Canonicalization runs in four stages, each a pure function of its input:
//!
//! 1. expansion: compact names become absolute IRIs, identifiers and types
//!    become references;
//! 2. coercion: values of properties with a declared datatype become IRI
//!    references or typed literals;
//! 3. flattening: every embedded object becomes a subject of its own, its
//!    parent keeping a reference. Objects without an identity get blank node
//!    labels `_:b0`, `_:b1`, … in traversal order;
//! 4. serialization: sorted, de-duplicated N-Quads.
//!
//! Stages 1 and 2 happen in a single pass since coercion only depends on the
//! expanded property.

use std::collections::{BTreeMap, HashSet};

use log::{debug, warn};

use crate::context::{unwrap_marker, Context, Datatype, RDF_TYPE};
use crate::error::Error;
use crate::rdf::{self, BlankNodeLabel, DataSet, IriRef, Statement, StringLiteral};
use crate::value::{
    Document, Literal, Value, AT_CONTEXT, AT_GRAPH, AT_ID, AT_LANGUAGE, AT_TYPE, AT_VALUE,
};

/// Prefix of issued blank node labels.
const BLANK_NODE_PREFIX: &str = "_:b";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Reference {
    Iri(String),
    Blank(String),
}

impl Reference {
    fn parse(iri: String) -> Self {
        if iri.starts_with("_:") {
            Self::Blank(iri)
        } else {
            Self::Iri(iri)
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Iri(iri) => iri,
            Self::Blank(label) => label,
        }
    }
}

#[derive(Debug, Clone)]
enum Item {
    Reference(Reference),
    Literal(rdf::Literal),
    Node(Node),
}

/// Expanded and coerced object.
#[derive(Debug, Clone, Default)]
struct Node {
    id: Option<Reference>,
    properties: BTreeMap<String, Vec<Item>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Term {
    Reference(Reference),
    Literal(rdf::Literal),
}

/// Flattened document: subjects with their (de-duplicated) property values.
type Subjects = BTreeMap<Reference, BTreeMap<String, Vec<Term>>>;

/// Canonical N-Quads form of `document` under `context`.
///
/// The document is never modified. Documents carrying a top-level `@context`
/// are processed against a copy of `context` refined by it.
pub fn canonicalize(document: &Document, context: &Context) -> Result<Vec<u8>, Error> {
    let nquads = to_dataset(document, context)?.to_nquads();
    debug!("canonical form is {} bytes", nquads.len());
    Ok(nquads.into_bytes())
}

/// Flattened document as minimal JSON with keys sorted at every level.
///
/// A single subject renders as an object, several as `{"@graph": [...]}`, and
/// an empty document as `{}`.
pub fn canonicalize_json(document: &Document, context: &Context) -> Result<String, Error> {
    let subjects = flatten(document, context)?;
    let mut rendered: Vec<Value> = subjects
        .iter()
        .map(|(subject, properties)| Value::Object(render_subject(subject, properties)))
        .collect();
    let root = match rendered.len() {
        0 => Document::new(),
        1 => match rendered.pop() {
            Some(Value::Object(subject)) => subject,
            _ => Document::new(),
        },
        _ => {
            let mut root = Document::new();
            root.insert(AT_GRAPH, rendered);
            root
        }
    };
    root.to_json()
}

/// Statements of the flattened document.
pub fn to_dataset(document: &Document, context: &Context) -> Result<DataSet, Error> {
    let subjects = flatten(document, context)?;
    let mut dataset = DataSet::default();
    for (subject, properties) in &subjects {
        let subject = match subject {
            Reference::Iri(iri) => rdf::Subject::IriRef(IriRef(iri.clone())),
            Reference::Blank(label) => rdf::Subject::BlankNodeLabel(BlankNodeLabel(label.clone())),
        };
        for (predicate, terms) in properties {
            for term in terms {
                let object = match term {
                    Term::Reference(Reference::Iri(iri)) => rdf::Object::IriRef(IriRef(iri.clone())),
                    Term::Reference(Reference::Blank(label)) => {
                        rdf::Object::BlankNodeLabel(BlankNodeLabel(label.clone()))
                    }
                    Term::Literal(literal) => rdf::Object::Literal(literal.clone()),
                };
                dataset.statements.push(Statement {
                    subject: subject.clone(),
                    predicate: IriRef(predicate.clone()),
                    object,
                });
            }
        }
    }
    debug!(
        "{} subjects, {} statements",
        subjects.len(),
        dataset.statements.len()
    );
    Ok(dataset)
}

fn flatten(document: &Document, context: &Context) -> Result<Subjects, Error> {
    let context = context.for_document(document)?;
    let nodes = expand_document(document, &context)?;
    let mut flattener = Flattener::default();
    for node in nodes {
        flattener.flatten_node(node);
    }
    Ok(flattener.subjects)
}

/// Top-level subjects: the document itself and the members of its `@graph`.
fn expand_document(document: &Document, context: &Context) -> Result<Vec<Node>, Error> {
    let mut nodes = Vec::new();
    let mut top = Document::new();
    for (key, value) in document {
        match context.expand_property(key).as_str() {
            AT_CONTEXT => {}
            AT_GRAPH => {
                for member in value.iter() {
                    match member {
                        Value::Object(member) => nodes.push(expand_node(member, context)?),
                        _ => {
                            return Err(Error::InvalidDocument(
                                "@graph members must be objects".to_string(),
                            ))
                        }
                    }
                }
            }
            _ => {
                top.insert(key.clone(), value.clone());
            }
        }
    }
    if !top.is_empty() {
        nodes.insert(0, expand_node(&top, context)?);
    }
    Ok(nodes)
}

fn expand_node(object: &Document, context: &Context) -> Result<Node, Error> {
    let mut node = Node::default();
    for (key, value) in object {
        let property = context.expand_property(key);
        match property.as_str() {
            AT_CONTEXT => warn!("ignoring embedded @context"),
            AT_ID => match value.as_str() {
                Some(id) => node.id = Some(Reference::parse(context.expand_iri(id, false))),
                None => return Err(Error::InvalidDocument("@id must be a string".to_string())),
            },
            AT_TYPE | RDF_TYPE => {
                let types = node.properties.entry(RDF_TYPE.to_owned()).or_default();
                for type_ in value.iter() {
                    let type_ = type_.as_str().ok_or_else(|| {
                        Error::InvalidDocument("@type values must be strings".to_string())
                    })?;
                    types.push(Item::Reference(Reference::parse(
                        context.expand_iri(type_, true),
                    )));
                }
            }
            keyword if keyword.starts_with('@') => {
                return Err(Error::InvalidDocument(format!(
                    "unsupported keyword `{}` in node object",
                    keyword
                )))
            }
            _ => {
                let mut items = Vec::new();
                expand_values(&property, value, context, &mut items)?;
                node.properties.entry(property).or_default().extend(items);
            }
        }
    }
    Ok(node)
}

fn expand_values(
    property: &str,
    value: &Value,
    context: &Context,
    items: &mut Vec<Item>,
) -> Result<(), Error> {
    match value {
        Value::Array(values) => {
            for value in values {
                expand_values(property, value, context, items)?;
            }
        }
        Value::Literal(literal) => items.push(coerce(property, literal, context)),
        Value::Object(object) => items.push(expand_object(object, context)?),
    }
    Ok(())
}

/// Apply the datatype declared for `property` to a literal value.
fn coerce(property: &str, literal: &Literal, context: &Context) -> Item {
    let datatype = context.datatype(property);
    match literal {
        Literal::String(s) => {
            if let Some(iri) = unwrap_marker(s) {
                return Item::Reference(Reference::parse(context.expand_iri(iri, false)));
            }
            match datatype {
                Some(Datatype::Iri) => {
                    Item::Reference(Reference::parse(context.expand_iri(s, false)))
                }
                Some(Datatype::Vocab) => {
                    Item::Reference(Reference::parse(context.expand_iri(s, true)))
                }
                Some(Datatype::Typed(type_)) => Item::Literal(rdf::Literal::typed(s.clone(), type_)),
                None => Item::Literal(rdf::Literal::String {
                    string: StringLiteral(s.clone()),
                }),
            }
        }
        Literal::Integer(i) => match datatype {
            Some(Datatype::Typed(type_)) => Item::Literal(rdf::Literal::typed(i.to_string(), type_)),
            _ => Item::Literal(rdf::Literal::from(*i)),
        },
        Literal::Boolean(b) => match datatype {
            Some(Datatype::Typed(type_)) => Item::Literal(rdf::Literal::typed(b.to_string(), type_)),
            _ => Item::Literal(rdf::Literal::from(*b)),
        },
    }
}

/// Embedded object: a value object, a reference, or a node.
fn expand_object(object: &Document, context: &Context) -> Result<Item, Error> {
    let keys: Vec<String> = object
        .keys()
        .map(|key| context.expand_property(key))
        .collect();
    if keys.iter().any(|key| key == AT_VALUE) {
        return expand_value_object(object, context).map(Item::Literal);
    }
    if keys.len() == 1 && keys[0] == AT_ID {
        if let Some(id) = object.iter().next().and_then(|(_, id)| id.as_str()) {
            return Ok(Item::Reference(Reference::parse(context.expand_iri(id, false))));
        }
    }
    expand_node(object, context).map(Item::Node)
}

fn expand_value_object(object: &Document, context: &Context) -> Result<rdf::Literal, Error> {
    let mut value = None;
    let mut type_ = None;
    let mut language = None;
    for (key, v) in object {
        match context.expand_property(key).as_str() {
            AT_VALUE => value = Some(v),
            AT_TYPE => {
                type_ = Some(v.as_str().ok_or_else(|| {
                    Error::InvalidDocument("@type of a value object must be a string".to_string())
                })?)
            }
            AT_LANGUAGE => {
                language = Some(v.as_str().ok_or_else(|| {
                    Error::InvalidDocument("@language must be a string".to_string())
                })?)
            }
            other => {
                return Err(Error::InvalidDocument(format!(
                    "unexpected `{}` in value object",
                    other
                )))
            }
        }
    }
    let value = match value {
        Some(Value::Literal(literal)) => literal,
        _ => {
            return Err(Error::InvalidDocument(
                "@value must be a string, integer or boolean".to_string(),
            ))
        }
    };
    Ok(match (value, type_, language) {
        (_, Some(_), Some(_)) => {
            return Err(Error::InvalidDocument(
                "value object with both @type and @language".to_string(),
            ))
        }
        (value, Some(type_), None) => {
            let string = match value {
                Literal::String(s) => s.clone(),
                Literal::Integer(i) => i.to_string(),
                Literal::Boolean(b) => b.to_string(),
            };
            rdf::Literal::typed(string, &context.expand_iri(type_, true))
        }
        (Literal::String(s), None, Some(lang)) => rdf::Literal::LangTagged {
            string: StringLiteral(s.clone()),
            lang: lang.to_owned(),
        },
        (Literal::String(s), None, None) => rdf::Literal::String {
            string: StringLiteral(s.clone()),
        },
        (Literal::Integer(i), None, _) => rdf::Literal::from(*i),
        (Literal::Boolean(b), None, _) => rdf::Literal::from(*b),
    })
}

/// Issues `_:b<n>` labels, remembering the label given to each blank node
/// identifier found in the input.
#[derive(Debug, Clone, Default)]
struct IdentifierIssuer {
    counter: u64,
    issued: BTreeMap<String, String>,
}

impl IdentifierIssuer {
    fn issue(&mut self, existing: Option<&str>) -> String {
        if let Some(label) = existing.and_then(|existing| self.issued.get(existing)) {
            return label.clone();
        }
        let label = format!("{}{}", BLANK_NODE_PREFIX, self.counter);
        self.counter += 1;
        if let Some(existing) = existing {
            self.issued.insert(existing.to_owned(), label.clone());
        }
        label
    }

    fn relabel(&mut self, reference: Reference) -> Reference {
        match reference {
            Reference::Blank(label) => Reference::Blank(self.issue(Some(&label))),
            iri => iri,
        }
    }
}

#[derive(Debug, Default)]
struct Flattener {
    issuer: IdentifierIssuer,
    subjects: Subjects,
    seen: HashSet<(Reference, String, Term)>,
}

impl Flattener {
    /// Lift `node` and everything embedded in it to subjects, pre-order.
    fn flatten_node(&mut self, node: Node) -> Reference {
        let subject = match node.id {
            Some(id) => self.issuer.relabel(id),
            None => Reference::Blank(self.issuer.issue(None)),
        };
        self.subjects.entry(subject.clone()).or_default();
        for (property, items) in node.properties {
            for item in items {
                let term = match item {
                    Item::Reference(reference) => Term::Reference(self.issuer.relabel(reference)),
                    Item::Literal(literal) => Term::Literal(literal),
                    Item::Node(node) => Term::Reference(self.flatten_node(node)),
                };
                if !self
                    .seen
                    .insert((subject.clone(), property.clone(), term.clone()))
                {
                    continue;
                }
                self.subjects
                    .entry(subject.clone())
                    .or_default()
                    .entry(property.clone())
                    .or_default()
                    .push(term);
            }
        }
        subject
    }
}

fn render_subject(subject: &Reference, properties: &BTreeMap<String, Vec<Term>>) -> Document {
    let mut rendered = Document::new();
    rendered.insert(AT_ID, subject.as_str());
    for (property, terms) in properties {
        let (key, values): (&str, Vec<Value>) = if property == RDF_TYPE {
            let types = terms
                .iter()
                .map(|term| match term {
                    Term::Reference(reference) => Value::from(reference.as_str()),
                    Term::Literal(literal) => render_literal(literal),
                })
                .collect();
            (AT_TYPE, types)
        } else {
            (property.as_str(), terms.iter().map(render_term).collect())
        };
        match <[Value; 1]>::try_from(values) {
            Ok([value]) => rendered.insert(key, value),
            Err(values) => rendered.insert(key, values),
        };
    }
    rendered
}

fn render_term(term: &Term) -> Value {
    match term {
        Term::Reference(reference) => {
            let mut object = Document::new();
            object.insert(AT_ID, reference.as_str());
            Value::Object(object)
        }
        Term::Literal(literal) => render_literal(literal),
    }
}

fn render_literal(literal: &rdf::Literal) -> Value {
    match literal {
        rdf::Literal::String { string } => Value::from(string.0.as_str()),
        rdf::Literal::Typed { string, type_ } => {
            let mut object = Document::new();
            object.insert(AT_VALUE, string.0.as_str());
            object.insert(AT_TYPE, type_.0.as_str());
            Value::Object(object)
        }
        rdf::Literal::LangTagged { string, lang } => {
            let mut object = Document::new();
            object.insert(AT_VALUE, string.0.as_str());
            object.insert(AT_LANGUAGE, lang.as_str());
            Value::Object(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{PAYSWARM_V1_CONTEXT, XSD_DATETIME};
    use serde_json::json;

    fn doc(json: serde_json::Value) -> Document {
        Document::try_from(json).unwrap()
    }

    fn nquads(json: serde_json::Value) -> String {
        let bytes = canonicalize(&doc(json), Context::payswarm_v1()).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn reference_example() {
        let canonical = nquads(json!({
            "@context": [
                PAYSWARM_V1_CONTEXT,
                {"ex": "http://example.com/", "id": "http://example.com/id/"}
            ],
            "@id": "id:1",
            "ex:foo": "bar"
        }));
        assert_eq!(
            canonical,
            "<http://example.com/id/1> <http://example.com/foo> \"bar\" .\n"
        );
    }

    #[test]
    fn prefix_spelling_irrelevant() {
        let compact = nquads(json!({
            "id": "urn:x",
            "dc:title": "T",
            "ps:validFrom": {"@value": "2012-01-01T00:00:00Z", "@type": "xsd:dateTime"}
        }));
        let expanded = nquads(json!({
            "https://w3id.org/payswarm#validFrom": {
                "@type": XSD_DATETIME,
                "@value": "2012-01-01T00:00:00Z"
            },
            "http://purl.org/dc/terms/title": "T",
            "@id": "urn:x"
        }));
        assert_eq!(compact, expanded);
    }

    #[test]
    fn coercion() {
        let canonical = nquads(json!({
            "id": "urn:x",
            "created": "2012-01-01T00:00:00Z",
            "creator": "https://example.com/keys/1",
            "currency": "USD",
            "ex:n": 5,
            "ex:b": true
        }));
        assert_eq!(
            canonical,
            concat!(
                "<urn:x> <ex:b> \"true\"^^<http://www.w3.org/2001/XMLSchema#boolean> .\n",
                "<urn:x> <ex:n> \"5\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n",
                "<urn:x> <http://purl.org/dc/terms/created> \"2012-01-01T00:00:00Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .\n",
                "<urn:x> <http://purl.org/dc/terms/creator> <https://example.com/keys/1> .\n",
                "<urn:x> <https://w3id.org/commerce#currency> <https://w3id.org/currencies/USD> .\n",
            )
        );
    }

    #[test]
    fn embedded_objects_flattened() {
        let canonical = nquads(json!({
            "id": "urn:x",
            "ps:asset": {
                "id": "urn:asset",
                "dc:title": "Song"
            },
            "ps:license": {
                "dc:title": "CC",
                "ps:terms": {"dc:title": "deep"}
            }
        }));
        assert_eq!(
            canonical,
            concat!(
                "<urn:asset> <http://purl.org/dc/terms/title> \"Song\" .\n",
                "<urn:x> <https://w3id.org/payswarm#asset> <urn:asset> .\n",
                "<urn:x> <https://w3id.org/payswarm#license> _:b0 .\n",
                "_:b0 <http://purl.org/dc/terms/title> \"CC\" .\n",
                "_:b0 <https://w3id.org/payswarm#terms> _:b1 .\n",
                "_:b1 <http://purl.org/dc/terms/title> \"deep\" .\n",
            )
        );
    }

    #[test]
    fn type_shorthand_and_marker() {
        let canonical = nquads(json!({
            "@id": "<urn:x>",
            "a": "ps:Asset",
            "dc:source": "<ps:origin>",
            "type": ["Listing"]
        }));
        assert_eq!(
            canonical,
            concat!(
                "<urn:x> <http://purl.org/dc/terms/source> <https://w3id.org/payswarm#origin> .\n",
                "<urn:x> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://w3id.org/payswarm#Asset> .\n",
                "<urn:x> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://w3id.org/payswarm#Listing> .\n",
            )
        );
    }

    #[test]
    fn blank_node_labels_relabeled() {
        let canonical = nquads(json!({
            "@graph": [
                {"@id": "_:x", "dc:title": "a", "dc:relation": {"@id": "_:y"}},
                {"@id": "_:y", "dc:title": "b"}
            ]
        }));
        assert_eq!(
            canonical,
            concat!(
                "_:b0 <http://purl.org/dc/terms/relation> _:b1 .\n",
                "_:b0 <http://purl.org/dc/terms/title> \"a\" .\n",
                "_:b1 <http://purl.org/dc/terms/title> \"b\" .\n",
            )
        );
    }

    #[test]
    fn repeated_values_collapse() {
        let titles: Vec<String> = (0..5000).map(|i| format!("t{}", i % 100)).collect();
        let document = doc(json!({
            "@graph": [
                {"id": "urn:x", "dc:title": titles},
                {"id": "urn:x", "dc:title": ["t0", "new"]}
            ]
        }));
        let subjects = flatten(&document, Context::payswarm_v1()).unwrap();
        let terms = &subjects[&Reference::Iri("urn:x".to_string())]
            ["http://purl.org/dc/terms/title"];
        assert_eq!(terms.len(), 101);
        assert_eq!(
            terms[0],
            Term::Literal(rdf::Literal::String {
                string: StringLiteral("t0".to_string())
            })
        );
        assert_eq!(
            terms[100],
            Term::Literal(rdf::Literal::String {
                string: StringLiteral("new".to_string())
            })
        );
    }

    #[test]
    fn json_form() {
        let context = Context::payswarm_v1();
        assert_eq!(canonicalize_json(&Document::new(), context).unwrap(), "{}");
        let json = canonicalize_json(
            &doc(json!({"id": "urn:x", "dc:title": ["b", "a", "b"], "a": "Asset"})),
            context,
        )
        .unwrap();
        assert_eq!(
            json,
            r#"{"@id":"urn:x","@type":"https://w3id.org/payswarm#Asset","http://purl.org/dc/terms/title":["b","a"]}"#
        );
        let json = canonicalize_json(
            &doc(json!({"id": "urn:x", "ps:asset": {"dc:title": "t"}})),
            context,
        )
        .unwrap();
        assert_eq!(
            json,
            r#"{"@graph":[{"@id":"urn:x","https://w3id.org/payswarm#asset":{"@id":"_:b0"}},{"@id":"_:b0","http://purl.org/dc/terms/title":"t"}]}"#
        );
    }

    #[test]
    fn empty_document() {
        assert!(nquads(json!({})).is_empty());
        assert!(nquads(json!({"@context": PAYSWARM_V1_CONTEXT})).is_empty());
    }

    #[test]
    fn input_untouched() {
        let input = doc(json!({"id": "urn:x", "ps:asset": {"dc:title": "t"}}));
        let copy = input.clone();
        canonicalize(&input, Context::payswarm_v1()).unwrap();
        assert_eq!(input, copy);
    }

    #[test]
    fn unsupported_keywords() {
        let context = Context::payswarm_v1();
        assert!(canonicalize(&doc(json!({"@id": 3})), context).is_err());
        assert!(canonicalize(&doc(json!({"ex:a": {"@list": ["x"]}})), context).is_err());
        assert!(canonicalize(
            &doc(json!({"ex:a": {"@value": "x", "@type": "xsd:string", "@language": "en"}})),
            context
        )
        .is_err());
    }
}
