//! Term tables used to expand compact names into IRIs.
//!
//! A [`Context`] maps terms (`created`, `ps`, `id`, …) to IRIs or keywords,
//! and records which expanded properties have their values coerced to IRIs or
//! typed literals. Contexts are immutable once built; a document carrying its
//! own `@context` is processed against a refined copy (see
//! [`Context::for_document`]).

use std::borrow::Cow;
use std::collections::BTreeMap;

use lazy_static::lazy_static;
use log::warn;

use crate::error::Error;
use crate::value::{Document, Literal, Value, AT_CONTEXT, AT_ID, AT_TYPE, AT_VOCAB};

/// <https://w3id.org/payswarm/v1>
pub const PAYSWARM_V1_CONTEXT: &str = "https://w3id.org/payswarm/v1";
const PAYSWARM_V1_JSONLD: &str = include_str!("../contexts/payswarm-v1.jsonld");

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_DATETIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const DC_CREATED: &str = "http://purl.org/dc/terms/created";
pub const DC_CREATOR: &str = "http://purl.org/dc/terms/creator";
pub const SEC_GRAPH_SIGNATURE_2012: &str = "https://w3id.org/security#GraphSignature2012";
pub const SEC_NONCE: &str = "https://w3id.org/security#nonce";
pub const SEC_SIGNATURE: &str = "https://w3id.org/security#signature";
pub const SEC_SIGNATURE_VALUE: &str = "https://w3id.org/security#signatureValue";

/// Shorthand for the type property.
const TYPE_SHORTHAND: &str = "a";

lazy_static! {
    static ref PAYSWARM_V1: Context = {
        let json: serde_json::Value = serde_json::from_str(PAYSWARM_V1_JSONLD).unwrap();
        Context::from_json(Some(PAYSWARM_V1_CONTEXT), &json).unwrap()
    };
}

/// Coercion applied to the values of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datatype {
    /// `"@type": "@id"`: string values are IRI references.
    Iri,
    /// `"@type": "@vocab"`: string values are IRI references, and may be terms.
    Vocab,
    /// Any other `@type`: values are literals of the given datatype IRI.
    Typed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDefinition {
    /// Absolute IRI, or keyword for aliases such as `id` → `@id`.
    pub iri: String,
    pub datatype: Option<Datatype>,
}

impl TermDefinition {
    fn is_keyword_alias(&self) -> bool {
        self.iri.starts_with('@')
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    url: Option<String>,
    terms: BTreeMap<String, TermDefinition>,
    /// Expanded property IRI → coercion.
    datatypes: BTreeMap<String, Datatype>,
}

impl Context {
    /// Empty context, optionally identified by `url`.
    pub fn new(url: Option<&str>) -> Self {
        Self {
            url: url.map(ToOwned::to_owned),
            ..Default::default()
        }
    }

    /// Built-in `https://w3id.org/payswarm/v1` context.
    pub fn payswarm_v1() -> &'static Context {
        &PAYSWARM_V1
    }

    /// Look up a built-in context by URL.
    pub fn builtin(url: &str) -> Option<&'static Context> {
        match url {
            PAYSWARM_V1_CONTEXT => Some(Self::payswarm_v1()),
            _ => None,
        }
    }

    /// Build a context from a JSON-LD context definition, either a bare term
    /// object or a document holding one under `@context`.
    pub fn from_json(url: Option<&str>, json: &serde_json::Value) -> Result<Self, Error> {
        let definitions = match json.get(AT_CONTEXT) {
            Some(inner) => inner,
            None => json,
        };
        let mut context = Self::new(url);
        context.merge(definitions)?;
        Ok(context)
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermDefinition)> {
        self.terms.iter().map(|(term, def)| (term.as_str(), def))
    }

    /// Coercion declared for an expanded property IRI.
    pub fn datatype(&self, property: &str) -> Option<&Datatype> {
        self.datatypes.get(property)
    }

    /// Add the term definitions of a JSON-LD context object, replacing
    /// existing definitions of the same terms.
    pub fn merge(&mut self, definitions: &serde_json::Value) -> Result<(), Error> {
        use serde_json::Value as Json;
        let entries = match definitions {
            Json::Object(entries) => entries,
            Json::Array(items) => {
                for item in items {
                    self.merge(item)?;
                }
                return Ok(());
            }
            _ => {
                return Err(Error::InvalidContext(
                    "expected a context object".to_string(),
                ))
            }
        };

        // Insert every raw definition first so that definitions may refer to
        // prefixes declared in the same object.
        let mut pending = Vec::with_capacity(entries.len());
        for (term, definition) in entries {
            if term.starts_with('@') {
                warn!("ignoring unsupported context keyword `{}`", term);
                continue;
            }
            let (iri, type_) = match definition {
                Json::Null => {
                    self.terms.remove(term);
                    continue;
                }
                Json::String(iri) => (iri.clone(), None),
                Json::Object(expanded) => {
                    let iri = match expanded.get(AT_ID) {
                        Some(Json::String(iri)) => iri.clone(),
                        None => term.clone(),
                        Some(_) => {
                            return Err(Error::InvalidContext(format!(
                                "invalid @id for term `{}`",
                                term
                            )))
                        }
                    };
                    let type_ = match expanded.get(AT_TYPE) {
                        Some(Json::String(type_)) => Some(type_.clone()),
                        None => None,
                        Some(_) => {
                            return Err(Error::InvalidContext(format!(
                                "invalid @type for term `{}`",
                                term
                            )))
                        }
                    };
                    (iri, type_)
                }
                _ => {
                    return Err(Error::InvalidContext(format!(
                        "invalid definition for term `{}`",
                        term
                    )))
                }
            };
            self.terms.insert(
                term.clone(),
                TermDefinition {
                    iri: iri.clone(),
                    datatype: None,
                },
            );
            pending.push((term, iri, type_));
        }

        for (term, iri, type_) in pending {
            let iri = if iri.starts_with('@') {
                iri
            } else {
                self.expand_compact(&iri)
            };
            let datatype = type_.map(|type_| match type_.as_str() {
                AT_ID => Datatype::Iri,
                AT_VOCAB => Datatype::Vocab,
                other => Datatype::Typed(self.expand_compact(other)),
            });
            self.terms
                .insert(term.clone(), TermDefinition { iri, datatype });
        }

        self.rebuild_datatypes();
        Ok(())
    }

    /// Add every term of `other` to this context.
    pub fn import(&mut self, other: &Context) {
        for (term, definition) in &other.terms {
            self.terms.insert(term.clone(), definition.clone());
        }
        self.rebuild_datatypes();
    }

    fn rebuild_datatypes(&mut self) {
        self.datatypes = self
            .terms
            .values()
            .filter(|def| !def.is_keyword_alias())
            .filter_map(|def| Some((def.iri.clone(), def.datatype.clone()?)))
            .collect();
    }

    /// Context in effect for `document`: this context refined by the
    /// document's top-level `@context`, if any.
    pub fn for_document(&self, document: &Document) -> Result<Cow<'_, Context>, Error> {
        match document.get(AT_CONTEXT) {
            None => Ok(Cow::Borrowed(self)),
            Some(local) => {
                let mut context = self.clone();
                context.apply(local)?;
                Ok(Cow::Owned(context))
            }
        }
    }

    fn apply(&mut self, local: &Value) -> Result<(), Error> {
        match local {
            Value::Literal(Literal::String(url)) => {
                if self.url.as_deref() == Some(url.as_str()) {
                    return Ok(());
                }
                match Self::builtin(url) {
                    Some(builtin) => self.import(builtin),
                    None => warn!("ignoring unknown remote context `{}`", url),
                }
                Ok(())
            }
            Value::Array(items) => items.iter().try_for_each(|item| self.apply(item)),
            Value::Object(definitions) => self.merge(&serde_json::to_value(definitions)?),
            Value::Literal(_) => Err(Error::InvalidContext(
                "expected a context URL or object".to_string(),
            )),
        }
    }

    /// Expand a property name: keywords and keyword aliases yield the keyword,
    /// terms yield their IRI, compact IRIs are expanded and anything else is
    /// returned unchanged.
    pub fn expand_property(&self, key: &str) -> String {
        if key.starts_with('@') {
            return key.to_owned();
        }
        if let Some(definition) = self.terms.get(key) {
            return definition.iri.clone();
        }
        if key == TYPE_SHORTHAND {
            return RDF_TYPE.to_owned();
        }
        self.expand_compact(key)
    }

    /// Expand an IRI-valued literal. `vocab` allows whole terms to be used
    /// (type values, `@vocab`-coerced properties). A value written as `<…>`
    /// is unwrapped first.
    pub fn expand_iri(&self, value: &str, vocab: bool) -> String {
        let value = unwrap_marker(value).unwrap_or(value);
        if vocab {
            if let Some(definition) = self.terms.get(value) {
                if !definition.is_keyword_alias() {
                    return definition.iri.clone();
                }
            }
        }
        self.expand_compact(value)
    }

    /// Expand `prefix:suffix` when `prefix` is a term; return anything else
    /// unchanged.
    fn expand_compact(&self, value: &str) -> String {
        self.expand_compact_depth(value, 0)
    }

    fn expand_compact_depth(&self, value: &str, depth: usize) -> String {
        let (prefix, suffix) = match value.split_once(':') {
            Some(parts) => parts,
            None => return value.to_owned(),
        };
        // `scheme://…` is already absolute, `_:` names a blank node.
        if suffix.starts_with("//") || prefix == "_" {
            return value.to_owned();
        }
        match self.terms.get(prefix) {
            Some(definition) if !definition.is_keyword_alias() && depth < 8 => {
                let root = self.expand_compact_depth(&definition.iri, depth + 1);
                root + suffix
            }
            _ => value.to_owned(),
        }
    }

    /// Shortest term naming `iri` (or the keyword), falling back to `iri`
    /// itself.
    pub fn compact_iri(&self, iri: &str) -> String {
        self.terms
            .iter()
            .filter(|(_, def)| def.iri == iri)
            .map(|(term, _)| term)
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .cloned()
            .unwrap_or_else(|| iri.to_owned())
    }
}

/// Strip the `<…>` identifier marker.
pub(crate) fn unwrap_marker(value: &str) -> Option<&str> {
    value
        .strip_prefix('<')
        .and_then(|value| value.strip_suffix('>'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payswarm_v1_loads() {
        let context = Context::payswarm_v1();
        assert_eq!(context.url(), Some(PAYSWARM_V1_CONTEXT));
        assert_eq!(context.expand_property("id"), AT_ID);
        assert_eq!(context.expand_property("type"), AT_TYPE);
        assert_eq!(context.expand_property("created"), DC_CREATED);
        assert_eq!(context.expand_property("signature"), SEC_SIGNATURE);
        assert_eq!(
            context.expand_property("ps:asset"),
            "https://w3id.org/payswarm#asset"
        );
        assert_eq!(
            context.datatype(DC_CREATED),
            Some(&Datatype::Typed(XSD_DATETIME.to_string()))
        );
        assert_eq!(context.datatype(DC_CREATOR), Some(&Datatype::Iri));
        assert_eq!(
            context.datatype("https://w3id.org/commerce#currency"),
            Some(&Datatype::Vocab)
        );
        assert_eq!(context.datatype("http://purl.org/dc/terms/title"), None);
    }

    #[test]
    fn pass_through() {
        let context = Context::payswarm_v1();
        assert_eq!(context.expand_property("nope:foo"), "nope:foo");
        assert_eq!(
            context.expand_property("http://example.com/foo"),
            "http://example.com/foo"
        );
        assert_eq!(context.expand_property("a"), RDF_TYPE);
        assert_eq!(
            context.expand_iri("<dc:title>", false),
            "http://purl.org/dc/terms/title"
        );
        assert_eq!(context.expand_iri("_:x", false), "_:x");
        // Terms only expand in vocabulary position.
        assert_eq!(context.expand_iri("Asset", false), "Asset");
        assert_eq!(
            context.expand_iri("Asset", true),
            "https://w3id.org/payswarm#Asset"
        );
    }

    #[test]
    fn local_context_overrides_alias() {
        let doc = Document::try_from(json!({"@context": [
            PAYSWARM_V1_CONTEXT,
            {"ex": "http://example.com/", "id": "http://example.com/id/"}
        ]}))
        .unwrap();
        let base = Context::payswarm_v1();
        let context = base.for_document(&doc).unwrap();
        assert_eq!(context.expand_iri("id:1", false), "http://example.com/id/1");
        assert_eq!(context.expand_property("ex:foo"), "http://example.com/foo");
        // The shared context is untouched.
        assert_eq!(base.expand_property("id"), AT_ID);
    }

    #[test]
    fn builtin_import() {
        let empty = Context::new(None);
        let mut doc = Document::new();
        doc.insert(AT_CONTEXT, PAYSWARM_V1_CONTEXT);
        let context = empty.for_document(&doc).unwrap();
        assert_eq!(context.expand_property("creator"), DC_CREATOR);
        assert_eq!(context.datatype(DC_CREATOR), Some(&Datatype::Iri));
    }

    #[test]
    fn compact() {
        let context = Context::payswarm_v1();
        assert_eq!(context.compact_iri(SEC_SIGNATURE), "signature");
        assert_eq!(context.compact_iri(AT_TYPE), "type");
        assert_eq!(context.compact_iri("http://example.com/x"), "http://example.com/x");
        assert_eq!(Context::new(None).compact_iri(AT_TYPE), AT_TYPE);
    }

    #[test]
    fn invalid_definitions() {
        assert!(Context::from_json(None, &json!("nope")).is_err());
        assert!(Context::from_json(None, &json!({"ex": 3})).is_err());
        assert!(Context::from_json(None, &json!({"ex": {"@type": 3}})).is_err());
    }
}
