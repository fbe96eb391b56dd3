//! N-Quads statements produced from a flattened document.

use crate::context::{XSD_BOOLEAN, XSD_INTEGER};

// https://www.w3.org/TR/n-quads/#terminals

/// Time format used for `created` timestamps.
pub const W3C_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSet {
    pub statements: Vec<Statement>,
}

/// A statement of the default graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub subject: Subject,
    pub predicate: IriRef,
    pub object: Object,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    IriRef(IriRef),
    BlankNodeLabel(BlankNodeLabel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    IriRef(IriRef),
    BlankNodeLabel(BlankNodeLabel),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IriRef(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankNodeLabel(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    String {
        string: StringLiteral,
    },
    Typed {
        string: StringLiteral,
        type_: IriRef,
    },
    LangTagged {
        string: StringLiteral,
        lang: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringLiteral(pub String);

impl From<&Statement> for String {
    fn from(statement: &Statement) -> String {
        String::from(&statement.subject)
            + " "
            + &String::from(&statement.predicate)
            + " "
            + &String::from(&statement.object)
            + " .\n"
    }
}

impl From<&Subject> for String {
    fn from(subject: &Subject) -> String {
        match subject {
            Subject::IriRef(iri_ref) => String::from(iri_ref),
            Subject::BlankNodeLabel(label) => String::from(label),
        }
    }
}

impl From<&Object> for String {
    fn from(object: &Object) -> String {
        match object {
            Object::IriRef(iri_ref) => String::from(iri_ref),
            Object::BlankNodeLabel(label) => String::from(label),
            Object::Literal(literal) => String::from(literal),
        }
    }
}

impl From<&IriRef> for String {
    fn from(iri_ref: &IriRef) -> String {
        let string = &iri_ref.0;
        let mut out = String::with_capacity(string.len() + 2);
        out.push('<');
        for c in string.chars() {
            match c {
                '\x00'..='\x20' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                    out.push_str(&format!("\\u{:04X}", u32::from(c)))
                }
                _ => out.push(c),
            }
        }
        out.push('>');
        out
    }
}

impl From<&StringLiteral> for String {
    fn from(string_literal: &StringLiteral) -> String {
        let string = &string_literal.0;
        let mut out = String::with_capacity(string.len() + 2);
        out.push('"');
        for c in string.chars() {
            match c {
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out.push('"');
        out
    }
}

impl From<&BlankNodeLabel> for String {
    fn from(label: &BlankNodeLabel) -> String {
        // Labels are issued by the flattener, never taken from input.
        label.0.clone()
    }
}

impl From<&Literal> for String {
    fn from(literal: &Literal) -> String {
        match literal {
            Literal::String { string } => String::from(string),
            Literal::Typed { string, type_ } => String::from(string) + "^^" + &String::from(type_),
            Literal::LangTagged { string, lang } => String::from(string) + "@" + lang,
        }
    }
}

impl Literal {
    pub fn typed(value: impl Into<String>, type_: &str) -> Self {
        Self::Typed {
            string: StringLiteral(value.into()),
            type_: IriRef(type_.to_owned()),
        }
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Self::typed(i.to_string(), XSD_INTEGER)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Self::typed(b.to_string(), XSD_BOOLEAN)
    }
}

impl DataSet {
    /// Serialize as N-Quads: one line per distinct statement, sorted byte-wise.
    pub fn to_nquads(&self) -> String {
        let mut lines = self
            .statements
            .iter()
            .map(String::from)
            .collect::<Vec<String>>();
        lines.sort();
        lines.dedup();
        lines.concat()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(subject: &str, object: Object) -> Statement {
        Statement {
            subject: Subject::IriRef(IriRef(subject.to_string())),
            predicate: IriRef("http://example.com/p".to_string()),
            object,
        }
    }

    #[test]
    fn escape() {
        let string_literal = StringLiteral("\t\x08\n\r\x0c\"\'\\\u{221e}".to_string());
        assert_eq!(
            String::from(&string_literal),
            "\"\t\x08\\n\\r\x0c\\\"'\\\\\u{221e}\""
        );

        let iri_ref = IriRef("urn:ex:s".to_string());
        assert_eq!(String::from(&iri_ref), "<urn:ex:s>");
        let iri_ref = IriRef("urn:ex:a b<c>".to_string());
        assert_eq!(String::from(&iri_ref), "<urn:ex:a\\u0020b\\u003Cc\\u003E>");
    }

    #[test]
    fn line() {
        let statement = Statement {
            subject: Subject::BlankNodeLabel(BlankNodeLabel("_:b0".to_string())),
            predicate: IriRef("http://www.w3.org/1999/02/22-rdf-syntax-ns#type".to_string()),
            object: Object::IriRef(IriRef("http://example.org/vocab#Foo".to_string())),
        };
        assert_eq!(
            String::from(&statement),
            "_:b0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.org/vocab#Foo> .\n"
        );
    }

    #[test]
    fn typed_literals() {
        assert_eq!(
            String::from(&Literal::from(42i64)),
            "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
        assert_eq!(
            String::from(&Literal::from(false)),
            "\"false\"^^<http://www.w3.org/2001/XMLSchema#boolean>"
        );
        let lang = Literal::LangTagged {
            string: StringLiteral("chat".to_string()),
            lang: "fr".to_string(),
        };
        assert_eq!(String::from(&lang), "\"chat\"@fr");
    }

    #[test]
    fn sorted_and_deduplicated() {
        let literal = |s: &str| {
            Object::Literal(Literal::String {
                string: StringLiteral(s.to_string()),
            })
        };
        let dataset = DataSet {
            statements: vec![
                statement("urn:b", literal("x")),
                statement("urn:a", literal("y")),
                statement("urn:b", literal("x")),
            ],
        };
        assert_eq!(
            dataset.to_nquads(),
            "<urn:a> <http://example.com/p> \"y\" .\n<urn:b> <http://example.com/p> \"x\" .\n"
        );
        assert!(DataSet::default().to_nquads().is_empty());
    }
}
