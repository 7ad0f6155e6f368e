//! Compiled XML Schema model
//!
//! Named components are referenced by local name and looked up on demand, so
//! recursive content models need no special handling. The loader guarantees
//! that every reference resolves and that derivation and group chains are
//! acyclic.

use regex::Regex;
use std::collections::HashMap;

/// Namespace of XML Schema 1.0 components
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Namespace of schema-instance attributes (`xsi:*`)
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Namespace bound to the `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A compiled schema document
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub target_namespace: Option<String>,
    /// Global element declarations
    pub elements: HashMap<String, ElementDecl>,
    pub complex_types: HashMap<String, ComplexType>,
    pub simple_types: HashMap<String, SimpleType>,
    /// Named model groups (`xs:group name=...`)
    pub groups: HashMap<String, Particle>,
    pub attribute_groups: HashMap<String, AttributeGroup>,
}

/// Reference to the type of an element or attribute
#[derive(Debug, Clone)]
pub enum TypeRef {
    Builtin(BuiltinType),
    /// A named complex or simple type of this schema
    Named(String),
    Complex(Box<ComplexType>),
    Simple(Box<SimpleType>),
}

/// A type reference resolved against a schema
#[derive(Debug, Clone, Copy)]
pub enum TypeDef<'a> {
    Builtin(BuiltinType),
    Complex(&'a ComplexType),
    Simple(&'a SimpleType),
}

/// Element declaration
#[derive(Debug, Clone)]
pub struct ElementDecl {
    pub name: String,
    /// Namespace the element must carry in instances
    pub namespace: Option<String>,
    pub type_ref: TypeRef,
}

/// Upper occurrence bound of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    /// Whether `count` occurrences may be followed by another
    #[must_use]
    pub fn allows_more(self, count: u32) -> bool {
        match self {
            MaxOccurs::Bounded(max) => count < max,
            MaxOccurs::Unbounded => true,
        }
    }
}

/// A term with occurrence bounds
#[derive(Debug, Clone)]
pub struct Particle {
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub term: Term,
}

impl Particle {
    /// A particle that must occur exactly once
    #[must_use]
    pub fn once(term: Term) -> Self {
        Self {
            min_occurs: 1,
            max_occurs: MaxOccurs::Bounded(1),
            term,
        }
    }
}

/// Content of a particle
#[derive(Debug, Clone)]
pub enum Term {
    Element(ElementDecl),
    /// Reference to a global element
    ElementRef(String),
    /// Reference to a named model group
    GroupRef(String),
    Sequence(Vec<Particle>),
    Choice(Vec<Particle>),
    All(Vec<Particle>),
    /// Element wildcard; matched elements are not validated
    Any,
}

/// Complex type definition.
///
/// For extensions, `content` and `attributes` hold only what the type adds;
/// the inherited parts are reached through `base`.
#[derive(Debug, Clone)]
pub struct ComplexType {
    pub name: Option<String>,
    /// Extension base (complex or simple content)
    pub base: Option<TypeRef>,
    pub mixed: bool,
    pub content: ContentModel,
    pub attributes: Vec<AttributeUse>,
    /// Referenced attribute groups
    pub attribute_groups: Vec<String>,
    pub any_attribute: bool,
}

impl ComplexType {
    /// An anonymous type with empty content and no attributes
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: None,
            base: None,
            mixed: false,
            content: ContentModel::Empty,
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
            any_attribute: false,
        }
    }
}

/// Content model of a complex type
#[derive(Debug, Clone)]
pub enum ContentModel {
    Empty,
    /// Character data typed by the base chain
    Simple,
    Elements(Particle),
}

/// Attribute declaration as used by a complex type
#[derive(Debug, Clone)]
pub struct AttributeUse {
    pub name: String,
    pub type_ref: TypeRef,
    pub required: bool,
    pub default: Option<String>,
    pub fixed: Option<String>,
}

/// Named attribute group
#[derive(Debug, Clone, Default)]
pub struct AttributeGroup {
    pub attributes: Vec<AttributeUse>,
    pub attribute_groups: Vec<String>,
    pub any_attribute: bool,
}

/// Simple type definition
#[derive(Debug, Clone)]
pub struct SimpleType {
    pub name: Option<String>,
    pub variety: SimpleVariety,
}

impl SimpleType {
    /// Name used in diagnostics
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("#AnonType")
    }
}

#[derive(Debug, Clone)]
pub enum SimpleVariety {
    Restriction { base: TypeRef, facets: Facets },
    List { item: TypeRef },
    Union { members: Vec<TypeRef> },
}

/// Constraining facets of one restriction step
#[derive(Debug, Clone, Default)]
pub struct Facets {
    pub enumeration: Vec<String>,
    /// Alternatives; a value must match at least one
    pub patterns: Vec<Pattern>,
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_inclusive: Option<String>,
    pub max_inclusive: Option<String>,
    pub min_exclusive: Option<String>,
    pub max_exclusive: Option<String>,
}

/// A compiled `xs:pattern` facet
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Pattern as written in the schema
    pub source: String,
    /// Anchored translation of the pattern
    pub regex: Regex,
}

/// Built-in XML Schema datatypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    AnyType,
    AnySimpleType,
    String,
    NormalizedString,
    Token,
    Boolean,
    Decimal,
    Integer,
    Int,
    Long,
    Short,
    Byte,
    NonNegativeInteger,
    PositiveInteger,
    NonPositiveInteger,
    NegativeInteger,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    Double,
    Float,
    AnyUri,
    Name,
    NcName,
    Id,
    IdRef,
    NmToken,
    Date,
}

impl BuiltinType {
    const ALL: [BuiltinType; 29] = [
        BuiltinType::AnyType,
        BuiltinType::AnySimpleType,
        BuiltinType::String,
        BuiltinType::NormalizedString,
        BuiltinType::Token,
        BuiltinType::Boolean,
        BuiltinType::Decimal,
        BuiltinType::Integer,
        BuiltinType::Int,
        BuiltinType::Long,
        BuiltinType::Short,
        BuiltinType::Byte,
        BuiltinType::NonNegativeInteger,
        BuiltinType::PositiveInteger,
        BuiltinType::NonPositiveInteger,
        BuiltinType::NegativeInteger,
        BuiltinType::UnsignedLong,
        BuiltinType::UnsignedInt,
        BuiltinType::UnsignedShort,
        BuiltinType::UnsignedByte,
        BuiltinType::Double,
        BuiltinType::Float,
        BuiltinType::AnyUri,
        BuiltinType::Name,
        BuiltinType::NcName,
        BuiltinType::Id,
        BuiltinType::IdRef,
        BuiltinType::NmToken,
        BuiltinType::Date,
    ];

    /// Look up a built-in type by its local name in the XSD namespace
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Local name in the XSD namespace
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::AnyType => "anyType",
            BuiltinType::AnySimpleType => "anySimpleType",
            BuiltinType::String => "string",
            BuiltinType::NormalizedString => "normalizedString",
            BuiltinType::Token => "token",
            BuiltinType::Boolean => "boolean",
            BuiltinType::Decimal => "decimal",
            BuiltinType::Integer => "integer",
            BuiltinType::Int => "int",
            BuiltinType::Long => "long",
            BuiltinType::Short => "short",
            BuiltinType::Byte => "byte",
            BuiltinType::NonNegativeInteger => "nonNegativeInteger",
            BuiltinType::PositiveInteger => "positiveInteger",
            BuiltinType::NonPositiveInteger => "nonPositiveInteger",
            BuiltinType::NegativeInteger => "negativeInteger",
            BuiltinType::UnsignedLong => "unsignedLong",
            BuiltinType::UnsignedInt => "unsignedInt",
            BuiltinType::UnsignedShort => "unsignedShort",
            BuiltinType::UnsignedByte => "unsignedByte",
            BuiltinType::Double => "double",
            BuiltinType::Float => "float",
            BuiltinType::AnyUri => "anyURI",
            BuiltinType::Name => "Name",
            BuiltinType::NcName => "NCName",
            BuiltinType::Id => "ID",
            BuiltinType::IdRef => "IDREF",
            BuiltinType::NmToken => "NMTOKEN",
            BuiltinType::Date => "date",
        }
    }

    /// Whether surrounding whitespace is significant for this type
    #[must_use]
    pub fn preserves_whitespace(self) -> bool {
        matches!(
            self,
            BuiltinType::String | BuiltinType::AnySimpleType | BuiltinType::AnyType
        )
    }

    /// Whether values of this type are ordered numerically
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            BuiltinType::Decimal
                | BuiltinType::Integer
                | BuiltinType::Int
                | BuiltinType::Long
                | BuiltinType::Short
                | BuiltinType::Byte
                | BuiltinType::NonNegativeInteger
                | BuiltinType::PositiveInteger
                | BuiltinType::NonPositiveInteger
                | BuiltinType::NegativeInteger
                | BuiltinType::UnsignedLong
                | BuiltinType::UnsignedInt
                | BuiltinType::UnsignedShort
                | BuiltinType::UnsignedByte
                | BuiltinType::Double
                | BuiltinType::Float
        )
    }
}

impl Schema {
    /// Global element declaration matching an instance element
    #[must_use]
    pub fn global_element(&self, name: &str, namespace: Option<&str>) -> Option<&ElementDecl> {
        self.elements
            .get(name)
            .filter(|decl| decl.namespace.as_deref() == namespace)
    }

    /// Resolve a type reference
    #[must_use]
    pub fn resolve<'a>(&'a self, type_ref: &'a TypeRef) -> Option<TypeDef<'a>> {
        match type_ref {
            TypeRef::Builtin(builtin) => Some(TypeDef::Builtin(*builtin)),
            TypeRef::Complex(complex) => Some(TypeDef::Complex(complex)),
            TypeRef::Simple(simple) => Some(TypeDef::Simple(simple)),
            TypeRef::Named(name) => self
                .complex_types
                .get(name)
                .map(TypeDef::Complex)
                .or_else(|| self.simple_types.get(name).map(TypeDef::Simple)),
        }
    }

    /// Display name of a type reference for diagnostics
    #[must_use]
    pub fn type_name(&self, type_ref: &TypeRef) -> String {
        match type_ref {
            TypeRef::Builtin(builtin) => builtin.name().to_string(),
            TypeRef::Named(name) => name.clone(),
            TypeRef::Complex(complex) => complex
                .name
                .clone()
                .unwrap_or_else(|| "#AnonType".to_string()),
            TypeRef::Simple(simple) => simple.display_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_round_trips_names() {
        for builtin in BuiltinType::ALL {
            assert_eq!(BuiltinType::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(BuiltinType::from_name("dateTime"), None);
    }

    #[test]
    fn test_max_occurs() {
        assert!(MaxOccurs::Bounded(2).allows_more(1));
        assert!(!MaxOccurs::Bounded(2).allows_more(2));
        assert!(MaxOccurs::Unbounded.allows_more(u32::MAX - 1));
    }

    #[test]
    fn test_resolve_named_types() {
        let mut schema = Schema::default();
        schema
            .complex_types
            .insert("group".to_string(), ComplexType::empty());
        schema.simple_types.insert(
            "profile".to_string(),
            SimpleType {
                name: Some("profile".to_string()),
                variety: SimpleVariety::Restriction {
                    base: TypeRef::Builtin(BuiltinType::String),
                    facets: Facets::default(),
                },
            },
        );

        let group = TypeRef::Named("group".to_string());
        let profile = TypeRef::Named("profile".to_string());
        let missing = TypeRef::Named("missing".to_string());

        assert!(matches!(schema.resolve(&group), Some(TypeDef::Complex(_))));
        assert!(matches!(schema.resolve(&profile), Some(TypeDef::Simple(_))));
        assert!(schema.resolve(&missing).is_none());
        assert_eq!(schema.type_name(&profile), "profile");
        assert_eq!(schema.type_name(&TypeRef::Builtin(BuiltinType::Int)), "int");
    }

    #[test]
    fn test_global_element_checks_namespace() {
        let mut schema = Schema::default();
        schema.elements.insert(
            "config".to_string(),
            ElementDecl {
                name: "config".to_string(),
                namespace: Some("urn:config".to_string()),
                type_ref: TypeRef::Builtin(BuiltinType::AnyType),
            },
        );

        assert!(schema.global_element("config", Some("urn:config")).is_some());
        assert!(schema.global_element("config", None).is_none());
    }
}
