//! XML Schema compiler
//!
//! Reads an XSD document with `roxmltree` and builds the [`Schema`] model.
//! References between components are collected while parsing and checked in
//! a second pass, once every named component is known.

use crate::model::{
    AttributeGroup, AttributeUse, BuiltinType, ComplexType, ContentModel, ElementDecl, Facets,
    MaxOccurs, Particle, Pattern, Schema, SimpleType, SimpleVariety, Term, TypeRef, XSD_NAMESPACE,
};
use crate::registry::SchemaSource;
use crate::{Error, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, trace};

type XmlNode<'a, 'input> = roxmltree::Node<'a, 'input>;

/// Compiles XSD documents into [`Schema`] values
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaLoader;

impl SchemaLoader {
    /// Create a new schema loader
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Read and compile a registered schema source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the source cannot be read, otherwise the
    /// errors of [`SchemaLoader::load_from_str`].
    pub fn load_from_source(&self, source: &SchemaSource) -> Result<Schema> {
        trace!("Loading schema from {}", source);
        let text = source.read_to_string()?;
        self.load_from_str(&text)
    }

    /// Read and compile an XSD file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read, otherwise the
    /// errors of [`SchemaLoader::load_from_str`].
    pub fn load_from_file(&self, path: &Path) -> Result<Schema> {
        trace!("Loading schema from file: {:?}", path);
        let text = std::fs::read_to_string(path)?;
        self.load_from_str(&text)
    }

    /// Compile XSD text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the text is not well-formed XML and
    /// [`Error::InvalidFormat`] when it is not a schema this compiler
    /// supports, or when a reference cannot be resolved.
    pub fn load_from_str(&self, xsd: &str) -> Result<Schema> {
        let xml = roxmltree::Document::parse(xsd).map_err(|e| Error::Parse(e.to_string()))?;
        let mut compiler = Compiler::default();
        let schema = compiler.compile(xml.root_element())?;

        check_references(&schema, &compiler.references)?;
        check_derivation_cycles(&schema)?;
        check_group_cycles(&schema)?;
        check_attribute_group_cycles(&schema)?;

        debug!(
            "Compiled schema: {} global element(s), {} complex type(s), {} simple type(s)",
            schema.elements.len(),
            schema.complex_types.len(),
            schema.simple_types.len()
        );
        Ok(schema)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComponentKind {
    Type,
    Element,
    Group,
    AttributeGroup,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComponentKind::Type => "type definition",
            ComponentKind::Element => "element declaration",
            ComponentKind::Group => "group",
            ComponentKind::AttributeGroup => "attribute group",
        })
    }
}

#[derive(Default)]
struct Compiler {
    target_namespace: Option<String>,
    qualified_locals: bool,
    references: Vec<(ComponentKind, String)>,
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidFormat(message.into())
}

fn is_xsd(node: XmlNode<'_, '_>, local: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(XSD_NAMESPACE)
        && node.tag_name().name() == local
}

/// XSD child elements of `node`, without annotations
fn xsd_children<'a, 'input>(
    node: XmlNode<'a, 'input>,
) -> impl Iterator<Item = XmlNode<'a, 'input>> {
    node.children()
        .filter(|c| c.is_element() && !is_xsd(*c, "annotation"))
}

fn require_xsd(node: XmlNode<'_, '_>) -> Result<String> {
    if node.tag_name().namespace() == Some(XSD_NAMESPACE) {
        Ok(node.tag_name().name().to_string())
    } else {
        Err(invalid(format!(
            "s4s-elt-invalid: Element '{}' is not a valid schema component",
            node.tag_name().name()
        )))
    }
}

fn required_attr<'a>(node: XmlNode<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        invalid(format!(
            "s4s-att-must-appear: Attribute '{}' must appear in element '{}'",
            name,
            node.tag_name().name()
        ))
    })
}

/// Strip any prefix from a QName
fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

impl Compiler {
    fn compile(&mut self, root: XmlNode<'_, '_>) -> Result<Schema> {
        if !is_xsd(root, "schema") {
            return Err(invalid(format!(
                "Root element '{}' is not an XML Schema",
                root.tag_name().name()
            )));
        }

        self.target_namespace = root.attribute("targetNamespace").map(str::to_string);
        self.qualified_locals = root.attribute("elementFormDefault") == Some("qualified");

        let mut schema = Schema {
            target_namespace: self.target_namespace.clone(),
            ..Schema::default()
        };

        for child in xsd_children(root) {
            match require_xsd(child)?.as_str() {
                "element" => {
                    let name = required_attr(child, "name")?.to_string();
                    let decl = self.element_decl(child, name.clone(), true)?;
                    if schema.elements.insert(name.clone(), decl).is_some() {
                        return Err(duplicate("element", &name));
                    }
                }
                "complexType" => {
                    let name = required_attr(child, "name")?.to_string();
                    let complex = self.complex_type(child, Some(name.clone()))?;
                    if schema.complex_types.insert(name.clone(), complex).is_some()
                        || schema.simple_types.contains_key(&name)
                    {
                        return Err(duplicate("type", &name));
                    }
                }
                "simpleType" => {
                    let name = required_attr(child, "name")?.to_string();
                    let simple = self.simple_type(child, Some(name.clone()))?;
                    if schema.simple_types.insert(name.clone(), simple).is_some()
                        || schema.complex_types.contains_key(&name)
                    {
                        return Err(duplicate("type", &name));
                    }
                }
                "group" => {
                    let name = required_attr(child, "name")?.to_string();
                    let model = xsd_children(child).next().ok_or_else(|| {
                        invalid(format!("Group '{name}' has no model group"))
                    })?;
                    let particle = Particle::once(self.model_group_term(model)?);
                    if schema.groups.insert(name.clone(), particle).is_some() {
                        return Err(duplicate("group", &name));
                    }
                }
                "attributeGroup" => {
                    let name = required_attr(child, "name")?.to_string();
                    let mut group = AttributeGroup::default();
                    for item in xsd_children(child) {
                        self.attribute_item(
                            item,
                            &mut group.attributes,
                            &mut group.attribute_groups,
                            &mut group.any_attribute,
                        )?;
                    }
                    if schema.attribute_groups.insert(name.clone(), group).is_some() {
                        return Err(duplicate("attribute group", &name));
                    }
                }
                "notation" => trace!("Ignoring notation declaration"),
                other @ ("import" | "include" | "redefine" | "override") => {
                    return Err(invalid(format!("xs:{other} is not supported")));
                }
                "attribute" => {
                    return Err(invalid("Global attribute declarations are not supported"));
                }
                other => {
                    return Err(invalid(format!(
                        "s4s-elt-invalid-content: Unexpected element 'xs:{other}' in schema"
                    )));
                }
            }
        }

        Ok(schema)
    }

    fn element_decl(
        &mut self,
        node: XmlNode<'_, '_>,
        name: String,
        global: bool,
    ) -> Result<ElementDecl> {
        let qualified = global
            || match node.attribute("form") {
                Some(form) => form == "qualified",
                None => self.qualified_locals,
            };

        let mut type_ref = match node.attribute("type") {
            Some(qname) => Some(self.type_ref(node, qname)?),
            None => None,
        };

        for child in xsd_children(node) {
            match require_xsd(child)?.as_str() {
                "complexType" if type_ref.is_none() => {
                    type_ref = Some(TypeRef::Complex(Box::new(self.complex_type(child, None)?)));
                }
                "simpleType" if type_ref.is_none() => {
                    type_ref = Some(TypeRef::Simple(Box::new(self.simple_type(child, None)?)));
                }
                "unique" | "key" | "keyref" => {
                    trace!("Identity constraint on element '{}' is not enforced", name);
                }
                other => {
                    return Err(invalid(format!(
                        "Unexpected 'xs:{other}' in declaration of element '{name}'"
                    )));
                }
            }
        }

        Ok(ElementDecl {
            name,
            namespace: if qualified {
                self.target_namespace.clone()
            } else {
                None
            },
            type_ref: type_ref.unwrap_or(TypeRef::Builtin(BuiltinType::AnyType)),
        })
    }

    fn type_ref(&mut self, node: XmlNode<'_, '_>, qname: &str) -> Result<TypeRef> {
        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qname),
        };

        if node.lookup_namespace_uri(prefix) == Some(XSD_NAMESPACE) {
            return BuiltinType::from_name(local)
                .map(TypeRef::Builtin)
                .ok_or_else(|| invalid(format!("Unsupported built-in type 'xs:{local}'")));
        }

        self.references
            .push((ComponentKind::Type, local.to_string()));
        Ok(TypeRef::Named(local.to_string()))
    }

    fn occurs(node: XmlNode<'_, '_>) -> Result<(u32, MaxOccurs)> {
        let min = match node.attribute("minOccurs") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid(format!("Invalid minOccurs value '{value}'")))?,
            None => 1,
        };
        let max = match node.attribute("maxOccurs").map(str::trim) {
            Some("unbounded") => MaxOccurs::Unbounded,
            Some(value) => MaxOccurs::Bounded(
                value
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("Invalid maxOccurs value '{value}'")))?,
            ),
            None => MaxOccurs::Bounded(1),
        };
        if let MaxOccurs::Bounded(max) = max {
            if min > max {
                return Err(invalid(format!(
                    "p-props-correct.2.1: minOccurs ({min}) must not exceed maxOccurs ({max})"
                )));
            }
        }
        Ok((min, max))
    }

    /// A particle inside a model group or content model
    fn particle(&mut self, node: XmlNode<'_, '_>) -> Result<Particle> {
        let (min_occurs, max_occurs) = Self::occurs(node)?;
        let term = match require_xsd(node)?.as_str() {
            "element" => match node.attribute("ref") {
                Some(reference) => {
                    let name = local_part(reference).to_string();
                    self.references.push((ComponentKind::Element, name.clone()));
                    Term::ElementRef(name)
                }
                None => {
                    let name = required_attr(node, "name")?.to_string();
                    Term::Element(self.element_decl(node, name, false)?)
                }
            },
            "group" => {
                let name = local_part(required_attr(node, "ref")?).to_string();
                self.references.push((ComponentKind::Group, name.clone()));
                Term::GroupRef(name)
            }
            "any" => Term::Any,
            "sequence" | "choice" | "all" => self.model_group_term(node)?,
            other => {
                return Err(invalid(format!(
                    "Unexpected 'xs:{other}' in content model"
                )));
            }
        };

        Ok(Particle {
            min_occurs,
            max_occurs,
            term,
        })
    }

    fn model_group_term(&mut self, node: XmlNode<'_, '_>) -> Result<Term> {
        let kind = require_xsd(node)?;
        let particles = xsd_children(node)
            .map(|child| self.particle(child))
            .collect::<Result<Vec<_>>>()?;

        match kind.as_str() {
            "sequence" => Ok(Term::Sequence(particles)),
            "choice" => Ok(Term::Choice(particles)),
            "all" => {
                let valid = particles.iter().all(|p| {
                    matches!(p.term, Term::Element(_) | Term::ElementRef(_))
                        && p.max_occurs == MaxOccurs::Bounded(1)
                });
                if !valid {
                    return Err(invalid(
                        "cos-all-limited: xs:all may only contain elements with maxOccurs=1",
                    ));
                }
                Ok(Term::All(particles))
            }
            other => Err(invalid(format!("'xs:{other}' is not a model group"))),
        }
    }

    fn complex_type(&mut self, node: XmlNode<'_, '_>, name: Option<String>) -> Result<ComplexType> {
        let mut complex = ComplexType::empty();
        complex.name = name;
        complex.mixed = node.attribute("mixed") == Some("true");

        for child in xsd_children(node) {
            match require_xsd(child)?.as_str() {
                "sequence" | "choice" | "all" | "group" => {
                    complex.content = ContentModel::Elements(self.particle(child)?);
                }
                "simpleContent" => {
                    let extension = derivation(child)?;
                    let base = required_attr(extension, "base")?;
                    complex.base = Some(self.type_ref(extension, base)?);
                    complex.content = ContentModel::Simple;
                    self.extension_items(extension, &mut complex, false)?;
                }
                "complexContent" => {
                    if child.attribute("mixed") == Some("true") {
                        complex.mixed = true;
                    }
                    let extension = derivation(child)?;
                    let base = required_attr(extension, "base")?;
                    complex.base = Some(self.type_ref(extension, base)?);
                    self.extension_items(extension, &mut complex, true)?;
                }
                _ => self.attribute_item(
                    child,
                    &mut complex.attributes,
                    &mut complex.attribute_groups,
                    &mut complex.any_attribute,
                )?,
            }
        }

        Ok(complex)
    }

    fn extension_items(
        &mut self,
        extension: XmlNode<'_, '_>,
        complex: &mut ComplexType,
        allow_particles: bool,
    ) -> Result<()> {
        for item in xsd_children(extension) {
            match require_xsd(item)?.as_str() {
                "sequence" | "choice" | "all" | "group" if allow_particles => {
                    complex.content = ContentModel::Elements(self.particle(item)?);
                }
                _ => self.attribute_item(
                    item,
                    &mut complex.attributes,
                    &mut complex.attribute_groups,
                    &mut complex.any_attribute,
                )?,
            }
        }
        Ok(())
    }

    fn attribute_item(
        &mut self,
        node: XmlNode<'_, '_>,
        attributes: &mut Vec<AttributeUse>,
        attribute_groups: &mut Vec<String>,
        any_attribute: &mut bool,
    ) -> Result<()> {
        match require_xsd(node)?.as_str() {
            "attribute" => {
                if let Some(attribute) = self.attribute_use(node)? {
                    if attributes.iter().any(|a| a.name == attribute.name) {
                        return Err(duplicate("attribute", &attribute.name));
                    }
                    attributes.push(attribute);
                }
            }
            "attributeGroup" => {
                let name = local_part(required_attr(node, "ref")?).to_string();
                self.references
                    .push((ComponentKind::AttributeGroup, name.clone()));
                attribute_groups.push(name);
            }
            "anyAttribute" => *any_attribute = true,
            other => {
                return Err(invalid(format!(
                    "Unexpected 'xs:{other}' where attributes were expected"
                )));
            }
        }
        Ok(())
    }

    /// An attribute declaration; `None` for prohibited attributes
    fn attribute_use(&mut self, node: XmlNode<'_, '_>) -> Result<Option<AttributeUse>> {
        if node.attribute("ref").is_some() {
            return Err(invalid("Attribute references are not supported"));
        }
        let name = required_attr(node, "name")?.to_string();

        let required = match node.attribute("use").unwrap_or("optional") {
            "required" => true,
            "optional" => false,
            "prohibited" => return Ok(None),
            other => {
                return Err(invalid(format!(
                    "Invalid use '{other}' on attribute '{name}'"
                )));
            }
        };

        let mut type_ref = match node.attribute("type") {
            Some(qname) => Some(self.type_ref(node, qname)?),
            None => None,
        };
        for child in xsd_children(node) {
            if is_xsd(child, "simpleType") && type_ref.is_none() {
                type_ref = Some(TypeRef::Simple(Box::new(self.simple_type(child, None)?)));
            } else {
                return Err(invalid(format!(
                    "Unexpected content in declaration of attribute '{name}'"
                )));
            }
        }

        Ok(Some(AttributeUse {
            name,
            type_ref: type_ref.unwrap_or(TypeRef::Builtin(BuiltinType::AnySimpleType)),
            required,
            default: node.attribute("default").map(str::to_string),
            fixed: node.attribute("fixed").map(str::to_string),
        }))
    }

    fn simple_type(&mut self, node: XmlNode<'_, '_>, name: Option<String>) -> Result<SimpleType> {
        let variety_node = xsd_children(node).next().ok_or_else(|| {
            invalid(format!(
                "Simple type '{}' has no restriction, list or union",
                name.as_deref().unwrap_or("#AnonType")
            ))
        })?;

        let variety = match require_xsd(variety_node)?.as_str() {
            "restriction" => self.restriction(variety_node)?,
            "list" => {
                let item = match variety_node.attribute("itemType") {
                    Some(qname) => self.type_ref(variety_node, qname)?,
                    None => self.inline_simple_type(variety_node)?,
                };
                SimpleVariety::List { item }
            }
            "union" => {
                let mut members = Vec::new();
                if let Some(member_types) = variety_node.attribute("memberTypes") {
                    for qname in member_types.split_whitespace() {
                        members.push(self.type_ref(variety_node, qname)?);
                    }
                }
                for child in xsd_children(variety_node) {
                    if is_xsd(child, "simpleType") {
                        members.push(TypeRef::Simple(Box::new(self.simple_type(child, None)?)));
                    }
                }
                if members.is_empty() {
                    return Err(invalid("Union has no member types"));
                }
                SimpleVariety::Union { members }
            }
            other => {
                return Err(invalid(format!(
                    "Unexpected 'xs:{other}' in simple type definition"
                )));
            }
        };

        Ok(SimpleType { name, variety })
    }

    fn inline_simple_type(&mut self, node: XmlNode<'_, '_>) -> Result<TypeRef> {
        let child = xsd_children(node)
            .find(|c| is_xsd(*c, "simpleType"))
            .ok_or_else(|| invalid("Missing base or inline simple type"))?;
        Ok(TypeRef::Simple(Box::new(self.simple_type(child, None)?)))
    }

    fn restriction(&mut self, node: XmlNode<'_, '_>) -> Result<SimpleVariety> {
        let base = match node.attribute("base") {
            Some(qname) => self.type_ref(node, qname)?,
            None => self.inline_simple_type(node)?,
        };

        let mut facets = Facets::default();
        for facet in xsd_children(node) {
            let kind = require_xsd(facet)?;
            if kind == "simpleType" {
                continue;
            }
            let value = required_attr(facet, "value")?;
            match kind.as_str() {
                "enumeration" => facets.enumeration.push(value.to_string()),
                "pattern" => facets.patterns.push(compile_pattern(value)?),
                "length" => facets.length = Some(parse_length(&kind, value)?),
                "minLength" => facets.min_length = Some(parse_length(&kind, value)?),
                "maxLength" => facets.max_length = Some(parse_length(&kind, value)?),
                "minInclusive" => facets.min_inclusive = Some(value.to_string()),
                "maxInclusive" => facets.max_inclusive = Some(value.to_string()),
                "minExclusive" => facets.min_exclusive = Some(value.to_string()),
                "maxExclusive" => facets.max_exclusive = Some(value.to_string()),
                "whiteSpace" | "totalDigits" | "fractionDigits" => {
                    trace!("Facet '{}' is accepted but not enforced", kind);
                }
                other => {
                    return Err(invalid(format!("Unsupported facet 'xs:{other}'")));
                }
            }
        }

        Ok(SimpleVariety::Restriction { base, facets })
    }
}

fn derivation<'a, 'input>(node: XmlNode<'a, 'input>) -> Result<XmlNode<'a, 'input>> {
    let derivation = xsd_children(node)
        .next()
        .ok_or_else(|| invalid("Content derivation has no extension"))?;
    if is_xsd(derivation, "extension") {
        Ok(derivation)
    } else {
        Err(invalid(format!(
            "Derivation by '{}' is not supported; use xs:extension",
            derivation.tag_name().name()
        )))
    }
}

fn duplicate(kind: &str, name: &str) -> Error {
    invalid(format!(
        "sch-props-correct.2: A schema cannot contain two global components with the same name; the {kind} '{name}' is declared twice"
    ))
}

fn parse_length(facet: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("Invalid value '{value}' for facet '{facet}'")))
}

/// Translate an XSD pattern into an anchored regex.
///
/// XSD patterns always match the whole value and have no anchors of their
/// own, so the translation only needs to wrap them.
fn compile_pattern(source: &str) -> Result<Pattern> {
    let regex = Regex::new(&format!("^(?:{source})$"))
        .map_err(|e| invalid(format!("Invalid pattern '{source}': {e}")))?;
    Ok(Pattern {
        source: source.to_string(),
        regex,
    })
}

fn check_references(schema: &Schema, references: &[(ComponentKind, String)]) -> Result<()> {
    for (kind, name) in references {
        let found = match kind {
            ComponentKind::Type => {
                schema.complex_types.contains_key(name) || schema.simple_types.contains_key(name)
            }
            ComponentKind::Element => schema.elements.contains_key(name),
            ComponentKind::Group => schema.groups.contains_key(name),
            ComponentKind::AttributeGroup => schema.attribute_groups.contains_key(name),
        };
        if !found {
            return Err(invalid(format!(
                "src-resolve: Cannot resolve the name '{name}' to a(n) '{kind}' component"
            )));
        }
    }
    Ok(())
}

fn named_base(type_ref: Option<&TypeRef>) -> Option<&str> {
    match type_ref {
        Some(TypeRef::Named(name)) => Some(name),
        _ => None,
    }
}

fn simple_base(simple: &SimpleType) -> Option<&str> {
    match &simple.variety {
        SimpleVariety::Restriction { base, .. } => named_base(Some(base)),
        _ => None,
    }
}

/// Reject named types whose base chain loops back on itself
fn check_derivation_cycles(schema: &Schema) -> Result<()> {
    let names = schema.complex_types.keys().chain(schema.simple_types.keys());
    for start in names {
        let mut seen = HashSet::new();
        let mut current = Some(start.as_str());
        while let Some(name) = current {
            if !seen.insert(name) {
                return Err(invalid(format!(
                    "ct-props-correct.3: Circular definitions detected for type '{start}'"
                )));
            }
            current = match schema.complex_types.get(name) {
                Some(complex) => named_base(complex.base.as_ref()),
                None => schema.simple_types.get(name).and_then(simple_base),
            };
        }
    }
    Ok(())
}

fn group_refs<'a>(particle: &'a Particle, out: &mut Vec<&'a str>) {
    match &particle.term {
        Term::GroupRef(name) => out.push(name),
        Term::Sequence(items) | Term::Choice(items) | Term::All(items) => {
            for item in items {
                group_refs(item, out);
            }
        }
        Term::Element(_) | Term::ElementRef(_) | Term::Any => {}
    }
}

fn find_cycle<'a>(
    edges: &HashMap<&'a str, Vec<&'a str>>,
    node: &'a str,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
) -> Option<&'a str> {
    if path.contains(&node) {
        return Some(node);
    }
    if done.contains(node) {
        return None;
    }
    path.push(node);
    for &next in edges.get(node).into_iter().flatten() {
        if let Some(cycle) = find_cycle(edges, next, path, done) {
            return Some(cycle);
        }
    }
    path.pop();
    done.insert(node);
    None
}

fn check_cycles<'a>(edges: &HashMap<&'a str, Vec<&'a str>>, kind: &str) -> Result<()> {
    let mut done = HashSet::new();
    let mut starts: Vec<&str> = edges.keys().copied().collect();
    starts.sort_unstable();
    for start in starts {
        if let Some(name) = find_cycle(edges, start, &mut Vec::new(), &mut done) {
            return Err(invalid(format!(
                "mg-props-correct.2: Circular {kind} definition detected for '{name}'"
            )));
        }
    }
    Ok(())
}

/// Named model groups may not contain themselves, directly or indirectly
fn check_group_cycles(schema: &Schema) -> Result<()> {
    let edges: HashMap<&str, Vec<&str>> = schema
        .groups
        .iter()
        .map(|(name, particle)| {
            let mut refs = Vec::new();
            group_refs(particle, &mut refs);
            (name.as_str(), refs)
        })
        .collect();
    check_cycles(&edges, "group")
}

fn check_attribute_group_cycles(schema: &Schema) -> Result<()> {
    let edges: HashMap<&str, Vec<&str>> = schema
        .attribute_groups
        .iter()
        .map(|(name, group)| {
            (
                name.as_str(),
                group.attribute_groups.iter().map(String::as_str).collect(),
            )
        })
        .collect();
    check_cycles(&edges, "attribute group")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeDef;

    fn load(xsd: &str) -> Result<Schema> {
        SchemaLoader::new().load_from_str(xsd)
    }

    const CONFIG_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema" version="1.0">
    <xsd:annotation><xsd:documentation>Test schema</xsd:documentation></xsd:annotation>
    <xsd:element name="safety-center-config">
        <xsd:complexType>
            <xsd:sequence>
                <xsd:element name="safety-sources-config" type="safety-sources-config"/>
            </xsd:sequence>
        </xsd:complexType>
    </xsd:element>
    <xsd:complexType name="safety-sources-config">
        <xsd:sequence>
            <xsd:element name="safety-sources-group" type="safety-sources-group"
                         minOccurs="1" maxOccurs="unbounded"/>
        </xsd:sequence>
    </xsd:complexType>
    <xsd:complexType name="safety-sources-group">
        <xsd:choice minOccurs="1" maxOccurs="unbounded">
            <xsd:element name="static-safety-source" type="static-safety-source"/>
        </xsd:choice>
        <xsd:attribute name="id" type="xsd:string" use="required"/>
        <xsd:attribute name="title" type="stringResourceName"/>
    </xsd:complexType>
    <xsd:complexType name="static-safety-source">
        <xsd:attribute name="id" type="xsd:string" use="required"/>
        <xsd:attribute name="profile" type="profile" use="required"/>
    </xsd:complexType>
    <xsd:simpleType name="stringResourceName">
        <xsd:restriction base="xsd:string">
            <xsd:pattern value="@string/.+"/>
        </xsd:restriction>
    </xsd:simpleType>
    <xsd:simpleType name="profile">
        <xsd:restriction base="xsd:string">
            <xsd:enumeration value="primary_profile_only"/>
            <xsd:enumeration value="all_profiles"/>
        </xsd:restriction>
    </xsd:simpleType>
</xsd:schema>
"#;

    #[test]
    fn test_compile_config_schema() {
        let schema = load(CONFIG_XSD).unwrap();

        assert!(schema.target_namespace.is_none());
        assert_eq!(schema.elements.len(), 1);
        assert_eq!(schema.complex_types.len(), 3);
        assert_eq!(schema.simple_types.len(), 2);

        let root = schema.global_element("safety-center-config", None).unwrap();
        assert!(matches!(root.type_ref, TypeRef::Complex(_)));

        let group = &schema.complex_types["safety-sources-group"];
        assert_eq!(group.attributes.len(), 2);
        assert!(group.attributes[0].required);
        assert!(!group.attributes[1].required);
        match &group.content {
            ContentModel::Elements(particle) => {
                assert_eq!(particle.min_occurs, 1);
                assert_eq!(particle.max_occurs, MaxOccurs::Unbounded);
                assert!(matches!(particle.term, Term::Choice(ref items) if items.len() == 1));
            }
            other => panic!("unexpected content {other:?}"),
        }

        match &schema.simple_types["stringResourceName"].variety {
            SimpleVariety::Restriction { base, facets } => {
                assert!(matches!(base, TypeRef::Builtin(BuiltinType::String)));
                assert_eq!(facets.patterns.len(), 1);
                assert!(facets.patterns[0].regex.is_match("@string/title"));
                assert!(!facets.patterns[0].regex.is_match("title"));
            }
            other => panic!("unexpected variety {other:?}"),
        }
    }

    #[test]
    fn test_default_namespace_prefix_for_builtins() {
        let schema = load(
            r#"<schema xmlns="http://www.w3.org/2001/XMLSchema">
                <element name="count" type="positiveInteger"/>
            </schema>"#,
        )
        .unwrap();

        let decl = schema.global_element("count", None).unwrap();
        assert!(matches!(
            schema.resolve(&decl.type_ref),
            Some(TypeDef::Builtin(BuiltinType::PositiveInteger))
        ));
    }

    #[test]
    fn test_target_namespace_and_element_form() {
        let schema = load(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                          xmlns:c="urn:config" targetNamespace="urn:config"
                          elementFormDefault="qualified">
                <xs:element name="config">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="entry" type="xs:string"/>
                            <xs:element name="local" type="xs:string" form="unqualified"/>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        )
        .unwrap();

        let config = schema.global_element("config", Some("urn:config")).unwrap();
        let TypeRef::Complex(complex) = &config.type_ref else {
            panic!("expected anonymous complex type");
        };
        let ContentModel::Elements(particle) = &complex.content else {
            panic!("expected element content");
        };
        let Term::Sequence(items) = &particle.term else {
            panic!("expected sequence");
        };
        let namespaces: Vec<Option<&str>> = items
            .iter()
            .map(|p| match &p.term {
                Term::Element(decl) => decl.namespace.as_deref(),
                _ => panic!("expected element"),
            })
            .collect();
        assert_eq!(namespaces, vec![Some("urn:config"), None]);
    }

    #[test]
    fn test_unresolved_type_is_rejected() {
        let err = load(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="a" type="missingType"/>
            </xs:schema>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("src-resolve"));
        assert!(err.to_string().contains("missingType"));
    }

    #[test]
    fn test_malformed_schema_is_parse_error() {
        let err = load("<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\">").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_non_schema_root_is_rejected() {
        let err = load("<config/>").unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_include_is_rejected() {
        let err = load(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:include schemaLocation="other.xsd"/>
            </xs:schema>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("xs:include is not supported"));
    }

    #[test]
    fn test_invalid_occurs_are_rejected() {
        let err = load(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="a">
                    <xs:complexType>
                        <xs:sequence>
                            <xs:element name="b" minOccurs="3" maxOccurs="2"/>
                        </xs:sequence>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("minOccurs (3)"));
    }

    #[test]
    fn test_duplicate_global_type_is_rejected() {
        let err = load(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:simpleType name="t"><xs:restriction base="xs:string"/></xs:simpleType>
                <xs:complexType name="t"/>
            </xs:schema>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("'t' is declared twice"));
    }

    #[test]
    fn test_circular_extension_is_rejected() {
        let err = load(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="a">
                    <xs:complexContent><xs:extension base="b"/></xs:complexContent>
                </xs:complexType>
                <xs:complexType name="b">
                    <xs:complexContent><xs:extension base="a"/></xs:complexContent>
                </xs:complexType>
            </xs:schema>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Circular definitions"));
    }

    #[test]
    fn test_circular_group_is_rejected() {
        let err = load(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:group name="g"><xs:sequence><xs:group ref="h"/></xs:sequence></xs:group>
                <xs:group name="h"><xs:choice><xs:group ref="g"/></xs:choice></xs:group>
            </xs:schema>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Circular group"));
    }

    #[test]
    fn test_unsupported_builtin_is_rejected() {
        let err = load(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="a" type="xs:language"/>
            </xs:schema>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("xs:language"));
    }

    #[test]
    fn test_extensions_and_attribute_groups() {
        let schema = load(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:attributeGroup name="common">
                    <xs:attribute name="id" type="xs:ID" use="required"/>
                </xs:attributeGroup>
                <xs:complexType name="base">
                    <xs:sequence><xs:element name="a" type="xs:string"/></xs:sequence>
                    <xs:attributeGroup ref="common"/>
                </xs:complexType>
                <xs:complexType name="derived">
                    <xs:complexContent>
                        <xs:extension base="base">
                            <xs:sequence><xs:element name="b" type="xs:int"/></xs:sequence>
                            <xs:attribute name="flag" type="xs:boolean"/>
                            <xs:attribute name="gone" use="prohibited"/>
                        </xs:extension>
                    </xs:complexContent>
                </xs:complexType>
            </xs:schema>"#,
        )
        .unwrap();

        let derived = &schema.complex_types["derived"];
        assert!(matches!(derived.base, Some(TypeRef::Named(ref name)) if name == "base"));
        assert_eq!(derived.attributes.len(), 1);
        assert!(matches!(derived.content, ContentModel::Elements(_)));
        assert_eq!(schema.complex_types["base"].attribute_groups, vec!["common"]);
    }

    #[test]
    fn test_list_and_union() {
        let schema = load(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:simpleType name="ints"><xs:list itemType="xs:int"/></xs:simpleType>
                <xs:simpleType name="intOrAuto">
                    <xs:union memberTypes="xs:int">
                        <xs:simpleType>
                            <xs:restriction base="xs:token"><xs:enumeration value="auto"/></xs:restriction>
                        </xs:simpleType>
                    </xs:union>
                </xs:simpleType>
            </xs:schema>"#,
        )
        .unwrap();

        assert!(matches!(
            schema.simple_types["ints"].variety,
            SimpleVariety::List { .. }
        ));
        match &schema.simple_types["intOrAuto"].variety {
            SimpleVariety::Union { members } => assert_eq!(members.len(), 2),
            other => panic!("unexpected variety {other:?}"),
        }
    }

    #[test]
    fn test_load_from_source_reports_io() {
        let source = SchemaSource::file("/nonexistent/cfglint/schema.xsd");
        let err = SchemaLoader::new().load_from_source(&source).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
