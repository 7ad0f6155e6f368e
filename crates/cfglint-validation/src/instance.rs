//! Validation of a parsed document against a compiled schema

use crate::content::{ContentMatcher, ContentMismatch};
use crate::engine::Violation;
use crate::rules::{self, ANY_SIMPLE_TYPE};
use cfglint_ir::{Document, MAX_DEPTH, Node, Position};
use cfglint_schema::model::{AttributeUse, ContentModel, TypeDef, XML_NAMESPACE, XSI_NAMESPACE};
use cfglint_schema::{BuiltinType, ComplexType, ElementDecl, Particle, Schema, TypeRef};

/// Content of a complex type after folding in its base chain
enum EffectiveContent<'s> {
    Empty { mixed: bool },
    Simple(&'s TypeRef),
    Elements { particles: Vec<&'s Particle>, mixed: bool },
}

/// Walks a document, collecting violations in document order
pub struct InstanceValidator<'s> {
    schema: &'s Schema,
    max_violations: usize,
    violations: Vec<Violation>,
    depth: usize,
}

impl<'s> InstanceValidator<'s> {
    /// `max_violations` of zero collects every violation
    pub fn new(schema: &'s Schema, max_violations: usize) -> Self {
        Self {
            schema,
            max_violations,
            violations: Vec::new(),
            depth: 0,
        }
    }

    pub fn validate(mut self, document: &Document) -> Vec<Violation> {
        let root = &document.root;
        match self
            .schema
            .global_element(&root.name, root.namespace.as_deref())
        {
            Some(decl) => self.element(root, decl),
            None => self.report(
                root.position,
                format!(
                    "cvc-elt.1.a: Cannot find the declaration of element '{}'.",
                    root.name
                ),
            ),
        }
        self.violations
    }

    fn is_full(&self) -> bool {
        self.max_violations != 0 && self.violations.len() >= self.max_violations
    }

    fn report(&mut self, position: Position, message: String) {
        if !self.is_full() {
            self.violations.push(Violation::at(position, message));
        }
    }

    fn element(&mut self, node: &Node, decl: &'s ElementDecl) {
        if self.is_full() {
            return;
        }
        if self.depth >= MAX_DEPTH {
            self.report(
                node.position,
                format!(
                    "Element '{}' is nested deeper than the maximum depth of {MAX_DEPTH}.",
                    node.name
                ),
            );
            return;
        }

        self.depth += 1;
        self.element_content(node, decl);
        self.depth -= 1;
    }

    fn element_content(&mut self, node: &Node, decl: &'s ElementDecl) {
        match self.schema.resolve(&decl.type_ref) {
            Some(TypeDef::Builtin(BuiltinType::AnyType)) => {}
            Some(TypeDef::Builtin(_) | TypeDef::Simple(_)) => {
                self.simple_element(node, &decl.type_ref);
            }
            Some(TypeDef::Complex(complex)) => self.complex_element(node, complex),
            None => self.report(
                node.position,
                format!(
                    "src-resolve: Cannot resolve the name '{}' to a(n) 'type definition' component.",
                    self.schema.type_name(&decl.type_ref)
                ),
            ),
        }
    }

    fn simple_element(&mut self, node: &Node, type_ref: &'s TypeRef) {
        for attr in &node.attributes {
            if !is_instance_attribute(attr.namespace.as_deref()) {
                self.report(
                    node.position,
                    format!(
                        "cvc-type.3.1.1: Element '{}' is a simple type, so it cannot have attributes, excepting those whose namespace name is identical to '{}' and whose [local name] is one of 'type', 'nil', 'schemaLocation' or 'noNamespaceSchemaLocation'. However, the attribute, '{}' was found.",
                        node.name, XSI_NAMESPACE, attr.name
                    ),
                );
            }
        }

        if node.children.is_empty() {
            self.element_value(node, type_ref);
        } else {
            self.report(
                node.position,
                format!(
                    "cvc-type.3.1.2: Element '{}' is a simple type, so it must have no element information item [children].",
                    node.name
                ),
            );
        }
    }

    fn element_value(&mut self, node: &Node, type_ref: &'s TypeRef) {
        if let Err(detail) = rules::check_value(self.schema, type_ref, &node.text) {
            self.report(
                node.position,
                format!(
                    "cvc-type.3.1.3: The value '{}' of element '{}' is not valid. {}",
                    node.text,
                    node.name,
                    detail
                ),
            );
        }
    }

    fn complex_element(&mut self, node: &Node, complex: &'s ComplexType) {
        self.attributes(node, complex);

        match self.effective_content(complex) {
            EffectiveContent::Empty { mixed } => {
                if let Some(child) = node.children.first() {
                    self.report(
                        child.position,
                        format!(
                            "cvc-complex-type.2.1: Element '{}' must have no character or element information item [children], because the type's content type is empty.",
                            node.name
                        ),
                    );
                } else if !mixed && node.has_significant_text() {
                    self.report(
                        node.position,
                        format!(
                            "cvc-complex-type.2.1: Element '{}' must have no character or element information item [children], because the type's content type is empty.",
                            node.name
                        ),
                    );
                }
            }
            EffectiveContent::Simple(type_ref) => {
                if let Some(child) = node.children.first() {
                    self.report(
                        child.position,
                        format!(
                            "cvc-complex-type.2.2: Element '{}' must have no element [children], and the value must be valid.",
                            node.name
                        ),
                    );
                } else {
                    self.element_value(node, type_ref);
                }
            }
            EffectiveContent::Elements { particles, mixed } => {
                if !mixed && node.has_significant_text() {
                    self.report(
                        node.position,
                        format!(
                            "cvc-complex-type.2.3: Element '{}' cannot have character [children], because the type's content type is element-only.",
                            node.name
                        ),
                    );
                }
                self.children(node, &particles);
            }
        }
    }

    fn children(&mut self, node: &Node, particles: &[&'s Particle]) {
        let result = ContentMatcher::new(self.schema, &node.children).run(particles);
        let stop = result.mismatch.as_ref().map_or(usize::MAX, |m| m.at);

        // Children before the mismatch are validated first, keeping document order
        let (before, after): (Vec<_>, Vec<_>) = result
            .assignments
            .into_iter()
            .partition(|(index, _)| *index < stop);

        self.assigned_children(node, before);
        if let Some(mismatch) = result.mismatch {
            self.content_mismatch(node, &mismatch);
        }
        self.assigned_children(node, after);
    }

    fn assigned_children(
        &mut self,
        node: &Node,
        assignments: Vec<(usize, Option<&'s ElementDecl>)>,
    ) {
        for (index, decl) in assignments {
            if let Some(decl) = decl {
                self.element(&node.children[index], decl);
            }
        }
    }

    fn content_mismatch(&mut self, node: &Node, mismatch: &ContentMismatch) {
        let expected = format!("{{{}}}", mismatch.expected.join(", "));
        match node.children.get(mismatch.at) {
            Some(child) if mismatch.expected.is_empty() => self.report(
                child.position,
                format!(
                    "cvc-complex-type.2.4.d: Invalid content was found starting with element '{}'. No child element is expected at this point.",
                    child.name
                ),
            ),
            Some(child) => self.report(
                child.position,
                format!(
                    "cvc-complex-type.2.4.a: Invalid content was found starting with element '{}'. One of '{}' is expected.",
                    child.name, expected
                ),
            ),
            None => self.report(
                node.position,
                format!(
                    "cvc-complex-type.2.4.b: The content of element '{}' is not complete. One of '{}' is expected.",
                    node.name, expected
                ),
            ),
        }
    }

    fn effective_content(&self, complex: &'s ComplexType) -> EffectiveContent<'s> {
        if let ContentModel::Simple = complex.content {
            let text_type =
                rules::simple_content_type(self.schema, complex).unwrap_or(&ANY_SIMPLE_TYPE);
            return EffectiveContent::Simple(text_type);
        }

        let mut particles = Vec::new();
        let mut mixed = false;
        self.collect_particles(complex, &mut particles, &mut mixed);

        if particles.is_empty() {
            EffectiveContent::Empty { mixed }
        } else {
            EffectiveContent::Elements { particles, mixed }
        }
    }

    /// Base type particles come first, then the particles the type adds
    fn collect_particles(
        &self,
        complex: &'s ComplexType,
        particles: &mut Vec<&'s Particle>,
        mixed: &mut bool,
    ) {
        if let Some(TypeDef::Complex(base)) = self.base_type(complex) {
            self.collect_particles(base, particles, mixed);
        }
        *mixed |= complex.mixed;
        if let ContentModel::Elements(particle) = &complex.content {
            particles.push(particle);
        }
    }

    fn attributes(&mut self, node: &Node, complex: &'s ComplexType) {
        let mut uses = Vec::new();
        let mut any_attribute = false;
        self.collect_attributes(complex, &mut uses, &mut any_attribute);

        for attr in &node.attributes {
            let namespace = attr.namespace.as_deref();
            let declared = namespace.is_none() && uses.iter().any(|u| u.name == attr.name);
            if !declared && !any_attribute && !is_instance_attribute(namespace) {
                self.report(
                    node.position,
                    format!(
                        "cvc-complex-type.3.2.2: Attribute '{}' is not allowed to appear in element '{}'.",
                        attr.name, node.name
                    ),
                );
            }
        }

        for attr_use in uses {
            match node.attribute(&attr_use.name) {
                Some(value) => self.attribute_value(node, attr_use, value),
                None if attr_use.required => self.report(
                    node.position,
                    format!(
                        "cvc-complex-type.4: Attribute '{}' must appear on element '{}'.",
                        attr_use.name, node.name
                    ),
                ),
                None => {}
            }
        }
    }

    fn attribute_value(&mut self, node: &Node, attr_use: &'s AttributeUse, value: &str) {
        let normalized = match rules::check_value(self.schema, &attr_use.type_ref, value) {
            Ok(normalized) => normalized,
            Err(detail) => {
                self.report(
                    node.position,
                    format!(
                        "cvc-attribute.3: The value '{}' of attribute '{}' on element '{}' is not valid with respect to its type, '{}'. {}",
                        value,
                        attr_use.name,
                        node.name,
                        self.schema.type_name(&attr_use.type_ref),
                        detail
                    ),
                );
                return;
            }
        };

        if let Some(fixed) = &attr_use.fixed {
            let expected = rules::check_value(self.schema, &attr_use.type_ref, fixed)
                .unwrap_or_else(|_| fixed.clone());
            if normalized != expected {
                self.report(
                    node.position,
                    format!(
                        "cvc-attribute.4: The value '{}' of attribute '{}' on element '{}' is not valid with respect to its fixed {{value constraint}}. The attribute must have a value of '{}'.",
                        value, attr_use.name, node.name, fixed
                    ),
                );
            }
        }
    }

    /// Own attributes and attribute groups, then those of the base chain
    fn collect_attributes(
        &self,
        complex: &'s ComplexType,
        uses: &mut Vec<&'s AttributeUse>,
        any: &mut bool,
    ) {
        uses.extend(&complex.attributes);
        for group in &complex.attribute_groups {
            self.collect_group_attributes(group, uses, any);
        }
        *any |= complex.any_attribute;

        if let Some(TypeDef::Complex(base)) = self.base_type(complex) {
            self.collect_attributes(base, uses, any);
        }
    }

    fn base_type(&self, complex: &'s ComplexType) -> Option<TypeDef<'s>> {
        complex.base.as_ref().and_then(|b| self.schema.resolve(b))
    }

    fn collect_group_attributes(
        &self,
        name: &str,
        uses: &mut Vec<&'s AttributeUse>,
        any: &mut bool,
    ) {
        let Some(group) = self.schema.attribute_groups.get(name) else {
            return;
        };
        uses.extend(&group.attributes);
        *any |= group.any_attribute;
        for nested in &group.attribute_groups {
            self.collect_group_attributes(nested, uses, any);
        }
    }
}

/// Attributes every element may carry
fn is_instance_attribute(namespace: Option<&str>) -> bool {
    matches!(namespace, Some(XSI_NAMESPACE | XML_NAMESPACE))
}
