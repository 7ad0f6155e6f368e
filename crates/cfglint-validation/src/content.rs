//! Element content matching
//!
//! Children are matched greedily against the particles of a content model.
//! Repetitions consume as many occurrences as they can, choices commit to the
//! first alternative that consumes input. When matching fails, the mismatch
//! that got furthest into the children is reported, with every element name
//! that was expected there.

use cfglint_ir::Node;
use cfglint_schema::model::Term;
use cfglint_schema::{ElementDecl, Particle, Schema};

/// Children matched to their declarations; `None` marks a wildcard match
pub type Assignment<'s> = (usize, Option<&'s ElementDecl>);

/// A point where no particle accepted the children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMismatch {
    /// Index of the first child that could not be matched
    pub at: usize,
    /// Element names that would have been accepted at `at`
    pub expected: Vec<String>,
}

impl ContentMismatch {
    fn new(at: usize, expected: impl IntoIterator<Item = String>) -> Self {
        Self {
            at,
            expected: expected.into_iter().collect(),
        }
    }

    fn merge(&mut self, other: Vec<String>) {
        for name in other {
            if !self.expected.contains(&name) {
                self.expected.push(name);
            }
        }
    }
}

/// Result of matching the children of one element
#[derive(Debug)]
pub struct ContentMatch<'s> {
    pub assignments: Vec<Assignment<'s>>,
    pub mismatch: Option<ContentMismatch>,
}

/// Matches the children of a single element against a content model
pub struct ContentMatcher<'s, 'd> {
    schema: &'s Schema,
    children: &'d [Node],
    furthest: Option<ContentMismatch>,
}

impl<'s, 'd> ContentMatcher<'s, 'd> {
    pub fn new(schema: &'s Schema, children: &'d [Node]) -> Self {
        Self {
            schema,
            children,
            furthest: None,
        }
    }

    /// Match all children against `particles` in sequence
    pub fn run(mut self, particles: &[&'s Particle]) -> ContentMatch<'s> {
        let mut assignments = Vec::new();
        let mut pos = 0;

        for particle in particles {
            match self.particle(particle, pos, &mut assignments) {
                Ok(end) => pos = end,
                Err(mismatch) => {
                    self.record(mismatch);
                    return ContentMatch {
                        assignments,
                        mismatch: self.furthest,
                    };
                }
            }
        }

        if pos < self.children.len() {
            self.record(ContentMismatch::new(pos, Vec::new()));
            return ContentMatch {
                assignments,
                mismatch: self.furthest,
            };
        }

        ContentMatch {
            assignments,
            mismatch: None,
        }
    }

    fn record(&mut self, mismatch: ContentMismatch) {
        if let Some(furthest) = &mut self.furthest {
            if furthest.at == mismatch.at {
                furthest.merge(mismatch.expected);
                return;
            }
            if furthest.at > mismatch.at {
                return;
            }
        }
        self.furthest = Some(mismatch);
    }

    fn particle(
        &mut self,
        particle: &'s Particle,
        start: usize,
        out: &mut Vec<Assignment<'s>>,
    ) -> Result<usize, ContentMismatch> {
        let mut count = 0;
        let mut pos = start;

        while particle.max_occurs.allows_more(count) {
            let mark = out.len();
            match self.term(&particle.term, pos, out) {
                Ok(end) if end > pos => {
                    pos = end;
                    count += 1;
                }
                // An empty match satisfies any remaining minimum
                Ok(_) => break,
                Err(mismatch) => {
                    out.truncate(mark);
                    if count < particle.min_occurs {
                        return Err(mismatch);
                    }
                    self.record(mismatch);
                    break;
                }
            }
        }

        Ok(pos)
    }

    fn term(
        &mut self,
        term: &'s Term,
        pos: usize,
        out: &mut Vec<Assignment<'s>>,
    ) -> Result<usize, ContentMismatch> {
        match term {
            Term::Element(decl) => self.element(decl, pos, out),
            Term::ElementRef(name) => match self.schema.elements.get(name) {
                Some(decl) => self.element(decl, pos, out),
                None => Err(ContentMismatch::new(pos, [name.clone()])),
            },
            Term::GroupRef(name) => match self.schema.groups.get(name) {
                Some(group) => self.particle(group, pos, out),
                None => Err(ContentMismatch::new(pos, Vec::new())),
            },
            Term::Sequence(items) => items
                .iter()
                .try_fold(pos, |next, item| self.particle(item, next, out)),
            Term::Choice(items) => self.choice(items, pos, out),
            Term::All(items) => self.all(items, pos, out),
            Term::Any => {
                if pos < self.children.len() {
                    out.push((pos, None));
                    Ok(pos + 1)
                } else {
                    Err(ContentMismatch::new(pos, ["WC[##any]".to_string()]))
                }
            }
        }
    }

    fn element(
        &mut self,
        decl: &'s ElementDecl,
        pos: usize,
        out: &mut Vec<Assignment<'s>>,
    ) -> Result<usize, ContentMismatch> {
        match self.children.get(pos) {
            Some(child)
                if child.name == decl.name
                    && child.namespace.as_deref() == decl.namespace.as_deref() =>
            {
                out.push((pos, Some(decl)));
                Ok(pos + 1)
            }
            _ => Err(ContentMismatch::new(pos, [decl.name.clone()])),
        }
    }

    fn choice(
        &mut self,
        items: &'s [Particle],
        pos: usize,
        out: &mut Vec<Assignment<'s>>,
    ) -> Result<usize, ContentMismatch> {
        let mut emptiable = false;
        let mut here = ContentMismatch::new(pos, Vec::new());

        for item in items {
            let mark = out.len();
            match self.particle(item, pos, out) {
                Ok(end) if end > pos => return Ok(end),
                Ok(_) => emptiable = true,
                Err(mismatch) => {
                    out.truncate(mark);
                    if mismatch.at == pos {
                        here.merge(mismatch.expected);
                    } else {
                        self.record(mismatch);
                    }
                }
            }
        }

        if emptiable {
            if !here.expected.is_empty() {
                self.record(here);
            }
            Ok(pos)
        } else {
            Err(here)
        }
    }

    fn all(
        &mut self,
        items: &'s [Particle],
        start: usize,
        out: &mut Vec<Assignment<'s>>,
    ) -> Result<usize, ContentMismatch> {
        let mut used = vec![false; items.len()];
        let mut pos = start;

        loop {
            let mut progressed = false;
            for (index, item) in items.iter().enumerate() {
                if used[index] {
                    continue;
                }
                let mark = out.len();
                match self.term(&item.term, pos, out) {
                    Ok(end) if end > pos => {
                        used[index] = true;
                        pos = end;
                        progressed = true;
                        break;
                    }
                    _ => out.truncate(mark),
                }
            }
            if !progressed {
                break;
            }
        }

        let remaining = items
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(item, _)| item);
        let expected: Vec<String> = remaining.clone().flat_map(|p| self.first_names(p)).collect();

        if remaining.clone().any(|item| item.min_occurs > 0) {
            Err(ContentMismatch::new(pos, expected))
        } else {
            if !expected.is_empty() {
                self.record(ContentMismatch::new(pos, expected));
            }
            Ok(pos)
        }
    }

    /// Element names a particle can start with
    fn first_names(&self, particle: &'s Particle) -> Vec<String> {
        match &particle.term {
            Term::Element(decl) => vec![decl.name.clone()],
            Term::ElementRef(name) => vec![name.clone()],
            Term::GroupRef(name) => self
                .schema
                .groups
                .get(name)
                .map(|group| self.first_names(group))
                .unwrap_or_default(),
            Term::Sequence(items) => {
                let mut names = Vec::new();
                for item in items {
                    names.extend(self.first_names(item));
                    if item.min_occurs > 0 {
                        break;
                    }
                }
                names
            }
            Term::Choice(items) | Term::All(items) => {
                items.iter().flat_map(|item| self.first_names(item)).collect()
            }
            Term::Any => vec!["WC[##any]".to_string()],
        }
    }
}
