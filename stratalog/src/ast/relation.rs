//! This module defines the AST-level [Relation] declaration.

/// A declared relation with its typed attributes and qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    attributes: Vec<(String, String)>,
    input: bool,
    output: bool,
    printsize: bool,
}

impl Relation {
    /// Declare a relation; attributes are `(name, type name)` pairs.
    pub fn new(name: impl Into<String>, attributes: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            attributes,
            input: false,
            output: false,
            printsize: false,
        }
    }

    /// Declare a relation whose attributes are all of type `number`.
    pub fn numeric(name: impl Into<String>, attribute_names: &[&str]) -> Self {
        Self::new(
            name,
            attribute_names
                .iter()
                .map(|attribute| (attribute.to_string(), "number".to_string()))
                .collect(),
        )
    }

    /// Mark the relation as an input read from the facts directory.
    pub fn input(mut self) -> Self {
        self.input = true;
        self
    }

    /// Mark the relation as an output stored to the output directory.
    pub fn output(mut self) -> Self {
        self.output = true;
        self
    }

    /// Mark the relation for size printing.
    pub fn printsize(mut self) -> Self {
        self.printsize = true;
        self
    }

    /// Name of the relation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of columns.
    pub fn arity(&self) -> usize {
        self.attributes.len()
    }

    /// The `(name, type name)` pairs of the columns.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Whether the relation is an input.
    pub fn is_input(&self) -> bool {
        self.input
    }

    /// Whether the relation is an output.
    pub fn is_output(&self) -> bool {
        self.output
    }

    /// Whether the relation's size is printed.
    pub fn is_printsize(&self) -> bool {
        self.printsize
    }
}
