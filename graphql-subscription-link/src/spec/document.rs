use std::fmt;
use std::sync::Arc;

use apollo_compiler::ast;

use crate::spec::SpecError;

/// A parsed GraphQL document, along with the source text it was parsed from.
///
/// The source is what goes over the wire; the AST is what the link inspects.
#[derive(Debug)]
pub struct Document {
    source: String,
    ast: ast::Document,
}

impl Document {
    /// Parse an executable GraphQL document.
    pub fn parse(source: impl Into<String>) -> Result<Arc<Self>, SpecError> {
        let source = source.into();
        let ast = ast::Document::parse(source.as_str(), "operation.graphql")
            .map_err(|invalid| SpecError::ParseError(invalid.errors.to_string()))?;
        Ok(Arc::new(Self { source, ast }))
    }

    /// The text this document was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Document {}

/// The kind of a GraphQL operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ast::OperationType> for OperationKind {
    fn from(value: ast::OperationType) -> Self {
        match value {
            ast::OperationType::Query => OperationKind::Query,
            ast::OperationType::Mutation => OperationKind::Mutation,
            ast::OperationType::Subscription => OperationKind::Subscription,
        }
    }
}

/// The definition that drives the execution of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MainDefinition {
    /// An operation definition of the given kind.
    Operation(OperationKind),
    /// A document with no operation, only fragments.
    Fragment,
}

/// Find the main definition of a document.
///
/// The document may only contain operations and fragments, with at most one operation. That
/// operation is the main definition; a document without one falls back to its first fragment.
pub fn main_definition(document: &Document) -> Result<MainDefinition, SpecError> {
    let mut operations = 0;
    for definition in &document.ast.definitions {
        match definition {
            ast::Definition::OperationDefinition(_) => operations += 1,
            ast::Definition::FragmentDefinition(_) => {}
            other => {
                return Err(SpecError::NonExecutableDefinition(
                    describe(other).to_string(),
                ));
            }
        }
    }
    if operations > 1 {
        return Err(SpecError::AmbiguousDocument(operations));
    }

    let mut fragment = None;
    for definition in &document.ast.definitions {
        match definition {
            ast::Definition::OperationDefinition(operation) => {
                return Ok(MainDefinition::Operation(operation.operation_type.into()));
            }
            ast::Definition::FragmentDefinition(_) if fragment.is_none() => {
                fragment = Some(MainDefinition::Fragment);
            }
            _ => {}
        }
    }
    fragment.ok_or(SpecError::NoMainDefinition)
}

fn describe(definition: &ast::Definition) -> &'static str {
    match definition {
        ast::Definition::OperationDefinition(_) => "an operation definition",
        ast::Definition::FragmentDefinition(_) => "a fragment definition",
        ast::Definition::SchemaDefinition(_) => "a schema definition",
        ast::Definition::DirectiveDefinition(_) => "a directive definition",
        ast::Definition::ScalarTypeDefinition(_) => "a scalar type definition",
        ast::Definition::ObjectTypeDefinition(_) => "an object type definition",
        ast::Definition::InterfaceTypeDefinition(_) => "an interface type definition",
        ast::Definition::UnionTypeDefinition(_) => "a union type definition",
        ast::Definition::EnumTypeDefinition(_) => "an enum type definition",
        ast::Definition::InputObjectTypeDefinition(_) => "an input object type definition",
        _ => "a type system extension",
    }
}
