//! FOOL types.
//!
//! A closed sum over the type kinds of the language. Source annotations only
//! ever name `int`, `bool` or a class; arrow, method and class types are built
//! by the symbol table from declarations.

use std::fmt;

/// A FOOL type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// `int`
    Int,
    /// `bool`
    Bool,
    /// The type of `null`.
    Empty,
    /// A reference to an instance of the named class.
    Ref(String),
    /// A function type.
    Arrow(ArrowType),
    /// A method type: an arrow reached through a dispatch table.
    Method(ArrowType),
    /// The layout type of a class declaration.
    Class(ClassType),
    /// A type that could not be resolved (e.g. an undeclared class name).
    ///
    /// Checks that meet it give up silently: the cause has already been
    /// reported where the type was written.
    Unresolved,
}

/// Parameter and return types of a function or method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrowType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
}

impl ArrowType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.params.iter().all(Type::is_complete) && self.ret.is_complete()
    }
}

/// Field and method types of a class, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub fields: Vec<Type>,
    pub methods: Vec<ArrowType>,
}

impl Type {
    /// Whether every component of the type is resolved.
    pub fn is_complete(&self) -> bool {
        match self {
            Type::Int | Type::Bool | Type::Empty | Type::Ref(_) => true,
            Type::Arrow(arrow) | Type::Method(arrow) => arrow.is_complete(),
            Type::Class(class) => {
                class.fields.iter().all(Type::is_complete)
                    && class.methods.iter().all(ArrowType::is_complete)
            }
            Type::Unresolved => false,
        }
    }

    /// Short name of the type kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Type::Int => "IntType",
            Type::Bool => "BoolType",
            Type::Empty => "EmptyType",
            Type::Ref(_) => "RefType",
            Type::Arrow(_) => "ArrowType",
            Type::Method(_) => "MethodType",
            Type::Class(_) => "ClassType",
            Type::Unresolved => "Unresolved",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Empty => write!(f, "null"),
            Type::Ref(name) => write!(f, "{name}"),
            Type::Arrow(arrow) => write!(f, "{arrow}"),
            Type::Method(arrow) => write!(f, "method {arrow}"),
            Type::Class(class) => {
                write!(f, "class(")?;
                for (i, field) in class.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, ") {{")?;
                for (i, method) in class.methods.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {method}")?;
                }
                write!(f, " }}")
            }
            Type::Unresolved => write!(f, "?"),
        }
    }
}

impl fmt::Display for ArrowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_is_deep() {
        let complete = Type::Arrow(ArrowType::new(vec![Type::Int], Type::Bool));
        assert!(complete.is_complete());

        let partial = Type::Class(ClassType {
            fields: vec![Type::Int],
            methods: vec![ArrowType::new(vec![Type::Unresolved], Type::Int)],
        });
        assert!(!partial.is_complete());
    }

    #[test]
    fn display() {
        let arrow = ArrowType::new(vec![Type::Int, Type::Ref("Acc".into())], Type::Bool);
        assert_eq!(Type::Arrow(arrow.clone()).to_string(), "(int, Acc) -> bool");
        assert_eq!(Type::Method(arrow).to_string(), "method (int, Acc) -> bool");
        let class = ClassType {
            fields: vec![Type::Int],
            methods: vec![ArrowType::new(vec![], Type::Int)],
        };
        assert_eq!(Type::Class(class).to_string(), "class(int) { () -> int }");
    }
}
