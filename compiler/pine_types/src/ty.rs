//! Value types.

use std::fmt;

use pine_ir::TypeAnnotation;

/// The type of a value.
///
/// `Series(T)` is a per-bar value of element type `T`; everything else is a
/// plain (single) value. `Unknown` is the inference fallback and is
/// compatible with every other type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Bool,
    Str,
    Color,
    Series(Box<Type>),
    Array(Box<Type>),
    Matrix(Box<Type>),
    Tuple(Vec<Type>),
    Function { params: Vec<Type>, ret: Box<Type> },
    Udt(String),
    Na,
    Unknown,
    Void,
}

impl Type {
    /// `series<T>`; a series stays a series.
    pub fn series(inner: Type) -> Type {
        match inner {
            Type::Series(_) => inner,
            other => Type::Series(Box::new(other)),
        }
    }

    /// `series<T>` when `as_series` holds, `T` otherwise.
    pub fn series_if(inner: Type, as_series: bool) -> Type {
        if as_series {
            Type::series(inner)
        } else {
            inner
        }
    }

    pub fn is_series(&self) -> bool {
        matches!(self, Type::Series(_))
    }

    /// Current-bar view of a value: the element type of a series, the type
    /// itself otherwise.
    pub fn scalar(&self) -> &Type {
        match self {
            Type::Series(inner) => inner,
            other => other,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.scalar(), Type::Int | Type::Float)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    /// Whether a value of type `self` may be stored where `target` is
    /// expected.
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        match (self, target) {
            (Type::Unknown, _) | (_, Type::Unknown) | (Type::Na, _) => true,
            // A series decays to its current-bar value.
            (Type::Series(inner), _) => inner.is_assignable_to(target),
            // Scalar promotion.
            (_, Type::Series(inner)) => self.is_assignable_to(inner),
            (Type::Int, Type::Float) => true,
            (Type::Array(a), Type::Array(b)) | (Type::Matrix(a), Type::Matrix(b)) => {
                a.is_assignable_to(b)
            }
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_assignable_to(y))
            }
            (
                Type::Function { params: pa, ret: ra },
                Type::Function { params: pb, ret: rb },
            ) => {
                pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(x, y)| y.is_assignable_to(x))
                    && ra.is_assignable_to(rb)
            }
            (a, b) => a == b,
        }
    }

    /// Common type of two branches of a conditional.
    ///
    /// `na` adopts the other side; `int` and `float` meet at `float`; a
    /// series on either side makes the result a series.
    pub fn unify(&self, other: &Type) -> Type {
        let as_series = self.is_series() || other.is_series();
        let scalar = match (self.scalar(), other.scalar()) {
            (Type::Na, t) | (t, Type::Na) => t.clone(),
            (Type::Unknown, t) | (t, Type::Unknown) => t.clone(),
            (Type::Void, t) | (t, Type::Void) => t.clone(),
            (Type::Int, Type::Float) | (Type::Float, Type::Int) => Type::Float,
            (a, b) if a == b => a.clone(),
            _ => Type::Unknown,
        };
        Type::series_if(scalar, as_series)
    }

    /// Resolve a written type. Unrecognised names are taken to be user types.
    pub fn from_annotation(ty: &TypeAnnotation) -> Type {
        let arg = |i: usize| ty.args.get(i).map_or(Type::Unknown, Type::from_annotation);
        match ty.name.as_str() {
            "int" => Type::Int,
            "float" => Type::Float,
            "bool" => Type::Bool,
            "string" => Type::Str,
            "color" => Type::Color,
            "series" => Type::series(arg(0)),
            "array" => Type::Array(Box::new(arg(0))),
            "matrix" => Type::Matrix(Box::new(arg(0))),
            // Drawing handles and maps are opaque here.
            "map" | "line" | "label" | "box" | "table" | "linefill" | "polyline" => {
                Type::Unknown
            }
            name => Type::Udt(name.to_string()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, items: &[Type]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::Bool => f.write_str("bool"),
            Type::Str => f.write_str("string"),
            Type::Color => f.write_str("color"),
            Type::Series(inner) => write!(f, "series<{inner}>"),
            Type::Array(inner) => write!(f, "array<{inner}>"),
            Type::Matrix(inner) => write!(f, "matrix<{inner}>"),
            Type::Tuple(items) => {
                f.write_str("[")?;
                list(f, items)?;
                f.write_str("]")
            }
            Type::Function { params, ret } => {
                f.write_str("fn(")?;
                list(f, params)?;
                write!(f, ") -> {ret}")
            }
            Type::Udt(name) => f.write_str(name),
            Type::Na => f.write_str("na"),
            Type::Unknown => f.write_str("unknown"),
            Type::Void => f.write_str("void"),
        }
    }
}
