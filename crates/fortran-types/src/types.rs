// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type definitions for the type checker.

use std::fmt;

use compact_str::CompactString;
use fortran_resolve::{Symbol, TypeName};

/// The type of an expression or a data entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Integer,
    /// `real` and `double precision`.
    Real,
    Complex,
    Logical,
    Character,
    Derived(CompactString),
    /// An array of `elem` with `size` elements when the size is a
    /// constant.
    Array { elem: Box<Ty>, size: Option<u64> },
    Unknown,
}

impl Ty {
    pub fn array(elem: Ty, size: Option<u64>) -> Ty {
        Ty::Array { elem: Box::new(elem), size }
    }

    pub fn from_type_name(name: &TypeName) -> Ty {
        match name {
            TypeName::Integer => Ty::Integer,
            TypeName::Real | TypeName::DoublePrecision => Ty::Real,
            TypeName::Complex => Ty::Complex,
            TypeName::Logical => Ty::Logical,
            TypeName::Character => Ty::Character,
            TypeName::Derived(name) => Ty::Derived(name.clone()),
        }
    }

    /// Declared type of a data symbol. Arrays take the product of their
    /// constant extents as size.
    pub fn of_symbol(symbol: &Symbol) -> Ty {
        let base = symbol.ty.as_ref().map_or(Ty::Unknown, Ty::from_type_name);
        match &symbol.dims {
            None => base,
            Some(_) if base == Ty::Unknown => Ty::Unknown,
            Some(dims) => {
                let size = dims.iter().try_fold(1u64, |acc, d| d.and_then(|d| acc.checked_mul(d)));
                Ty::array(base, size)
            }
        }
    }

    /// The element type of an array, or the type itself.
    pub fn element(&self) -> &Ty {
        match self {
            Ty::Array { elem, .. } => elem,
            other => other,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Ty::Array { .. })
    }

    pub fn is_unknown(&self) -> bool {
        *self == Ty::Unknown
    }

    /// Rank among the numeric types; the wider type wins in mixed
    /// arithmetic.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            Ty::Integer => Some(0),
            Ty::Real => Some(1),
            Ty::Complex => Some(2),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Whether a value of type `value` may be assigned to an entity of this
    /// type. Unknown types are assignable both ways.
    pub fn accepts(&self, value: &Ty) -> bool {
        match (self, value) {
            (Ty::Unknown, _) | (_, Ty::Unknown) => true,
            (a, b) if a == b => true,
            (Ty::Real, Ty::Integer) => true,
            (Ty::Array { elem, size }, Ty::Array { elem: other, size: other_size }) => {
                let sizes_match = match (size, other_size) {
                    (Some(a), Some(b)) => a == b,
                    _ => true,
                };
                sizes_match && elem.accepts(other)
            }
            // A scalar is broadcast to every element.
            (Ty::Array { elem, .. }, scalar) => elem.accepts(scalar),
            _ => false,
        }
    }

    /// A common element type for two values, as in an array constructor.
    pub fn unify(&self, other: &Ty) -> Ty {
        match (self, other) {
            (a, b) if a == b => a.clone(),
            (Ty::Integer, Ty::Real) | (Ty::Real, Ty::Integer) => Ty::Real,
            (Ty::Array { elem, size }, Ty::Array { elem: other, size: other_size }) if size == other_size => {
                match elem.unify(other) {
                    Ty::Unknown => Ty::Unknown,
                    elem => Ty::array(elem, *size),
                }
            }
            _ => Ty::Unknown,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Integer => write!(f, "integer"),
            Ty::Real => write!(f, "real"),
            Ty::Complex => write!(f, "complex"),
            Ty::Logical => write!(f, "logical"),
            Ty::Character => write!(f, "character"),
            Ty::Derived(name) => write!(f, "type({})", name),
            Ty::Array { elem, size: Some(size) } => write!(f, "{} array({})", elem, size),
            Ty::Array { elem, size: None } => write!(f, "{} array", elem),
            Ty::Unknown => write!(f, "unknown type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignability() {
        assert!(Ty::Real.accepts(&Ty::Integer));
        assert!(!Ty::Integer.accepts(&Ty::Real));
        assert!(!Ty::Complex.accepts(&Ty::Integer));
        assert!(!Ty::Integer.accepts(&Ty::Character));
        assert!(Ty::Logical.accepts(&Ty::Unknown));
        assert!(Ty::array(Ty::Real, Some(3)).accepts(&Ty::array(Ty::Integer, Some(3))));
        assert!(!Ty::array(Ty::Real, Some(3)).accepts(&Ty::array(Ty::Integer, Some(4))));
        assert!(Ty::array(Ty::Real, None).accepts(&Ty::array(Ty::Real, Some(4))));
        assert!(Ty::array(Ty::Real, Some(3)).accepts(&Ty::Integer));
        assert!(!Ty::Real.accepts(&Ty::array(Ty::Real, Some(3))));
        assert!(!Ty::Derived("a".into()).accepts(&Ty::Derived("b".into())));
    }

    #[test]
    fn unification() {
        assert_eq!(Ty::Integer.unify(&Ty::Real), Ty::Real);
        assert_eq!(Ty::Logical.unify(&Ty::Logical), Ty::Logical);
        assert_eq!(Ty::Logical.unify(&Ty::Integer), Ty::Unknown);
    }

    #[test]
    fn display() {
        assert_eq!(Ty::Character.to_string(), "character");
        assert_eq!(Ty::array(Ty::Integer, Some(6)).to_string(), "integer array(6)");
        assert_eq!(Ty::array(Ty::Real, None).to_string(), "real array");
        assert_eq!(Ty::Unknown.to_string(), "unknown type");
    }
}
