// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The intrinsic procedure table.

/// Whether an intrinsic is called as a function or with `call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicKind {
    Function,
    Subroutine,
}

/// Result type of an intrinsic function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicResult {
    Integer,
    Real,
    Double,
    Complex,
    Logical,
    Character,
    /// Same type as the first argument (`abs`, `max`, `sum`, ...).
    FirstArgument,
    /// Element type of the first argument with the array shape dropped.
    Element,
    NoResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intrinsic {
    pub name: &'static str,
    pub kind: IntrinsicKind,
    pub result: IntrinsicResult,
}

const fn func(name: &'static str, result: IntrinsicResult) -> Intrinsic {
    Intrinsic { name, kind: IntrinsicKind::Function, result }
}

const fn sub(name: &'static str) -> Intrinsic {
    Intrinsic { name, kind: IntrinsicKind::Subroutine, result: IntrinsicResult::NoResult }
}

use IntrinsicResult::*;

const INTRINSICS: &[Intrinsic] = &[
    // Numeric
    func("abs", FirstArgument),
    func("iabs", Integer),
    func("dabs", Double),
    func("aint", FirstArgument),
    func("anint", FirstArgument),
    func("ceiling", Integer),
    func("floor", Integer),
    func("nint", Integer),
    func("int", Integer),
    func("ifix", Integer),
    func("idint", Integer),
    func("real", Real),
    func("float", Real),
    func("sngl", Real),
    func("dble", Double),
    func("cmplx", Complex),
    func("aimag", Real),
    func("conjg", Complex),
    func("dim", FirstArgument),
    func("dprod", Double),
    func("max", FirstArgument),
    func("min", FirstArgument),
    func("max0", Integer),
    func("min0", Integer),
    func("amax1", Real),
    func("amin1", Real),
    func("dmax1", Double),
    func("dmin1", Double),
    func("mod", FirstArgument),
    func("modulo", FirstArgument),
    func("sign", FirstArgument),
    // Mathematical
    func("sqrt", FirstArgument),
    func("dsqrt", Double),
    func("exp", FirstArgument),
    func("dexp", Double),
    func("log", FirstArgument),
    func("alog", Real),
    func("dlog", Double),
    func("log10", FirstArgument),
    func("alog10", Real),
    func("sin", FirstArgument),
    func("cos", FirstArgument),
    func("tan", FirstArgument),
    func("asin", FirstArgument),
    func("acos", FirstArgument),
    func("atan", FirstArgument),
    func("atan2", FirstArgument),
    func("sinh", FirstArgument),
    func("cosh", FirstArgument),
    func("tanh", FirstArgument),
    func("dsin", Double),
    func("dcos", Double),
    func("datan", Double),
    // Numeric inquiry
    func("huge", FirstArgument),
    func("tiny", FirstArgument),
    func("epsilon", FirstArgument),
    func("digits", Integer),
    func("precision", Integer),
    func("range", Integer),
    func("radix", Integer),
    func("kind", Integer),
    func("selected_int_kind", Integer),
    func("selected_real_kind", Integer),
    // Character
    func("len", Integer),
    func("len_trim", Integer),
    func("index", Integer),
    func("scan", Integer),
    func("verify", Integer),
    func("ichar", Integer),
    func("iachar", Integer),
    func("char", Character),
    func("achar", Character),
    func("trim", Character),
    func("adjustl", Character),
    func("adjustr", Character),
    func("repeat", Character),
    func("lge", Logical),
    func("lgt", Logical),
    func("lle", Logical),
    func("llt", Logical),
    // Bits
    func("iand", Integer),
    func("ior", Integer),
    func("ieor", Integer),
    func("not", Integer),
    func("ishft", Integer),
    func("ishftc", Integer),
    func("ibset", Integer),
    func("ibclr", Integer),
    func("ibits", Integer),
    func("btest", Logical),
    func("bit_size", Integer),
    // Arrays
    func("size", Integer),
    func("shape", Integer),
    func("lbound", Integer),
    func("ubound", Integer),
    func("count", Integer),
    func("maxloc", Integer),
    func("minloc", Integer),
    func("any", Logical),
    func("all", Logical),
    func("sum", Element),
    func("product", Element),
    func("maxval", Element),
    func("minval", Element),
    func("dot_product", Element),
    func("matmul", FirstArgument),
    func("transpose", FirstArgument),
    func("reshape", FirstArgument),
    func("spread", FirstArgument),
    func("pack", FirstArgument),
    func("unpack", FirstArgument),
    func("cshift", FirstArgument),
    func("eoshift", FirstArgument),
    func("merge", FirstArgument),
    // Inquiry
    func("present", Logical),
    func("allocated", Logical),
    func("associated", Logical),
    func("null", NoResult),
    // Subroutines
    sub("cpu_time"),
    sub("date_and_time"),
    sub("system_clock"),
    sub("random_number"),
    sub("random_seed"),
    sub("mvbits"),
    sub("move_alloc"),
    sub("get_command"),
    sub("get_command_argument"),
    sub("get_environment_variable"),
    sub("execute_command_line"),
    sub("exit"),
];

/// Modules provided by the compiler rather than by source.
const INTRINSIC_MODULES: &[&str] = &[
    "iso_c_binding",
    "iso_fortran_env",
    "ieee_arithmetic",
    "ieee_exceptions",
    "ieee_features",
    "omp_lib",
    "mpi",
];

/// Look up an intrinsic procedure by lowercased name.
pub fn intrinsic(name: &str) -> Option<&'static Intrinsic> {
    INTRINSICS.iter().find(|i| i.name == name)
}

pub fn is_intrinsic_module(name: &str) -> bool {
    INTRINSIC_MODULES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_lowercase() {
        for (i, a) in INTRINSICS.iter().enumerate() {
            assert_eq!(a.name, a.name.to_ascii_lowercase());
            assert!(INTRINSICS[i + 1..].iter().all(|b| b.name != a.name), "duplicate {}", a.name);
        }
    }

    #[test]
    fn lookup() {
        assert_eq!(intrinsic("sqrt").map(|i| i.kind), Some(IntrinsicKind::Function));
        assert_eq!(intrinsic("cpu_time").map(|i| i.kind), Some(IntrinsicKind::Subroutine));
        assert_eq!(intrinsic("len").map(|i| i.result), Some(IntrinsicResult::Integer));
        assert!(intrinsic("solve").is_none());
        assert!(is_intrinsic_module("iso_c_binding"));
    }
}
