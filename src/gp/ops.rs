//! Operator metadata for the genetic operators.
//!
//! This table only describes the language to crossover and mutation; the
//! evaluator has its own dispatch. Keeping the two separate means a typo
//! here degrades evolution, not search.

/// Coarse expression types used for compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    /// Numeric expression.
    Number,
    /// Boolean condition.
    Boolean,
    /// A tree node (what `argmax`/`argmin` return).
    Node,
    /// Matches anything.
    Any,
}

/// Whether an `expected` slot accepts an `actual` type.
#[must_use]
pub fn type_matches(expected: TypeTag, actual: TypeTag) -> bool {
    expected == actual || expected == TypeTag::Any || actual == TypeTag::Any
}

/// Shape of one operator as the genetic operators see it.
#[derive(Debug, Clone, Copy)]
pub struct OperatorDescriptor {
    /// Surface name.
    pub name: &'static str,
    /// Input type per argument slot.
    pub inputs: &'static [TypeTag],
    /// Result type.
    pub returns: TypeTag,
}

impl OperatorDescriptor {
    /// Argument count.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    /// Whether two operators can replace each other: same arity, same
    /// return type, and pairwise compatible inputs.
    #[must_use]
    pub fn interchangeable_with(&self, other: &OperatorDescriptor) -> bool {
        self.arity() == other.arity()
            && self.returns == other.returns
            && self
                .inputs
                .iter()
                .zip(other.inputs.iter())
                .all(|(&a, &b)| type_matches(a, b))
    }
}

const NUM2: &[TypeTag] = &[TypeTag::Number, TypeTag::Number];
const NUM1: &[TypeTag] = &[TypeTag::Number];
const ANY2: &[TypeTag] = &[TypeTag::Any, TypeTag::Any];
const BOOL2: &[TypeTag] = &[TypeTag::Boolean, TypeTag::Boolean];

/// Every operator the genetic machinery may touch.
pub const OPERATORS: &[OperatorDescriptor] = &[
    OperatorDescriptor { name: "+", inputs: NUM2, returns: TypeTag::Number },
    OperatorDescriptor { name: "-", inputs: NUM2, returns: TypeTag::Number },
    OperatorDescriptor { name: "*", inputs: NUM2, returns: TypeTag::Number },
    OperatorDescriptor { name: "/", inputs: NUM2, returns: TypeTag::Number },
    OperatorDescriptor { name: "sqrt", inputs: NUM1, returns: TypeTag::Number },
    OperatorDescriptor { name: "log", inputs: NUM1, returns: TypeTag::Number },
    OperatorDescriptor { name: "argmin", inputs: NUM1, returns: TypeTag::Node },
    OperatorDescriptor { name: "argmax", inputs: NUM1, returns: TypeTag::Node },
    OperatorDescriptor { name: "eq", inputs: ANY2, returns: TypeTag::Boolean },
    OperatorDescriptor { name: "neq", inputs: ANY2, returns: TypeTag::Boolean },
    OperatorDescriptor { name: "lt", inputs: NUM2, returns: TypeTag::Boolean },
    OperatorDescriptor { name: "gt", inputs: NUM2, returns: TypeTag::Boolean },
    OperatorDescriptor { name: "lte", inputs: NUM2, returns: TypeTag::Boolean },
    OperatorDescriptor { name: "gte", inputs: NUM2, returns: TypeTag::Boolean },
    OperatorDescriptor { name: "and", inputs: BOOL2, returns: TypeTag::Boolean },
    OperatorDescriptor { name: "or", inputs: BOOL2, returns: TypeTag::Boolean },
];

/// Interchangeable leaf categories. Two leaves from the same set may swap
/// even though their names differ.
pub const AGGREGATES: &[&str] = &["min", "max", "avg", "sum"];
/// Node-type constants.
pub const NODE_TYPES: &[&str] = &["maxNode", "minNode", "orNode", "andNode"];
/// Tri-valued proof outcomes.
pub const PROOF_VALUES: &[&str] = &["true", "false", "unknown"];
/// Numeric variables a program can read.
pub const NUMERIC_VARIABLES: &[&str] = &[
    "proofNumber",
    "disproofNumber",
    "value",
    "visitCount",
    "C",
    "T",
    "valueEstimate",
    "numChildren",
    "depth",
];

/// Looks an operator up by surface name.
#[must_use]
pub fn operator(name: &str) -> Option<&'static OperatorDescriptor> {
    OPERATORS.iter().find(|op| op.name == name)
}

/// Whether `text` is a numeric literal. Requires a digit so that the
/// keyword `inf` (which `f64::from_str` accepts) stays a symbol.
#[must_use]
pub fn is_numeric_literal(text: &str) -> bool {
    text.parse::<f64>().is_ok() && text.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_operators_interchange() {
        let plus = operator("+").expect("+");
        let div = operator("/").expect("/");
        assert!(plus.interchangeable_with(div));
        let sqrt = operator("sqrt").expect("sqrt");
        assert!(!plus.interchangeable_with(sqrt));
    }

    #[test]
    fn comparisons_do_not_interchange_with_connectives_only_one_way() {
        let eq = operator("eq").expect("eq");
        let and = operator("and").expect("and");
        // Any-typed inputs are compatible with Boolean inputs
        assert!(eq.interchangeable_with(and));
        let lt = operator("lt").expect("lt");
        // Number inputs are not Boolean inputs
        assert!(!lt.interchangeable_with(and));
    }

    #[test]
    fn numeric_literals() {
        assert!(is_numeric_literal("-1.5"));
        assert!(is_numeric_literal("0"));
        assert!(!is_numeric_literal("inf"));
        assert!(!is_numeric_literal("visitCount"));
    }
}
