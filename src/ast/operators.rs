use crate::rules::{RuleTable, access, arithmetic, compare, logic};

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical negation (`not x`)
    Not,
    /// Arithmetic negation (`-x`)
    Neg,
    /// Bitwise negation (`~x`)
    BitNot,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 3] = [UnaryOp::Not, UnaryOp::Neg, UnaryOp::BitNot];

    pub fn nodetype(self) -> &'static str {
        match self {
            UnaryOp::Not => "unop_not",
            UnaryOp::Neg => "unop_neg",
            UnaryOp::BitNot => "unop_bitnot",
        }
    }

    /// Source text in front of the operand.
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "not ",
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            UnaryOp::Not => 5,
            UnaryOp::Neg | UnaryOp::BitNot => 14,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            UnaryOp::Not => "Logical \"not\" expression",
            UnaryOp::Neg => "Arithmetic negation expression",
            UnaryOp::BitNot => "Bitwise not expression",
        }
    }

    pub fn table(self) -> &'static RuleTable {
        match self {
            UnaryOp::Not => &logic::NOT,
            UnaryOp::Neg => &arithmetic::NEG,
            UnaryOp::BitNot => &arithmetic::BITNOT,
        }
    }
}

/// Binary operators, including item access (`x[y]`).
///
/// All of them are left associative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Comparison
    /// Equal (`==`)
    Eq,
    /// Not equal (`!=`)
    Ne,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Le,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Ge,

    // Arithmetic
    Add,
    Sub,
    Mul,
    /// Floor division (`//`)
    FloorDiv,
    /// True division (`/`)
    TrueDiv,
    Mod,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitOr,
    BitXor,

    // Logical
    And,
    Or,

    // Membership and identity
    Contains,
    NotContains,
    Is,
    IsNot,

    /// Item access (`x[y]`)
    Item,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 24] = [
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Gt,
        BinaryOp::Ge,
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::FloorDiv,
        BinaryOp::TrueDiv,
        BinaryOp::Mod,
        BinaryOp::ShiftLeft,
        BinaryOp::ShiftRight,
        BinaryOp::BitAnd,
        BinaryOp::BitOr,
        BinaryOp::BitXor,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Contains,
        BinaryOp::NotContains,
        BinaryOp::Is,
        BinaryOp::IsNot,
        BinaryOp::Item,
    ];

    pub fn nodetype(self) -> &'static str {
        match self {
            BinaryOp::Eq => "cmp_eq",
            BinaryOp::Ne => "cmp_ne",
            BinaryOp::Lt => "cmp_lt",
            BinaryOp::Le => "cmp_le",
            BinaryOp::Gt => "cmp_gt",
            BinaryOp::Ge => "cmp_ge",
            BinaryOp::Add => "binop_add",
            BinaryOp::Sub => "binop_sub",
            BinaryOp::Mul => "binop_mul",
            BinaryOp::FloorDiv => "binop_floordiv",
            BinaryOp::TrueDiv => "binop_truediv",
            BinaryOp::Mod => "binop_mod",
            BinaryOp::ShiftLeft => "binop_shiftleft",
            BinaryOp::ShiftRight => "binop_shiftright",
            BinaryOp::BitAnd => "binop_bitand",
            BinaryOp::BitOr => "binop_bitor",
            BinaryOp::BitXor => "binop_bitxor",
            BinaryOp::And => "binop_and",
            BinaryOp::Or => "binop_or",
            BinaryOp::Contains => "binop_contains",
            BinaryOp::NotContains => "binop_notcontains",
            BinaryOp::Is => "binop_is",
            BinaryOp::IsNot => "binop_isnot",
            BinaryOp::Item => "binop_item",
        }
    }

    /// Source text between the operands.
    ///
    /// Item access has no infix operator and returns `[`.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => " == ",
            BinaryOp::Ne => " != ",
            BinaryOp::Lt => " < ",
            BinaryOp::Le => " <= ",
            BinaryOp::Gt => " > ",
            BinaryOp::Ge => " >= ",
            BinaryOp::Add => " + ",
            BinaryOp::Sub => " - ",
            BinaryOp::Mul => " * ",
            BinaryOp::FloorDiv => " // ",
            BinaryOp::TrueDiv => " / ",
            BinaryOp::Mod => " % ",
            BinaryOp::ShiftLeft => " << ",
            BinaryOp::ShiftRight => " >> ",
            BinaryOp::BitAnd => " & ",
            BinaryOp::BitOr => " | ",
            BinaryOp::BitXor => " ^ ",
            BinaryOp::And => " and ",
            BinaryOp::Or => " or ",
            BinaryOp::Contains => " in ",
            BinaryOp::NotContains => " not in ",
            BinaryOp::Is => " is ",
            BinaryOp::IsNot => " is not ",
            BinaryOp::Item => "[",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Item => 16,
            BinaryOp::Mul | BinaryOp::FloorDiv | BinaryOp::TrueDiv | BinaryOp::Mod => 12,
            BinaryOp::Add | BinaryOp::Sub => 11,
            BinaryOp::ShiftLeft | BinaryOp::ShiftRight => 10,
            BinaryOp::BitAnd => 9,
            BinaryOp::BitXor => 8,
            BinaryOp::BitOr => 7,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::Contains
            | BinaryOp::NotContains
            | BinaryOp::Is
            | BinaryOp::IsNot => 6,
            BinaryOp::And => 5,
            BinaryOp::Or => 4,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BinaryOp::Eq => "Equality comparison",
            BinaryOp::Ne => "Inequality comparison",
            BinaryOp::Lt => "Less-than comparison",
            BinaryOp::Le => "Less-than or equal comparison",
            BinaryOp::Gt => "Greater-than comparison",
            BinaryOp::Ge => "Greater-than or equal comparison",
            BinaryOp::Add => "Addition",
            BinaryOp::Sub => "Subtraction",
            BinaryOp::Mul => "Multiplication",
            BinaryOp::FloorDiv => "Floor division",
            BinaryOp::TrueDiv => "True division",
            BinaryOp::Mod => "Modulo expression",
            BinaryOp::ShiftLeft => "Left shift expression",
            BinaryOp::ShiftRight => "Right shift expression",
            BinaryOp::BitAnd => "Bitwise \"and\" expression",
            BinaryOp::BitOr => "Bitwise \"or\" expression",
            BinaryOp::BitXor => "Bitwise \"exclusive or\" expression",
            BinaryOp::And => "Logical \"and\" expression",
            BinaryOp::Or => "Logical \"or\" expression",
            BinaryOp::Contains => "Containment test",
            BinaryOp::NotContains => "Inverted containment test",
            BinaryOp::Is => "Identity test",
            BinaryOp::IsNot => "Inverted identity test",
            BinaryOp::Item => "Item access expression",
        }
    }

    pub fn table(self) -> &'static RuleTable {
        match self {
            BinaryOp::Eq => &compare::EQ,
            BinaryOp::Ne => &compare::NE,
            BinaryOp::Lt => &compare::LT,
            BinaryOp::Le => &compare::LE,
            BinaryOp::Gt => &compare::GT,
            BinaryOp::Ge => &compare::GE,
            BinaryOp::Add => &arithmetic::ADD,
            BinaryOp::Sub => &arithmetic::SUB,
            BinaryOp::Mul => &arithmetic::MUL,
            BinaryOp::FloorDiv => &arithmetic::FLOORDIV,
            BinaryOp::TrueDiv => &arithmetic::TRUEDIV,
            BinaryOp::Mod => &arithmetic::MOD,
            BinaryOp::ShiftLeft => &arithmetic::SHIFTLEFT,
            BinaryOp::ShiftRight => &arithmetic::SHIFTRIGHT,
            BinaryOp::BitAnd => &arithmetic::BITAND,
            BinaryOp::BitOr => &arithmetic::BITOR,
            BinaryOp::BitXor => &arithmetic::BITXOR,
            BinaryOp::And => &logic::AND,
            BinaryOp::Or => &logic::OR,
            BinaryOp::Contains => &compare::CONTAINS,
            BinaryOp::NotContains => &compare::NOTCONTAINS,
            BinaryOp::Is => &compare::IS,
            BinaryOp::IsNot => &compare::ISNOT,
            BinaryOp::Item => &access::ITEM,
        }
    }
}
