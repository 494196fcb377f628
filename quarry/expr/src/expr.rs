// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Expr module contains the core expression tree used during planning.
//!
//! Expressions start out column-name based ([Expr::Column]) and are rewritten
//! into positional form ([Expr::InputColumn]) when a logical operator is
//! lowered against the concrete output schema of its input. Equality is
//! structural everywhere, which is what makes window definitions usable as
//! grouping keys.

use std::fmt;

use quarry_common::{Column, ScalarValue};

use crate::window::WindowFunction;

/// An expression node in the planner's symbol tree.
///
/// Immutable once constructed; two expressions are equal iff their shape and
/// sub-expressions are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A named reference to a column produced by the source relation.
    Column(Column),
    /// A constant value.
    Literal(ScalarValue),
    /// A scalar function invocation over sub-expressions.
    ScalarFunction {
        /// name of the function
        name: String,
        /// list of expressions to feed to the function
        args: Vec<Expr>,
    },
    /// A window function invocation, carrying its window definition.
    WindowFunction(WindowFunction),
    /// A resolved positional reference into a physical input row.
    ///
    /// Only valid relative to the upstream schema it was resolved against;
    /// produced exclusively by [crate::expr_rewriter::SourceOutputs].
    InputColumn(InputColumn),
}

/// A resolved reference to a field of the input row by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputColumn {
    index: usize,
}

impl InputColumn {
    /// Create an input column reference for the field at `index`.
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    /// Zero-based position inside the input row.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for InputColumn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "INPUT({})", self.index)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Column(column) => write!(f, "{}", column),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::ScalarFunction { name, args } => {
                write!(f, "{}({})", name, format_expr_list(args))
            }
            Expr::WindowFunction(function) => write!(f, "{}", function),
            Expr::InputColumn(input) => write!(f, "{}", input),
        }
    }
}

/// Format a list of expressions the way they appear in plan output.
pub fn format_expr_list(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create an unqualified column expression based on a name.
pub fn col(name: &str) -> Expr {
    Expr::Column(Column::from_name(name))
}

/// Create a literal expression from a value convertible to a scalar.
pub fn lit(value: impl Into<ScalarValue>) -> Expr {
    Expr::Literal(value.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_column_and_literal() {
        assert_eq!(col("a").to_string(), "#a");
        assert_eq!(lit(7_i64).to_string(), "7");
        assert_eq!(Expr::InputColumn(InputColumn::new(3)).to_string(), "INPUT(3)");
    }

    #[test]
    fn display_scalar_function() {
        let expr = Expr::ScalarFunction {
            name: "abs".to_string(),
            args: vec![col("x")],
        };
        assert_eq!(expr.to_string(), "abs(#x)");
    }

    #[test]
    fn structural_equality() {
        assert_eq!(col("a"), col("a"));
        assert_ne!(col("a"), col("b"));
        assert_ne!(col("a"), Expr::InputColumn(InputColumn::new(0)));
    }
}
