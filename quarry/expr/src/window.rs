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

//! Window definition value types.
//!
//! [WindowDefinition] and [OrderBy] are deep value types: equality and
//! hashing are structural, so two `OVER` clauses spelled identically in
//! different places of a query compare equal and end up in the same
//! sort/aggregate stage.

use std::fmt;

use itertools::izip;

use crate::expr::{format_expr_list, Expr};
use crate::window_frame::WindowFrame;
use crate::window_function::WindowFunctionKind;

/// Sort specification: index i describes the sort behavior of `exprs[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderBy {
    /// sort keys, outermost first
    pub exprs: Vec<Expr>,
    /// whether keys[i] sorts in descending order
    pub descending: Vec<bool>,
    /// where nulls sort for keys[i]; None leaves the engine default
    pub nulls_first: Vec<Option<bool>>,
}

impl OrderBy {
    /// Create a sort specification. All three sequences describe the same
    /// keys and must have the same length.
    pub fn new(exprs: Vec<Expr>, descending: Vec<bool>, nulls_first: Vec<Option<bool>>) -> Self {
        debug_assert_eq!(exprs.len(), descending.len());
        debug_assert_eq!(exprs.len(), nulls_first.len());
        Self {
            exprs,
            descending,
            nulls_first,
        }
    }

    /// Sort every key ascending with engine-default null ordering.
    pub fn ascending(exprs: Vec<Expr>) -> Self {
        let len = exprs.len();
        Self {
            exprs,
            descending: vec![false; len],
            nulls_first: vec![None; len],
        }
    }

    /// Whether there are no sort keys at all.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for (expr, descending, nulls_first) in
            izip!(&self.exprs, &self.descending, &self.nulls_first)
        {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}", expr)?;
            if *descending {
                write!(f, " DESC")?;
            }
            match nulls_first {
                Some(true) => write!(f, " NULLS FIRST")?,
                Some(false) => write!(f, " NULLS LAST")?,
                None => {}
            }
        }
        Ok(())
    }
}

/// The window over which a window function runs: partitioning, ordering
/// within each partition, and the visible frame.
///
/// Structural equality over all three fields is the grouping key during
/// planning: window functions with equal definitions share one
/// sort/aggregate stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowDefinition {
    /// rows sharing equal values on these expressions form one partition
    pub partition_by: Vec<Expr>,
    /// ordering of rows inside each partition
    pub order_by: Option<OrderBy>,
    /// rows of the partition visible to the function
    pub frame: WindowFrame,
}

impl WindowDefinition {
    /// Create a window definition with the default frame.
    pub fn new(partition_by: Vec<Expr>, order_by: Option<OrderBy>) -> Self {
        Self {
            partition_by,
            order_by,
            frame: WindowFrame::default(),
        }
    }
}

impl fmt::Display for WindowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut need_space = false;
        if !self.partition_by.is_empty() {
            write!(f, "PARTITION BY {}", format_expr_list(&self.partition_by))?;
            need_space = true;
        }
        if let Some(order_by) = &self.order_by {
            if need_space {
                write!(f, " ")?;
            }
            write!(f, "ORDER BY {}", order_by)?;
            need_space = true;
        }
        if self.frame != WindowFrame::default() {
            if need_space {
                write!(f, " ")?;
            }
            write!(f, "{}", self.frame)?;
        }
        Ok(())
    }
}

/// A window function application: the function, its arguments and the
/// window it runs over. Belongs to exactly one [WindowDefinition].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowFunction {
    /// the function evaluated over the window
    pub fun: WindowFunctionKind,
    /// list of expressions to feed to the function
    pub args: Vec<Expr>,
    /// the window the function runs over
    pub window_definition: WindowDefinition,
}

impl WindowFunction {
    /// Create a window function application.
    pub fn new(fun: WindowFunctionKind, args: Vec<Expr>, window_definition: WindowDefinition) -> Self {
        Self {
            fun,
            args,
            window_definition,
        }
    }
}

impl fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}({}) OVER ({})",
            self.fun,
            format_expr_list(&self.args),
            self.window_definition
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::col;
    use crate::window_function::find_window_func;

    fn avg_over(definition: WindowDefinition) -> WindowFunction {
        WindowFunction::new(find_window_func("avg").unwrap(), vec![col("x")], definition)
    }

    #[test]
    fn equal_definitions_compare_equal() {
        let a = WindowDefinition::new(vec![col("dept")], None);
        let b = WindowDefinition::new(vec![col("dept")], None);
        assert_eq!(a, b);

        let c = WindowDefinition::new(
            vec![col("dept")],
            Some(OrderBy::new(vec![col("salary")], vec![true], vec![Some(false)])),
        );
        assert_ne!(a, c);
    }

    #[test]
    fn display_over_clause() {
        let definition = WindowDefinition::new(
            vec![col("dept")],
            Some(OrderBy::new(vec![col("salary")], vec![true], vec![Some(false)])),
        );
        assert_eq!(
            avg_over(definition).to_string(),
            "AVG(#x) OVER (PARTITION BY #dept ORDER BY #salary DESC NULLS LAST)"
        );
    }

    #[test]
    fn display_empty_over_clause() {
        let function = avg_over(WindowDefinition::new(vec![], None));
        assert_eq!(function.to_string(), "AVG(#x) OVER ()");
    }
}
