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

//! Expression visitor

use quarry_common::Result;

use crate::Expr;

/// Controls how the visitor recursion should proceed.
pub enum Recursion<V: ExpressionVisitor> {
    /// Attempt to visit all the children, recursively, of this expression.
    Continue(V),
    /// Do not visit the children of this expression, though the walk
    /// of parents of this expression will not be affected
    Stop(V),
}

/// Encode the traversal of an expression tree. When passed to
/// `Expr::accept`, `ExpressionVisitor::pre_visit` is invoked
/// recursively on all nodes of an expression tree.
pub trait ExpressionVisitor<E: ExprVisitable = Expr>: Sized {
    /// Invoked before any children of `expr` are visited.
    fn pre_visit(self, expr: &E) -> Result<Recursion<Self>>
    where
        Self: ExpressionVisitor;

    /// Invoked after all children of `expr` are visited. Default
    /// implementation does nothing.
    fn post_visit(self, _expr: &E) -> Result<Self> {
        Ok(self)
    }
}

/// trait for types that can be visited by [`ExpressionVisitor`]
pub trait ExprVisitable: Sized {
    /// accept a visitor, calling `visit` on all children of this
    fn accept<V: ExpressionVisitor<Self>>(&self, visitor: V) -> Result<V>;
}

impl ExprVisitable for Expr {
    /// Performs a depth first walk of an expression and its children,
    /// calling [`ExpressionVisitor::pre_visit`] and `visitor.post_visit`.
    ///
    /// If `Recursion::Stop` is returned on a call to pre_visit, no
    /// children of that expression are visited, nor is post_visit
    /// called on that expression
    fn accept<V: ExpressionVisitor>(&self, visitor: V) -> Result<V> {
        let visitor = match visitor.pre_visit(self)? {
            Recursion::Continue(visitor) => visitor,
            // If the recursion should stop, do not visit children
            Recursion::Stop(visitor) => return Ok(visitor),
        };

        // recurse (and cover all expression types)
        let visitor = match self {
            Expr::Column(_) | Expr::Literal(_) | Expr::InputColumn(_) => Ok(visitor),
            Expr::ScalarFunction { args, .. } => args
                .iter()
                .try_fold(visitor, |visitor, arg| arg.accept(visitor)),
            Expr::WindowFunction(function) => {
                let visitor = function
                    .args
                    .iter()
                    .try_fold(visitor, |visitor, arg| arg.accept(visitor))?;
                let visitor = function
                    .window_definition
                    .partition_by
                    .iter()
                    .try_fold(visitor, |visitor, partition| partition.accept(visitor))?;
                match &function.window_definition.order_by {
                    Some(order_by) => order_by
                        .exprs
                        .iter()
                        .try_fold(visitor, |visitor, key| key.accept(visitor)),
                    None => Ok(visitor),
                }
            }
        }?;

        visitor.post_visit(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, lit};
    use crate::window::{OrderBy, WindowDefinition, WindowFunction};
    use crate::window_function::find_window_func;

    /// Records every visited expression in pre-visit order.
    struct Collector {
        visited: Vec<String>,
    }

    impl ExpressionVisitor for Collector {
        fn pre_visit(mut self, expr: &Expr) -> Result<Recursion<Self>> {
            self.visited.push(expr.to_string());
            Ok(Recursion::Continue(self))
        }
    }

    #[test]
    fn visits_window_function_children() {
        let function = Expr::WindowFunction(WindowFunction::new(
            find_window_func("sum").unwrap(),
            vec![col("x")],
            WindowDefinition::new(
                vec![col("dept")],
                Some(OrderBy::ascending(vec![col("salary")])),
            ),
        ));
        let collector = function.accept(Collector { visited: vec![] }).unwrap();
        assert_eq!(
            collector.visited,
            vec![
                function.to_string(),
                "#x".to_string(),
                "#dept".to_string(),
                "#salary".to_string(),
            ]
        );
    }

    #[test]
    fn leaves_have_no_children() {
        let collector = lit(1_i64).accept(Collector { visited: vec![] }).unwrap();
        assert_eq!(collector.visited, vec!["1".to_string()]);
    }
}
