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

//! Expression rewriter
//!
//! Also home of [SourceOutputs], the binder that turns name-based
//! expressions into positional [InputColumn] references against the output
//! schema of the upstream plan stage.

use indexmap::IndexMap;
use quarry_common::{internal_err, Result};

use crate::expr::{Expr, InputColumn};
use crate::window::{OrderBy, WindowDefinition, WindowFunction};

/// Controls how the [ExprRewriter] recursion should proceed.
pub enum RewriteRecursion {
    /// Continue rewrite / visit this expression.
    Continue,
    /// Call [ExprRewriter::mutate()] immediately and return.
    Mutate,
    /// Do not rewrite / visit the children of this expression.
    Stop,
    /// Keep recursive but skip mutate on this expression
    Skip,
}

/// Trait for potentially recursively rewriting an [`Expr`] expression
/// tree. When passed to `Expr::rewrite`, `ExprRewriter::mutate` is
/// invoked recursively on all nodes of an expression tree.
pub trait ExprRewriter<E: ExprRewritable = Expr>: Sized {
    /// Invoked before any children of `expr` are rewritten /
    /// visited. Default implementation returns `Ok(RewriteRecursion::Continue)`
    fn pre_visit(&mut self, _expr: &E) -> Result<RewriteRecursion> {
        Ok(RewriteRecursion::Continue)
    }

    /// Invoked after all children of `expr` have been mutated and
    /// returns a potentially modified expr.
    fn mutate(&mut self, expr: E) -> Result<E>;
}

/// a trait for marking types that are rewritable by [ExprRewriter]
pub trait ExprRewritable: Sized {
    /// rewrite the expression tree using the given [ExprRewriter]
    fn rewrite<R: ExprRewriter<Self>>(self, rewriter: &mut R) -> Result<Self>;
}

impl ExprRewritable for Expr {
    /// Performs a depth first walk of an expression and its children
    /// to rewrite an expression, consuming `self` producing a new
    /// [`Expr`].
    ///
    /// If an Err result is returned, recursion is stopped immediately.
    fn rewrite<R>(self, rewriter: &mut R) -> Result<Self>
    where
        R: ExprRewriter<Self>,
    {
        let need_mutate = match rewriter.pre_visit(&self)? {
            RewriteRecursion::Mutate => return rewriter.mutate(self),
            RewriteRecursion::Stop => return Ok(self),
            RewriteRecursion::Continue => true,
            RewriteRecursion::Skip => false,
        };

        // recurse into all sub expressions(and cover all expression types)
        let expr = match self {
            Expr::Column(_) | Expr::Literal(_) | Expr::InputColumn(_) => self,
            Expr::ScalarFunction { name, args } => Expr::ScalarFunction {
                name,
                args: rewrite_vec(args, rewriter)?,
            },
            Expr::WindowFunction(function) => {
                let WindowFunction {
                    fun,
                    args,
                    window_definition,
                } = function;
                Expr::WindowFunction(WindowFunction {
                    fun,
                    args: rewrite_vec(args, rewriter)?,
                    window_definition: rewrite_window_definition(window_definition, rewriter)?,
                })
            }
        };

        // now rewrite this expression itself
        if need_mutate {
            rewriter.mutate(expr)
        } else {
            Ok(expr)
        }
    }
}

fn rewrite_vec<R: ExprRewriter>(exprs: Vec<Expr>, rewriter: &mut R) -> Result<Vec<Expr>> {
    exprs
        .into_iter()
        .map(|expr| expr.rewrite(rewriter))
        .collect()
}

fn rewrite_window_definition<R: ExprRewriter>(
    definition: WindowDefinition,
    rewriter: &mut R,
) -> Result<WindowDefinition> {
    let WindowDefinition {
        partition_by,
        order_by,
        frame,
    } = definition;
    let order_by = match order_by {
        Some(order_by) => {
            let OrderBy {
                exprs,
                descending,
                nulls_first,
            } = order_by;
            Some(OrderBy::new(
                rewrite_vec(exprs, rewriter)?,
                descending,
                nulls_first,
            ))
        }
        None => None,
    };
    Ok(WindowDefinition {
        partition_by: rewrite_vec(partition_by, rewriter)?,
        order_by,
        frame,
    })
}

/// The ordered output schema of an upstream plan stage, used to bind
/// expressions of the next stage to row positions.
///
/// An expression that structurally equals one of the outputs is replaced by
/// an [InputColumn] pointing at that output's position, whole-expression
/// matches taking precedence over matches of their sub-expressions. A named
/// column that matches no output is an invariant violation: the
/// required-column computation during logical planning must have requested
/// it, so its absence is a planner bug, not a user error.
#[derive(Debug)]
pub struct SourceOutputs {
    /// position of every distinct output; first occurrence wins
    positions: IndexMap<Expr, usize>,
}

impl SourceOutputs {
    /// Capture the output schema of the stage feeding the one being bound.
    pub fn new(outputs: &[Expr]) -> Self {
        let mut positions = IndexMap::with_capacity(outputs.len());
        for (index, output) in outputs.iter().enumerate() {
            positions.entry(output.clone()).or_insert(index);
        }
        Self { positions }
    }

    /// Bind one expression to the captured schema.
    pub fn bind(&self, expr: &Expr) -> Result<Expr> {
        expr.clone().rewrite(&mut InputColumnBinder { source: self })
    }

    /// Bind a sequence of expressions, preserving order.
    pub fn bind_all(&self, exprs: &[Expr]) -> Result<Vec<Expr>> {
        exprs.iter().map(|expr| self.bind(expr)).collect()
    }

    /// Bind a window definition: partition expressions and order-by keys are
    /// bound, direction flags and the frame carry over unchanged.
    pub fn bind_window_definition(&self, definition: &WindowDefinition) -> Result<WindowDefinition> {
        let order_by = match &definition.order_by {
            Some(order_by) => Some(OrderBy::new(
                self.bind_all(&order_by.exprs)?,
                order_by.descending.clone(),
                order_by.nulls_first.clone(),
            )),
            None => None,
        };
        Ok(WindowDefinition {
            partition_by: self.bind_all(&definition.partition_by)?,
            order_by,
            frame: definition.frame.clone(),
        })
    }

    /// Bind a window function call, rewriting its arguments and window
    /// definition in place.
    pub fn bind_window_function(&self, function: &WindowFunction) -> Result<WindowFunction> {
        match self.bind(&Expr::WindowFunction(function.clone()))? {
            Expr::WindowFunction(bound) => Ok(bound),
            other => internal_err!(
                "Binding the window function {} did not yield a window function but {}",
                function,
                other
            ),
        }
    }

    fn describe(&self) -> String {
        self.positions
            .keys()
            .map(|output| output.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

struct InputColumnBinder<'a> {
    source: &'a SourceOutputs,
}

impl ExprRewriter for InputColumnBinder<'_> {
    fn pre_visit(&mut self, expr: &Expr) -> Result<RewriteRecursion> {
        // replace a whole matching expression before looking at its children
        if self.source.positions.contains_key(expr) {
            Ok(RewriteRecursion::Mutate)
        } else {
            Ok(RewriteRecursion::Continue)
        }
    }

    fn mutate(&mut self, expr: Expr) -> Result<Expr> {
        if let Some(index) = self.source.positions.get(&expr) {
            return Ok(Expr::InputColumn(InputColumn::new(*index)));
        }
        match expr {
            Expr::Column(column) => internal_err!(
                "Column {} is not part of the source outputs [{}]",
                column,
                self.source.describe()
            ),
            other => Ok(other),
        }
    }
}
