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

//! Physical projections
//!
//! A projection is one step of an execution plan, transforming an input row
//! stream into an output row stream. Every expression inside a projection is
//! positional ([quarry_expr::InputColumn]) or constant; projections are the
//! specification the execution runtime works from, they do not execute
//! anything themselves.

use std::fmt;

use indexmap::IndexMap;
use quarry_expr::expr::format_expr_list;
use quarry_expr::{Expr, OrderBy, WindowDefinition, WindowFunction};

/// The closed set of projection kinds window planning emits.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Sorts the row stream, optionally truncating it.
    OrderedTopN(OrderedTopNProjection),
    /// Evaluates one group of window functions over the sorted stream.
    WindowAgg(WindowAggProjection),
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Projection::OrderedTopN(projection) => projection.fmt(f),
            Projection::WindowAgg(projection) => projection.fmt(f),
        }
    }
}

/// Sorts its input by a key and emits at most `limit` rows after skipping
/// `offset` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedTopNProjection {
    /// rows to emit after sorting; None sorts the whole stream
    pub limit: Option<usize>,
    /// rows to skip after sorting
    pub offset: usize,
    /// the row emitted for every retained input row
    pub outputs: Vec<Expr>,
    /// the sort key with its direction and null-ordering flags
    pub order_by: OrderBy,
}

impl OrderedTopNProjection {
    /// Create a sort projection. Sort keys and outputs must already be in
    /// positional form.
    pub fn new(limit: Option<usize>, offset: usize, outputs: Vec<Expr>, order_by: OrderBy) -> Self {
        Self {
            limit,
            offset,
            outputs,
            order_by,
        }
    }
}

impl fmt::Display for OrderedTopNProjection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "OrderedTopN[{}]", self.order_by)?;
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if self.offset > 0 {
            write!(f, " OFFSET {}", self.offset)?;
        }
        Ok(())
    }
}

/// Evaluates the window functions of one window definition in a single pass
/// over a stream that is already sorted by the merged partition/order-by key.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAggProjection {
    /// the shared window, in positional form
    pub window_definition: WindowDefinition,
    /// every function call mapped to its argument row positions, in query
    /// order
    pub functions: IndexMap<WindowFunction, Vec<Expr>>,
    /// input columns appended unchanged after the function results
    pub standalone: Vec<Expr>,
    /// positions of the merged sort key inside the input row; tells the
    /// runtime where partition and ordering boundaries fall
    pub order_by_indexes: Vec<usize>,
}

impl WindowAggProjection {
    /// Create a window aggregation projection.
    pub fn new(
        window_definition: WindowDefinition,
        functions: IndexMap<WindowFunction, Vec<Expr>>,
        standalone: Vec<Expr>,
        order_by_indexes: Vec<usize>,
    ) -> Self {
        Self {
            window_definition,
            functions,
            standalone,
            order_by_indexes,
        }
    }
}

impl fmt::Display for WindowAggProjection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let functions = self
            .functions
            .keys()
            .map(|function| function.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "WindowAgg[{}]", functions)?;
        if !self.standalone.is_empty() {
            write!(f, " standalone=[{}]", format_expr_list(&self.standalone))?;
        }
        Ok(())
    }
}

/// The number of rows a sort ahead of a limit/offset stage may be bounded
/// to: everything up to and including the last offset row.
pub fn limit_and_offset(limit: Option<usize>, offset: usize) -> Option<usize> {
    limit.map(|limit| limit + offset)
}
