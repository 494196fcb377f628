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

//! Logical plan node set
//!
//! Plans are immutable trees over name-based expressions. The variant set is
//! closed on purpose: lowering dispatches over it exhaustively, so a missing
//! case is a compile error instead of a silently unhandled node.

use std::fmt;
use std::sync::Arc;

use crate::expr::{format_expr_list, Expr};
use crate::window::{WindowDefinition, WindowFunction};

/// A logical plan node.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    /// Collects the rows of an upstream relation from the nodes holding its
    /// shards. Opaque leaf from the window planner's point of view: built by
    /// the upstream plan builder, only its outputs and placement matter here.
    Collect(Collect),
    /// Evaluates one group of window functions sharing a window definition.
    WindowAgg(WindowAgg),
}

impl LogicalPlan {
    /// The ordered list of expressions this node exposes to its consumer.
    pub fn outputs(&self) -> &[Expr] {
        match self {
            LogicalPlan::Collect(collect) => &collect.outputs,
            LogicalPlan::WindowAgg(window_agg) => window_agg.outputs(),
        }
    }
}

/// Leaf node reading a relation wherever its shards currently live.
#[derive(Debug, Clone, PartialEq)]
pub struct Collect {
    /// columns the relation produces, in row order
    pub outputs: Vec<Expr>,
    /// ids of the nodes holding shards of the relation
    pub node_ids: Vec<String>,
}

/// Window aggregation node: applies every function of one window definition
/// in a single pass over its input.
///
/// Constructed only by the window-function grouper; nodes form a chain, one
/// per distinct window definition, each feeding the next.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAgg {
    input: Arc<LogicalPlan>,
    window_definition: WindowDefinition,
    window_functions: Vec<WindowFunction>,
    standalone: Vec<Expr>,
    outputs: Vec<Expr>,
}

impl WindowAgg {
    /// Create a window aggregation over `input`.
    ///
    /// `standalone` carries the input's outputs through unchanged so that a
    /// select list can project any upstream column next to a window function
    /// result; the node's own outputs are the window function columns
    /// followed by the standalone columns.
    pub fn new(
        input: Arc<LogicalPlan>,
        window_definition: WindowDefinition,
        window_functions: Vec<WindowFunction>,
        standalone: Vec<Expr>,
    ) -> Self {
        let outputs = window_functions
            .iter()
            .cloned()
            .map(Expr::WindowFunction)
            .chain(standalone.iter().cloned())
            .collect();
        Self {
            input,
            window_definition,
            window_functions,
            standalone,
            outputs,
        }
    }

    /// Replace the input subtree, keeping window definition, functions,
    /// standalone columns and outputs exactly as they are.
    ///
    /// This is the only transformation a constructed node supports; it never
    /// regroups or revalidates.
    pub fn with_new_input(&self, input: Arc<LogicalPlan>) -> Self {
        Self {
            input,
            window_definition: self.window_definition.clone(),
            window_functions: self.window_functions.clone(),
            standalone: self.standalone.clone(),
            outputs: self.outputs.clone(),
        }
    }

    /// Input plan
    pub fn input(&self) -> &Arc<LogicalPlan> {
        &self.input
    }

    /// The window every function of this node runs over.
    pub fn window_definition(&self) -> &WindowDefinition {
        &self.window_definition
    }

    /// Functions evaluated by this node, in query order.
    pub fn window_functions(&self) -> &[WindowFunction] {
        &self.window_functions
    }

    /// Columns of the input passed through unchanged.
    pub fn standalone(&self) -> &[Expr] {
        &self.standalone
    }

    /// Window function columns first, then the standalone columns.
    pub fn outputs(&self) -> &[Expr] {
        &self.outputs
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_indent(f, 0)
    }
}

impl LogicalPlan {
    fn fmt_indent(&self, f: &mut fmt::Formatter, indent: usize) -> fmt::Result {
        if indent > 0 {
            writeln!(f)?;
            write!(f, "{:indent$}", "", indent = indent * 2)?;
        }
        match self {
            LogicalPlan::Collect(collect) => {
                write!(f, "Collect[{}]", format_expr_list(&collect.outputs))
            }
            LogicalPlan::WindowAgg(window_agg) => {
                let functions = window_agg
                    .window_functions
                    .iter()
                    .map(|function| function.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "WindowAgg[{}]", functions)?;
                window_agg.input.fmt_indent(f, indent + 1)
            }
        }
    }
}
