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

//! Physical execution plans
//!
//! An execution plan is position-based and execution-ordered: a plan node
//! names the cluster nodes it runs on and carries the ordered projections
//! applied to its row stream. The plan is handed to the distributed
//! execution runtime as-is; this crate never executes it.

pub mod projection;

use std::fmt;

use quarry_expr::expr::format_expr_list;
use quarry_expr::Expr;

pub use projection::{
    limit_and_offset, OrderedTopNProjection, Projection, WindowAggProjection,
};

/// A physical plan fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionPlan {
    /// Reads a relation's shards on the nodes holding them.
    Collect(Collect),
    /// Merges the row streams of its input onto a single node.
    Merge(Merge),
}

/// Leaf phase reading rows where they live.
#[derive(Debug, Clone, PartialEq)]
pub struct Collect {
    /// the row produced, in order
    pub outputs: Vec<Expr>,
    /// ids of the nodes executing this phase
    pub node_ids: Vec<String>,
    /// projections applied to the collected rows, in order
    pub projections: Vec<Projection>,
}

/// Consolidation phase: receives every shard's rows on one node.
///
/// Inserted ahead of any window stage, because window evaluation needs the
/// globally partitioned, globally ordered row stream in one place. Shipping
/// the rows is the runtime's job; the plan only records that it must happen.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    /// the plan whose outputs are merged
    pub input: Box<ExecutionPlan>,
    /// the single node receiving the merged stream
    pub node_ids: Vec<String>,
    /// projections applied after the merge, in order
    pub projections: Vec<Projection>,
}

impl Merge {
    /// Ensure the rows of `plan` end up on the coordinator before the next
    /// projection runs.
    ///
    /// A plan already executing exactly there is returned unchanged; any
    /// other placement gets wrapped in a merge, even when that costs an
    /// extra network hop.
    pub fn ensure_on_coordinator(plan: ExecutionPlan, coordinator: &str) -> ExecutionPlan {
        if matches!(plan.output_nodes(), [node] if node == coordinator) {
            return plan;
        }
        ExecutionPlan::Merge(Merge {
            input: Box::new(plan),
            node_ids: vec![coordinator.to_string()],
            projections: vec![],
        })
    }
}

impl ExecutionPlan {
    /// The nodes the outermost phase of this plan executes on.
    pub fn output_nodes(&self) -> &[String] {
        match self {
            ExecutionPlan::Collect(collect) => &collect.node_ids,
            ExecutionPlan::Merge(merge) => &merge.node_ids,
        }
    }

    /// Append a projection to the outermost phase.
    pub fn add_projection(&mut self, projection: Projection) {
        match self {
            ExecutionPlan::Collect(collect) => collect.projections.push(projection),
            ExecutionPlan::Merge(merge) => merge.projections.push(projection),
        }
    }

    /// The projections of the outermost phase, in execution order.
    pub fn projections(&self) -> &[Projection] {
        match self {
            ExecutionPlan::Collect(collect) => &collect.projections,
            ExecutionPlan::Merge(merge) => &merge.projections,
        }
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_indent(f, 0)
    }
}

impl ExecutionPlan {
    fn fmt_indent(&self, f: &mut fmt::Formatter, indent: usize) -> fmt::Result {
        if indent > 0 {
            writeln!(f)?;
            write!(f, "{:indent$}", "", indent = indent * 2)?;
        }
        match self {
            ExecutionPlan::Collect(collect) => {
                write!(f, "Collect[{}]", format_expr_list(&collect.outputs))?;
                fmt_projections(f, &collect.projections, indent)
            }
            ExecutionPlan::Merge(merge) => {
                write!(f, "Merge[{}]", merge.node_ids.join(", "))?;
                fmt_projections(f, &merge.projections, indent)?;
                merge.input.fmt_indent(f, indent + 1)
            }
        }
    }
}

fn fmt_projections(
    f: &mut fmt::Formatter,
    projections: &[Projection],
    indent: usize,
) -> fmt::Result {
    for projection in projections {
        writeln!(f)?;
        write!(f, "{:indent$}{}", "", projection, indent = indent * 2 + 2)?;
    }
    Ok(())
}
