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

//! Planner module: lowers logical plans to physical execution plans.

pub mod window_agg;

use log::debug;
use quarry_common::{Result, ScalarValue};
use quarry_expr::{LogicalPlan, OrderBy};

use crate::physical_plan::{self, ExecutionPlan};

pub use window_agg::plan_window_aggs;

/// Cluster-level planning context.
#[derive(Debug, Clone)]
pub struct PlannerContext {
    /// id of the node coordinating the query; merged streams and final
    /// results are delivered here
    pub coordinator: String,
}

impl PlannerContext {
    /// Create a context coordinated by the given node.
    pub fn new(coordinator: impl Into<String>) -> Self {
        Self {
            coordinator: coordinator.into(),
        }
    }
}

/// Query-level context, read-only during lowering: the LIMIT/OFFSET and
/// final ORDER BY of the enclosing query (independent of any window
/// ordering) and its parameter bindings.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    /// the query's LIMIT, if any
    pub limit: Option<usize>,
    /// the query's OFFSET
    pub offset: usize,
    /// the query's final ORDER BY, if any
    pub order: Option<OrderBy>,
    /// preferred fetch size for paging sources
    pub page_size_hint: Option<usize>,
    /// positional parameter bindings
    pub params: Vec<ScalarValue>,
}

/// Lowers logical plan nodes into physical execution plans.
///
/// Lowering is pure: no shared state, no side effects beyond log output, so
/// independent queries may plan concurrently.
#[derive(Debug, Default)]
pub struct PhysicalPlanner {}

impl PhysicalPlanner {
    /// Create a physical planner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower `plan` into an execution plan rooted on the query coordinator's
    /// cluster.
    pub fn create_physical_plan(
        &self,
        plan: &LogicalPlan,
        ctx: &PlannerContext,
        query: &QueryContext,
    ) -> Result<ExecutionPlan> {
        debug!("Input logical plan:\n{}", plan);
        let physical = self.create_initial_plan(plan, ctx, query)?;
        debug!("Physical plan:\n{}", physical);
        Ok(physical)
    }

    pub(crate) fn create_initial_plan(
        &self,
        plan: &LogicalPlan,
        ctx: &PlannerContext,
        query: &QueryContext,
    ) -> Result<ExecutionPlan> {
        match plan {
            LogicalPlan::Collect(collect) => Ok(ExecutionPlan::Collect(physical_plan::Collect {
                outputs: collect.outputs.clone(),
                node_ids: collect.node_ids.clone(),
                projections: vec![],
            })),
            LogicalPlan::WindowAgg(window_agg) => {
                window_agg::plan_window_agg(self, window_agg, ctx, query)
            }
        }
    }
}
