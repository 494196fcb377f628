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

//! Window aggregation planning.
//!
//! The logical half groups a query's window functions by structurally equal
//! window definition and chains one [WindowAgg] node per definition over the
//! upstream plan, so that every function sharing a window shares one
//! sort/aggregate pass. The physical half lowers each node: it consolidates
//! the upstream rows onto the coordinator, sorts them by the merged
//! partition/order-by key, and emits the window aggregation projection in
//! positional form.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use itertools::izip;
use log::debug;

use quarry_common::{internal_err, not_impl_err, plan_err, Column, Result};
use quarry_expr::utils::exprlist_to_columns;
use quarry_expr::window_function;
use quarry_expr::{
    Expr, LogicalPlan, LogicalPlanBuilder, OrderBy, SourceOutputs, WindowAgg, WindowDefinition,
    WindowFrame, WindowFunction,
};

use crate::physical_plan::{
    limit_and_offset, ExecutionPlan, Merge, OrderedTopNProjection, Projection,
    WindowAggProjection,
};
use crate::planner::{PhysicalPlanner, PlannerContext, QueryContext};

/// Wrap `source` in one [WindowAgg] node per distinct window definition in
/// `window_functions`.
///
/// An empty function list returns `source` unchanged. Frames and function
/// arities are validated up front, before any plan is built; the returned
/// builder then computes the full column set the source must produce
/// (function arguments, partition columns, order-by keys, plus whatever the
/// caller already needs), builds the source once, and chains the nodes in
/// first-occurrence order of their definitions.
pub fn plan_window_aggs(
    source: LogicalPlanBuilder,
    window_functions: Vec<WindowFunction>,
) -> Result<LogicalPlanBuilder> {
    if window_functions.is_empty() {
        return Ok(source);
    }

    for function in &window_functions {
        let frame = &function.window_definition.frame;
        if *frame != WindowFrame::default() {
            return not_impl_err!("Custom frame definitions are not supported: {}", frame);
        }
        let arity = window_function::arity(&function.fun);
        if !arity.contains(&function.args.len()) {
            let expected = if arity.start() == arity.end() {
                arity.start().to_string()
            } else {
                format!("{} to {}", arity.start(), arity.end())
            };
            return plan_err!(
                "The function {} expects {} arguments but {} were provided: {}",
                function.fun,
                expected,
                function.args.len(),
                function
            );
        }
    }

    Ok(Box::new(move |used_before_next_fetch: &HashSet<Column>| {
        let mut all_used_columns = used_before_next_fetch.clone();
        for function in &window_functions {
            exprlist_to_columns(&function.args, &mut all_used_columns)?;
            exprlist_to_columns(
                &function.window_definition.partition_by,
                &mut all_used_columns,
            )?;
            if let Some(order_by) = &function.window_definition.order_by {
                exprlist_to_columns(&order_by.exprs, &mut all_used_columns)?;
            }
        }

        let mut grouped: IndexMap<WindowDefinition, Vec<WindowFunction>> = IndexMap::new();
        for function in &window_functions {
            grouped
                .entry(function.window_definition.clone())
                .or_default()
                .push(function.clone());
        }
        debug!(
            "Grouped {} window functions into {} window definitions",
            window_functions.len(),
            grouped.len()
        );

        let mut plan = source(&all_used_columns)?;
        for (window_definition, functions) in grouped {
            // Pass along the source outputs as standalone columns as they
            // might be required in cases like:
            //      select x, avg(x) OVER() from t;
            let standalone = plan.outputs().to_vec();
            plan = LogicalPlan::WindowAgg(WindowAgg::new(
                Arc::new(plan),
                window_definition,
                functions,
                standalone,
            ));
        }
        Ok(plan)
    }))
}

/// Merge partition columns and the explicit order-by into one duplicate-free
/// sort key.
///
/// Partition columns come first, ascending with engine-default null
/// ordering, so rows of a partition are contiguous. An order-by key equal to
/// an already present key overwrites that key's direction and null-ordering
/// in place instead of introducing a second, competing key on the same
/// column; any other order-by key is appended. The result is empty iff both
/// inputs are empty.
pub(crate) fn merge_sort_key(partition_by: &[Expr], order_by: Option<&OrderBy>) -> OrderBy {
    let mut exprs = Vec::new();
    let mut descending = Vec::new();
    let mut nulls_first = Vec::new();

    for partition in partition_by {
        exprs.push(partition.clone());
        descending.push(false);
        nulls_first.push(None);
    }

    if let Some(order_by) = order_by {
        for (key, key_descending, key_nulls_first) in izip!(
            &order_by.exprs,
            &order_by.descending,
            &order_by.nulls_first
        ) {
            // linear scan; window sort keys are tiny
            match exprs.iter().position(|existing| existing == key) {
                Some(index) => {
                    descending[index] = *key_descending;
                    nulls_first[index] = *key_nulls_first;
                }
                None => {
                    exprs.push(key.clone());
                    descending.push(*key_descending);
                    nulls_first.push(*key_nulls_first);
                }
            }
        }
    }

    OrderBy::new(exprs, descending, nulls_first)
}

/// Lower one [WindowAgg] node onto the physical plan built for its input.
///
/// The extended plan becomes the input of the next chained window stage, if
/// any.
pub(crate) fn plan_window_agg(
    planner: &PhysicalPlanner,
    window_agg: &WindowAgg,
    ctx: &PlannerContext,
    query: &QueryContext,
) -> Result<ExecutionPlan> {
    let source_plan = planner.create_initial_plan(window_agg.input(), ctx, query)?;

    // Window evaluation needs the globally partitioned, globally ordered row
    // stream in one place; it cannot run while the data is sharded.
    let mut plan = Merge::ensure_on_coordinator(source_plan, &ctx.coordinator);

    let source_outputs = SourceOutputs::new(window_agg.input().outputs());
    let window_definition =
        source_outputs.bind_window_definition(window_agg.window_definition())?;
    let standalone = source_outputs.bind_all(window_agg.standalone())?;

    let mut functions = IndexMap::new();
    for function in window_agg.window_functions() {
        let bound = source_outputs.bind_window_function(function)?;
        let args = source_outputs.bind_all(&function.args)?;
        functions.insert(bound, args);
    }

    let sort_key = merge_sort_key(
        &window_definition.partition_by,
        window_definition.order_by.as_ref(),
    );
    if !sort_key.is_empty() {
        let outputs = source_outputs.bind_all(window_agg.input().outputs())?;
        plan.add_projection(Projection::OrderedTopN(OrderedTopNProjection::new(
            limit_and_offset(query.limit, query.offset),
            0,
            outputs,
            sort_key.clone(),
        )));
    }

    let mut order_by_indexes = Vec::with_capacity(sort_key.exprs.len());
    for key in &sort_key.exprs {
        match key {
            Expr::InputColumn(input) => order_by_indexes.push(input.index()),
            other => {
                return internal_err!(
                    "Window ordering must be expressed as input columns at this stage, got {}",
                    other
                )
            }
        }
    }

    plan.add_projection(Projection::WindowAgg(WindowAggProjection::new(
        window_definition,
        functions,
        standalone,
        order_by_indexes,
    )));
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::{QuarryError, ScalarValue};
    use quarry_expr::window_frame::{WindowFrameBound, WindowFrameUnits};
    use quarry_expr::{col, find_window_func};

    fn source() -> LogicalPlanBuilder {
        Box::new(|_required| {
            Ok(LogicalPlan::Collect(quarry_expr::Collect {
                outputs: vec![col("x"), col("dept")],
                node_ids: vec!["n1".to_string()],
            }))
        })
    }

    fn avg_x(window_definition: WindowDefinition) -> WindowFunction {
        WindowFunction::new(
            find_window_func("avg").unwrap(),
            vec![col("x")],
            window_definition,
        )
    }

    #[test]
    fn custom_frame_is_rejected() {
        let mut function = avg_x(WindowDefinition::new(vec![col("dept")], None));
        function.window_definition.frame = WindowFrame {
            units: WindowFrameUnits::Rows,
            start_bound: WindowFrameBound::Preceding(ScalarValue::from(1_u64)),
            end_bound: WindowFrameBound::CurrentRow,
        };

        let err = plan_window_aggs(source(), vec![function]).err().unwrap();
        assert!(matches!(err, QuarryError::NotImplemented(_)));
        assert_eq!(
            err.to_string(),
            "This feature is not implemented: Custom frame definitions are not supported: \
             ROWS BETWEEN 1 PRECEDING AND CURRENT ROW"
        );
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let function = WindowFunction::new(
            find_window_func("row_number").unwrap(),
            vec![col("x")],
            WindowDefinition::new(vec![col("dept")], None),
        );

        let err = plan_window_aggs(source(), vec![function]).err().unwrap();
        assert!(matches!(err, QuarryError::Plan(_)));
        assert!(err.to_string().contains("ROW_NUMBER"));
        assert!(err.to_string().contains("0 arguments but 1 were provided"));
    }

    #[test]
    fn merge_partitions_only() {
        let merged = merge_sort_key(&[col("dept")], None);
        assert_eq!(merged.exprs, vec![col("dept")]);
        assert_eq!(merged.descending, vec![false]);
        assert_eq!(merged.nulls_first, vec![None]);
    }

    #[test]
    fn merge_order_by_only() {
        let order_by = OrderBy::new(vec![col("salary")], vec![true], vec![Some(true)]);
        let merged = merge_sort_key(&[], Some(&order_by));
        assert_eq!(merged.exprs, vec![col("salary")]);
        assert_eq!(merged.descending, vec![true]);
        assert_eq!(merged.nulls_first, vec![Some(true)]);
    }

    #[test]
    fn merge_appends_distinct_order_key() {
        // PARTITION BY dept ORDER BY salary DESC NULLS LAST
        let order_by = OrderBy::new(vec![col("salary")], vec![true], vec![Some(false)]);
        let merged = merge_sort_key(&[col("dept")], Some(&order_by));
        assert_eq!(merged.exprs, vec![col("dept"), col("salary")]);
        assert_eq!(merged.descending, vec![false, true]);
        assert_eq!(merged.nulls_first, vec![None, Some(false)]);
    }

    #[test]
    fn merge_overwrites_flags_of_matching_partition_key() {
        // PARTITION BY dept ORDER BY dept ASC NULLS FIRST
        let order_by = OrderBy::new(vec![col("dept")], vec![false], vec![Some(true)]);
        let merged = merge_sort_key(&[col("dept")], Some(&order_by));
        assert_eq!(merged.exprs, vec![col("dept")]);
        assert_eq!(merged.descending, vec![false]);
        assert_eq!(merged.nulls_first, vec![Some(true)]);
    }

    #[test]
    fn merge_overwrites_in_place_without_reordering() {
        // PARTITION BY a, b ORDER BY b DESC, c
        let order_by = OrderBy::new(
            vec![col("b"), col("c")],
            vec![true, false],
            vec![None, None],
        );
        let merged = merge_sort_key(&[col("a"), col("b")], Some(&order_by));
        assert_eq!(merged.exprs, vec![col("a"), col("b"), col("c")]);
        assert_eq!(merged.descending, vec![false, true, false]);
        assert_eq!(merged.nulls_first, vec![None, None, None]);
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        assert!(merge_sort_key(&[], None).is_empty());
        let empty_order = OrderBy::ascending(vec![]);
        assert!(merge_sort_key(&[], Some(&empty_order)).is_empty());
    }
}
