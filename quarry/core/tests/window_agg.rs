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

//! End-to-end window planning tests: grouping window functions over a
//! simulated sharded source, then lowering the chained logical nodes to a
//! physical plan.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use quarry::physical_plan::{ExecutionPlan, Projection};
use quarry::planner::{plan_window_aggs, PhysicalPlanner, PlannerContext, QueryContext};
use quarry_common::Column;
use quarry_expr::{
    col, find_window_func, Collect, Expr, InputColumn, LogicalPlan, LogicalPlanBuilder, OrderBy,
    WindowDefinition, WindowFrame, WindowFunction,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn input(index: usize) -> Expr {
    Expr::InputColumn(InputColumn::new(index))
}

/// A sharded source producing the given columns on two nodes.
fn sharded_source(outputs: Vec<Expr>) -> LogicalPlanBuilder {
    Box::new(move |_required| {
        Ok(LogicalPlan::Collect(Collect {
            outputs: outputs.clone(),
            node_ids: vec!["n1".to_string(), "n2".to_string()],
        }))
    })
}

/// Like [sharded_source], but records the required-column set it was built
/// with.
fn recording_source(
    outputs: Vec<Expr>,
    required: Rc<RefCell<HashSet<Column>>>,
) -> LogicalPlanBuilder {
    Box::new(move |columns| {
        *required.borrow_mut() = columns.clone();
        Ok(LogicalPlan::Collect(Collect {
            outputs: outputs.clone(),
            node_ids: vec!["n1".to_string(), "n2".to_string()],
        }))
    })
}

fn window_function(name: &str, args: Vec<Expr>, definition: WindowDefinition) -> WindowFunction {
    WindowFunction::new(find_window_func(name).unwrap(), args, definition)
}

fn over_dept() -> WindowDefinition {
    WindowDefinition::new(vec![col("dept")], None)
}

fn source_columns() -> Vec<Expr> {
    vec![col("x"), col("y"), col("dept"), col("salary")]
}

#[test]
fn empty_function_list_returns_source_unchanged() {
    let builder = plan_window_aggs(sharded_source(source_columns()), vec![]).unwrap();
    let plan = builder(&HashSet::new()).unwrap();
    assert_eq!(
        plan,
        LogicalPlan::Collect(Collect {
            outputs: source_columns(),
            node_ids: vec!["n1".to_string(), "n2".to_string()],
        })
    );
}

#[test]
fn functions_with_equal_definitions_share_one_node() {
    let avg = window_function("avg", vec![col("x")], over_dept());
    let sum = window_function("sum", vec![col("y")], over_dept());

    let builder =
        plan_window_aggs(sharded_source(source_columns()), vec![avg.clone(), sum.clone()])
            .unwrap();
    let plan = builder(&HashSet::new()).unwrap();

    let window_agg = match &plan {
        LogicalPlan::WindowAgg(window_agg) => window_agg,
        other => panic!("expected a window agg, got {}", other),
    };
    // one stage, functions in query order
    assert_eq!(window_agg.window_functions(), &[avg.clone(), sum.clone()]);
    assert_eq!(window_agg.standalone(), source_columns().as_slice());
    assert_eq!(
        window_agg.outputs(),
        &[
            Expr::WindowFunction(avg),
            Expr::WindowFunction(sum),
            col("x"),
            col("y"),
            col("dept"),
            col("salary"),
        ]
    );
    assert!(matches!(window_agg.input().as_ref(), LogicalPlan::Collect(_)));
}

#[test]
fn distinct_definitions_chain_in_first_seen_order() {
    let over_all = WindowDefinition::new(vec![], None);
    let avg = window_function("avg", vec![col("x")], over_dept());
    let row_number = window_function("row_number", vec![], over_all.clone());
    let sum = window_function("sum", vec![col("y")], over_dept());

    let builder = plan_window_aggs(
        sharded_source(source_columns()),
        vec![avg.clone(), row_number.clone(), sum.clone()],
    )
    .unwrap();
    let plan = builder(&HashSet::new()).unwrap();

    // the first seen definition sits deepest; later definitions wrap it
    let outer = match &plan {
        LogicalPlan::WindowAgg(window_agg) => window_agg,
        other => panic!("expected a window agg, got {}", other),
    };
    assert_eq!(outer.window_definition(), &over_all);
    assert_eq!(outer.window_functions(), &[row_number]);

    let inner = match outer.input().as_ref() {
        LogicalPlan::WindowAgg(window_agg) => window_agg,
        other => panic!("expected a window agg, got {}", other),
    };
    assert_eq!(inner.window_definition(), &over_dept());
    assert_eq!(inner.window_functions(), &[avg, sum]);

    // every intermediate stage passes the whole previous output list along
    assert_eq!(outer.standalone(), inner.outputs());
}

#[test]
fn source_is_built_with_every_referenced_column() {
    let required = Rc::new(RefCell::new(HashSet::new()));
    let source = recording_source(source_columns(), required.clone());

    let function = window_function(
        "avg",
        vec![col("x")],
        WindowDefinition::new(
            vec![col("dept")],
            Some(OrderBy::new(vec![col("salary")], vec![true], vec![Some(false)])),
        ),
    );

    let builder = plan_window_aggs(source, vec![function]).unwrap();
    let mut used_downstream = HashSet::new();
    used_downstream.insert(Column::from_name("y"));
    builder(&used_downstream).unwrap();

    let mut names: Vec<_> = required
        .borrow()
        .iter()
        .map(|column| column.name.clone())
        .collect();
    names.sort();
    assert_eq!(names, vec!["dept", "salary", "x", "y"]);
}

#[test]
fn lowering_merges_sorts_and_aggregates() {
    init();

    let function = window_function(
        "avg",
        vec![col("x")],
        WindowDefinition::new(
            vec![col("dept")],
            Some(OrderBy::new(vec![col("salary")], vec![true], vec![Some(false)])),
        ),
    );
    let builder = plan_window_aggs(sharded_source(source_columns()), vec![function]).unwrap();
    let logical = builder(&HashSet::new()).unwrap();

    let planner = PhysicalPlanner::new();
    let ctx = PlannerContext::new("coord");
    let physical = planner
        .create_physical_plan(&logical, &ctx, &QueryContext::default())
        .unwrap();

    // the sharded source is consolidated on the coordinator first
    assert_eq!(physical.output_nodes(), ["coord".to_string()]);
    let merge = match &physical {
        ExecutionPlan::Merge(merge) => merge,
        other => panic!("expected a merge, got {}", other),
    };
    assert!(matches!(merge.input.as_ref(), ExecutionPlan::Collect(_)));
    assert!(merge.input.projections().is_empty());

    let projections = physical.projections();
    assert_eq!(projections.len(), 2);

    // sort stage: dept ascending first, then salary with its own flags
    let top_n = match &projections[0] {
        Projection::OrderedTopN(projection) => projection,
        other => panic!("expected a sort projection, got {}", other),
    };
    assert_eq!(top_n.limit, None);
    assert_eq!(top_n.offset, 0);
    assert_eq!(top_n.outputs, vec![input(0), input(1), input(2), input(3)]);
    assert_eq!(
        top_n.order_by,
        OrderBy::new(
            vec![input(2), input(3)],
            vec![false, true],
            vec![None, Some(false)],
        )
    );

    // aggregation stage: everything positional, sort key indexes resolved
    let window = match &projections[1] {
        Projection::WindowAgg(projection) => projection,
        other => panic!("expected a window projection, got {}", other),
    };
    let expected_definition = WindowDefinition {
        partition_by: vec![input(2)],
        order_by: Some(OrderBy::new(vec![input(3)], vec![true], vec![Some(false)])),
        frame: WindowFrame::default(),
    };
    assert_eq!(window.window_definition, expected_definition);
    assert_eq!(window.order_by_indexes, vec![2, 3]);
    assert_eq!(
        window.standalone,
        vec![input(0), input(1), input(2), input(3)]
    );

    let (bound_function, args) = window.functions.get_index(0).unwrap();
    assert_eq!(
        bound_function,
        &WindowFunction::new(
            find_window_func("avg").unwrap(),
            vec![input(0)],
            expected_definition,
        )
    );
    assert_eq!(args, &vec![input(0)]);
}

#[test]
fn source_already_on_coordinator_is_not_merged_again() {
    let source: LogicalPlanBuilder = Box::new(|_required| {
        Ok(LogicalPlan::Collect(Collect {
            outputs: vec![col("x"), col("dept")],
            node_ids: vec!["coord".to_string()],
        }))
    });
    let function = window_function("avg", vec![col("x")], over_dept());
    let builder = plan_window_aggs(source, vec![function]).unwrap();
    let logical = builder(&HashSet::new()).unwrap();

    let physical = PhysicalPlanner::new()
        .create_physical_plan(&logical, &PlannerContext::new("coord"), &QueryContext::default())
        .unwrap();

    assert!(matches!(physical, ExecutionPlan::Collect(_)));
    assert_eq!(physical.projections().len(), 2);
}

#[test]
fn empty_window_definition_produces_no_sort_stage() {
    let function = window_function("avg", vec![col("x")], WindowDefinition::new(vec![], None));
    let builder = plan_window_aggs(sharded_source(source_columns()), vec![function]).unwrap();
    let logical = builder(&HashSet::new()).unwrap();

    let physical = PhysicalPlanner::new()
        .create_physical_plan(&logical, &PlannerContext::new("coord"), &QueryContext::default())
        .unwrap();

    let projections = physical.projections();
    assert_eq!(projections.len(), 1);
    let window = match &projections[0] {
        Projection::WindowAgg(projection) => projection,
        other => panic!("expected a window projection, got {}", other),
    };
    // the whole row set is one implicit partition in arrival order
    assert!(window.order_by_indexes.is_empty());
    assert!(window.window_definition.partition_by.is_empty());
    assert!(window.window_definition.order_by.is_none());
}

#[test]
fn partition_column_repeated_in_order_by_is_sorted_once() {
    let function = window_function(
        "sum",
        vec![col("x")],
        WindowDefinition::new(
            vec![col("dept")],
            Some(OrderBy::new(vec![col("dept")], vec![false], vec![Some(true)])),
        ),
    );
    let builder = plan_window_aggs(sharded_source(source_columns()), vec![function]).unwrap();
    let logical = builder(&HashSet::new()).unwrap();

    let physical = PhysicalPlanner::new()
        .create_physical_plan(&logical, &PlannerContext::new("coord"), &QueryContext::default())
        .unwrap();

    let top_n = match &physical.projections()[0] {
        Projection::OrderedTopN(projection) => projection,
        other => panic!("expected a sort projection, got {}", other),
    };
    // single key, with the explicit order-by flags winning
    assert_eq!(
        top_n.order_by,
        OrderBy::new(vec![input(2)], vec![false], vec![Some(true)])
    );

    let window = match &physical.projections()[1] {
        Projection::WindowAgg(projection) => projection,
        other => panic!("expected a window projection, got {}", other),
    };
    assert_eq!(window.order_by_indexes, vec![2]);
}

#[test]
fn query_limit_bounds_the_sort_volume() {
    let function = window_function("avg", vec![col("x")], over_dept());
    let builder = plan_window_aggs(sharded_source(source_columns()), vec![function]).unwrap();
    let logical = builder(&HashSet::new()).unwrap();

    let query = QueryContext {
        limit: Some(10),
        offset: 5,
        ..QueryContext::default()
    };
    let physical = PhysicalPlanner::new()
        .create_physical_plan(&logical, &PlannerContext::new("coord"), &query)
        .unwrap();

    let top_n = match &physical.projections()[0] {
        Projection::OrderedTopN(projection) => projection,
        other => panic!("expected a sort projection, got {}", other),
    };
    // the sort keeps every row up to the last offset row; the offset itself
    // is applied downstream
    assert_eq!(top_n.limit, Some(15));
    assert_eq!(top_n.offset, 0);
}

#[test]
fn chained_definitions_lower_to_consecutive_stages() {
    init();

    let columns = vec![col("x"), col("y"), col("dept"), col("team")];
    let over_team = WindowDefinition::new(vec![col("team")], None);
    let avg = window_function("avg", vec![col("x")], over_dept());
    let sum = window_function("sum", vec![col("y")], over_team);

    let builder = plan_window_aggs(sharded_source(columns), vec![avg, sum]).unwrap();
    let logical = builder(&HashSet::new()).unwrap();

    let physical = PhysicalPlanner::new()
        .create_physical_plan(&logical, &PlannerContext::new("coord"), &QueryContext::default())
        .unwrap();

    // one merge serves both stages; their projections run back to back
    let merge = match &physical {
        ExecutionPlan::Merge(merge) => merge,
        other => panic!("expected a merge, got {}", other),
    };
    assert!(matches!(merge.input.as_ref(), ExecutionPlan::Collect(_)));

    let projections = physical.projections();
    assert_eq!(projections.len(), 4);

    // first stage works against the collect row: [x, y, dept, team]
    let first_sort = match &projections[0] {
        Projection::OrderedTopN(projection) => projection,
        other => panic!("expected a sort projection, got {}", other),
    };
    assert_eq!(first_sort.order_by.exprs, vec![input(2)]);
    let first_window = match &projections[1] {
        Projection::WindowAgg(projection) => projection,
        other => panic!("expected a window projection, got {}", other),
    };
    assert_eq!(first_window.order_by_indexes, vec![2]);
    assert_eq!(first_window.standalone.len(), 4);

    // second stage works against the first stage's output row:
    // [avg(x), x, y, dept, team]
    let second_sort = match &projections[2] {
        Projection::OrderedTopN(projection) => projection,
        other => panic!("expected a sort projection, got {}", other),
    };
    assert_eq!(second_sort.order_by.exprs, vec![input(4)]);
    let second_window = match &projections[3] {
        Projection::WindowAgg(projection) => projection,
        other => panic!("expected a window projection, got {}", other),
    };
    assert_eq!(second_window.order_by_indexes, vec![4]);
    assert_eq!(second_window.standalone.len(), 5);
    let (_, second_args) = second_window.functions.get_index(0).unwrap();
    assert_eq!(second_args, &vec![input(2)]);
}

#[test]
fn update_source_keeps_the_stage_intact() {
    let function = window_function("avg", vec![col("x")], over_dept());
    let builder = plan_window_aggs(sharded_source(source_columns()), vec![function]).unwrap();
    let logical = builder(&HashSet::new()).unwrap();

    let window_agg = match &logical {
        LogicalPlan::WindowAgg(window_agg) => window_agg,
        other => panic!("expected a window agg, got {}", other),
    };

    // swap the input for one living on a different node, as a pushed-down
    // rewrite elsewhere in the planner would
    let relocated = Arc::new(LogicalPlan::Collect(Collect {
        outputs: source_columns(),
        node_ids: vec!["n3".to_string()],
    }));
    let updated = window_agg.with_new_input(relocated);

    let physical = PhysicalPlanner::new()
        .create_physical_plan(
            &LogicalPlan::WindowAgg(updated),
            &PlannerContext::new("coord"),
            &QueryContext::default(),
        )
        .unwrap();

    // still merged and lowered exactly like the original stage
    assert!(matches!(physical, ExecutionPlan::Merge(_)));
    assert_eq!(physical.projections().len(), 2);
}

#[test]
fn physical_plan_display_shows_the_pipeline() {
    let function = window_function("avg", vec![col("x")], over_dept());
    let builder = plan_window_aggs(sharded_source(source_columns()), vec![function]).unwrap();
    let logical = builder(&HashSet::new()).unwrap();

    let physical = PhysicalPlanner::new()
        .create_physical_plan(&logical, &PlannerContext::new("coord"), &QueryContext::default())
        .unwrap();

    let display = physical.to_string();
    assert!(display.starts_with("Merge[coord]"));
    assert!(display.contains("OrderedTopN[INPUT(2)]"));
    assert!(display.contains("WindowAgg[AVG(INPUT(0)) OVER (PARTITION BY INPUT(2))]"));
    assert!(display.contains("Collect[#x, #y, #dept, #salary]"));
}
