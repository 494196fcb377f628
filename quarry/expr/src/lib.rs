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

//! The symbol layer of the Quarry planner: the [Expr] tree, window function
//! and window definition value types, visitors and rewriters over the tree,
//! and the logical plan node set produced by window planning.

pub mod aggregate_function;
pub mod expr;
pub mod expr_rewriter;
pub mod expr_visitor;
pub mod logical_plan;
pub mod utils;
pub mod window;
pub mod window_frame;
pub mod window_function;

pub use aggregate_function::AggregateFunction;
pub use expr::{col, lit, Expr, InputColumn};
pub use expr_rewriter::{ExprRewritable, ExprRewriter, RewriteRecursion, SourceOutputs};
pub use expr_visitor::{ExprVisitable, ExpressionVisitor, Recursion};
pub use logical_plan::{Collect, LogicalPlan, LogicalPlanBuilder, WindowAgg};
pub use window::{OrderBy, WindowDefinition, WindowFunction};
pub use window_frame::{WindowFrame, WindowFrameBound, WindowFrameUnits};
pub use window_function::{find_window_func, BuiltInWindowFunction, WindowFunctionKind};
