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

//! Quarry turns logical window-function plans into physical execution plans
//! for a distributed SQL engine.
//!
//! Planning happens in two stages with a narrow contract between them:
//!
//! * the window-function grouper ([planner::plan_window_aggs]) groups the
//!   query's window functions by structurally equal window definition and
//!   chains one logical [quarry_expr::WindowAgg] node per definition over
//!   the upstream plan;
//! * the physical planner ([planner::PhysicalPlanner]) lowers each node into
//!   a merge barrier, an optional sort projection over the merged
//!   partition/order-by key, and a window aggregation projection whose
//!   expressions are rewritten to row positions.
//!
//! Both stages are pure functions over immutable inputs; executing the
//! produced plan is the job of the execution runtime, not of this crate.

pub mod physical_plan;
pub mod planner;

pub use quarry_common::error::{QuarryError, Result};
