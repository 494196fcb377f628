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

//! Logical plan nodes produced by window planning.

mod plan;

use std::collections::HashSet;

use quarry_common::{Column, Result};

pub use plan::{Collect, LogicalPlan, WindowAgg};

/// Deferred construction of an upstream logical subtree.
///
/// Invoked with the set of columns that later stages still need from the
/// subtree; returns the built plan, whose `outputs()` lists exactly the
/// columns available to the next stage.
pub type LogicalPlanBuilder = Box<dyn Fn(&HashSet<Column>) -> Result<LogicalPlan>>;
