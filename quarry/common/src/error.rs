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

//! Quarry error types

use std::error;
use std::fmt::{Display, Formatter};
use std::result;

/// Result type for operations that could result in a [QuarryError]
pub type Result<T> = result::Result<T, QuarryError>;

/// Error type for generic operations that could result in QuarryError::External
pub type GenericError = Box<dyn error::Error + Send + Sync>;

/// Quarry error
#[derive(Debug)]
pub enum QuarryError {
    /// Error returned on a branch that we know it is possible
    /// but to which we still have no implementation for.
    /// Often, these errors are tracked in our issue tracker.
    NotImplemented(String),
    /// Error returned as a consequence of an error in Quarry.
    /// This error should not happen in normal usage of Quarry.
    // Quarry has internal invariants that we are unable to ask the compiler to check for us.
    // This error is raised when one of those invariants is not verified during planning.
    Internal(String),
    /// This error happens whenever a plan is not valid. Examples include
    /// unsupported window frames and window functions applied to the wrong
    /// number of arguments.
    Plan(String),
    /// Errors originating from outside Quarry's core codebase.
    External(GenericError),
}

impl From<GenericError> for QuarryError {
    fn from(err: GenericError) -> Self {
        QuarryError::External(err)
    }
}

impl Display for QuarryError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match *self {
            QuarryError::NotImplemented(ref desc) => {
                write!(f, "This feature is not implemented: {}", desc)
            }
            QuarryError::Internal(ref desc) => {
                write!(
                    f,
                    "Internal error: {}. This was likely caused by a bug in Quarry's \
                    code and we would welcome that you file an bug report in our issue tracker",
                    desc
                )
            }
            QuarryError::Plan(ref desc) => {
                write!(f, "Error during planning: {}", desc)
            }
            QuarryError::External(ref desc) => {
                write!(f, "External error: {}", desc)
            }
        }
    }
}

impl error::Error for QuarryError {}

#[macro_export]
macro_rules! plan_err {
    ($($arg:tt)*) => {
        Err($crate::error::QuarryError::Plan(format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! not_impl_err {
    ($($arg:tt)*) => {
        Err($crate::error::QuarryError::NotImplemented(format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! internal_err {
    ($($arg:tt)*) => {
        Err($crate::error::QuarryError::Internal(format!($($arg)*)))
    };
}

#[cfg(test)]
mod test {
    use crate::error::QuarryError;

    #[test]
    fn plan_error_display() {
        let res: super::Result<()> = crate::plan_err!("AVG expects {} arguments", 1);
        assert_eq!(
            res.unwrap_err().to_string(),
            "Error during planning: AVG expects 1 arguments"
        );
    }

    #[test]
    fn internal_error_display() {
        let err = QuarryError::Internal("sort key did not resolve".to_string());
        assert!(err
            .to_string()
            .starts_with("Internal error: sort key did not resolve."));
    }

    #[test]
    fn not_implemented_display() {
        let res: super::Result<()> = crate::not_impl_err!("custom frames");
        assert_eq!(
            res.unwrap_err().to_string(),
            "This feature is not implemented: custom frames"
        );
    }
}
